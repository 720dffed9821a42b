//! Canvas engine: the single owner of all canvas state.
//!
//! The engine keeps two views of the active canvas:
//!
//! - **Stored records**: `canvases`, the durable list written to storage.
//! - **Live mirror**: an [`ActiveSession`] with the active canvas's nodes,
//!   connections, and view, mutated directly by node/connection/view
//!   operations.
//!
//! Content-mutating operations commit the live mirror back into the active
//! record and persist. Selection, `bring_to_front`, and the view operations
//! (`set_zoom`, `set_pan`, `reset_view`, zoom stepping) only touch the
//! mirror; they reach storage on the next commit (a content edit,
//! `save_current_canvas`, a switch, or `flush`).
//!
//! Unknown ids are silent no-ops everywhere.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::persistence::{MemoryStorage, Storage, load_state, save_state};
use crate::session::ActiveSession;
use crate::snapshot::{EXPORT_VERSION, ExportedCanvas, ImportedCanvas, UNTITLED_EXPORT_NAME};
use chrono::{DateTime, Utc};
use marble_core::transform::ZOOM_STEP;
use marble_core::{
    Canvas, CanvasId, Connection, ConnectionId, DEFAULT_CANVAS_NAME, Node, NodeId, NodePatch,
    NodeType, Point, TaskList, ViewTransform, Vec2, clamp_zoom, finite_or,
};
use std::collections::HashMap;

/// A live connection whose endpoints both exist.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedConnection<'a> {
    pub connection: &'a Connection,
    pub from: &'a Node,
    pub to: &'a Node,
}

/// Dashboard row for one canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasSummary {
    pub id: CanvasId,
    pub name: String,
    pub node_count: usize,
    pub connection_count: usize,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

pub struct CanvasEngine<S: Storage = MemoryStorage> {
    canvases: Vec<Canvas>,
    session: ActiveSession,
    storage: S,
    config: EngineConfig,
    /// Set when stored state changed but has not been written yet.
    dirty: bool,
}

impl<S: Storage> CanvasEngine<S> {
    /// Restore from `storage` with the default configuration.
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, EngineConfig::default())
    }

    /// Restore from `storage`. Unreadable or corrupt data yields an empty
    /// engine; a stale active id leaves no canvas active.
    pub fn with_config(mut storage: S, config: EngineConfig) -> Self {
        let state = load_state(&mut storage);
        let session = match state.current_canvas_id {
            Some(id) => match state.canvases.iter().find(|c| c.id == id) {
                Some(canvas) => ActiveSession::load(canvas),
                None => {
                    log::warn!("stored active canvas {id} not found, no canvas active");
                    ActiveSession::empty()
                }
            },
            None => ActiveSession::empty(),
        };
        log::debug!(
            "engine restored: canvases={} active={:?}",
            state.canvases.len(),
            session.canvas_id()
        );
        Self {
            canvases: state.canvases,
            session,
            storage,
            config,
            dirty: false,
        }
    }

    // ─── Canvas management ───────────────────────────────────────────────

    /// Append an empty canvas and make it active. The previous active
    /// canvas is committed first.
    pub fn create_canvas(&mut self, name: Option<&str>) -> CanvasId {
        self.commit();
        let canvas = Canvas::new(name.unwrap_or(DEFAULT_CANVAS_NAME));
        let id = canvas.id;
        log::info!("canvas created: {id} `{}`", canvas.name);
        self.session = ActiveSession::load(&canvas);
        self.canvases.push(canvas);
        self.persist();
        id
    }

    /// Remove a canvas. Deleting the active canvas activates the first
    /// remaining one, or none.
    pub fn delete_canvas(&mut self, id: CanvasId) {
        let Some(pos) = self.position_of(id) else {
            return;
        };
        self.canvases.remove(pos);
        log::info!("canvas deleted: {id}");

        if self.session.canvas_id == Some(id) {
            self.session = match self.canvases.first() {
                Some(next) => ActiveSession::load(next),
                None => ActiveSession::empty(),
            };
        }
        self.persist();
    }

    pub fn rename_canvas(&mut self, id: CanvasId, name: &str) {
        let Some(canvas) = self.canvas_mut(id) else {
            return;
        };
        canvas.name = name.to_string();
        canvas.updated_at = Utc::now();
        self.persist();
    }

    /// Copy a canvas under a new id with fresh node ids and no connections.
    /// The copy is not activated. Returns `None` if `id` is unknown.
    pub fn duplicate_canvas(&mut self, id: CanvasId) -> Option<CanvasId> {
        if self.session.canvas_id == Some(id) {
            self.commit();
        }
        let copy = self.canvas(id)?.duplicate();
        let copy_id = copy.id;
        log::info!("canvas duplicated: {id} -> {copy_id}");
        self.canvases.push(copy);
        self.persist();
        Some(copy_id)
    }

    /// Commit the active canvas, then load `id` into the live mirror.
    /// An unknown `id` still commits and leaves the active canvas as is.
    pub fn switch_canvas(&mut self, id: CanvasId) {
        self.commit();
        if let Some(canvas) = self.canvases.iter().find(|c| c.id == id) {
            self.session = ActiveSession::load(canvas);
            log::debug!("switched to canvas {id}");
        }
        self.dirty = true;
        self.write_storage();
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    /// Add a node with per-type defaults on top of the stack and select it.
    pub fn add_node(&mut self, kind: NodeType, x: f64, y: f64, content: Option<&str>) -> NodeId {
        let z_index = self.session.next_z_index();
        let node = Node::new(kind, x, y, content.map(str::to_string), z_index);
        let id = node.id;
        self.session.nodes.push(node);
        self.session.selected = Some(id);
        self.save_current_canvas();
        id
    }

    /// Add a node centered in a viewport of the given screen size.
    pub fn add_node_at_viewport_center(
        &mut self,
        kind: NodeType,
        viewport_width: f64,
        viewport_height: f64,
    ) -> NodeId {
        let origin = self
            .session
            .view
            .quick_add_origin(viewport_width, viewport_height);
        self.add_node(kind, origin.x, origin.y, None)
    }

    /// Merge `patch` into the node. Persists even when `id` is unknown.
    pub fn update_node(&mut self, id: NodeId, patch: &NodePatch) {
        if let Some(node) = self.session.node_mut(id) {
            node.apply(patch);
        }
        self.save_current_canvas();
    }

    /// Remove a node and every connection touching it.
    pub fn delete_node(&mut self, id: NodeId) {
        self.session.nodes.retain(|n| n.id != id);
        self.session.connections.retain(|c| !c.touches(id));
        if self.session.selected == Some(id) {
            self.session.selected = None;
        }
        self.save_current_canvas();
    }

    /// Selection is transient and never persisted.
    pub fn select_node(&mut self, id: Option<NodeId>) {
        self.session.selected = id;
    }

    /// Raise a node above every other on the canvas. Not persisted.
    pub fn bring_to_front(&mut self, id: NodeId) {
        if self.session.node(id).is_none() {
            return;
        }
        let z_index = self.session.next_z_index();
        if let Some(node) = self.session.node_mut(id) {
            node.z_index = z_index;
        }
    }

    /// Flip one item of a task node's checklist.
    pub fn toggle_task(&mut self, id: NodeId, index: usize) {
        let Some(mut tasks) = self.task_list(id) else {
            return;
        };
        if tasks.toggle(index) {
            self.update_node(id, &NodePatch::content(tasks.to_content()));
        }
    }

    /// Append an open item to a task node's checklist.
    pub fn add_task(&mut self, id: NodeId, text: &str) {
        let Some(mut tasks) = self.task_list(id) else {
            return;
        };
        if tasks.push(text) {
            self.update_node(id, &NodePatch::content(tasks.to_content()));
        }
    }

    fn task_list(&self, id: NodeId) -> Option<TaskList> {
        self.session
            .node(id)
            .filter(|n| n.kind == NodeType::Task)
            .map(|n| TaskList::parse(&n.content))
    }

    // ─── Connections ─────────────────────────────────────────────────────

    /// Link two nodes. Endpoints are not validated.
    pub fn add_connection(&mut self, from_id: NodeId, to_id: NodeId) -> ConnectionId {
        let connection = Connection::new(from_id, to_id);
        let id = connection.id;
        self.session.connections.push(connection);
        self.save_current_canvas();
        id
    }

    pub fn delete_connection(&mut self, id: ConnectionId) {
        self.session.connections.retain(|c| c.id != id);
        self.save_current_canvas();
    }

    // ─── View ────────────────────────────────────────────────────────────

    pub fn set_zoom(&mut self, zoom: f64) {
        self.session.view.zoom = clamp_zoom(zoom);
    }

    /// Non-finite components leave that axis where it was.
    pub fn set_pan(&mut self, x: f64, y: f64) {
        let pan = self.session.view.pan;
        self.session.view.pan = Vec2::new(finite_or(x, pan.x), finite_or(y, pan.y));
    }

    pub fn reset_view(&mut self) {
        self.session.view = ViewTransform::IDENTITY;
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.session.view.zoom + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.session.view.zoom - ZOOM_STEP);
    }

    /// Zoom toward a screen-space pivot, keeping the world point under it fixed.
    /// A pivot that yields a non-finite pan leaves the view unchanged.
    pub fn zoom_at(&mut self, pivot_x: f64, pivot_y: f64, zoom: f64) {
        let view = self
            .session
            .view
            .zoomed_at(Point::new(pivot_x, pivot_y), zoom);
        if view.pan.is_finite() {
            self.session.view = view;
        }
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// Commit the live mirror into the active record and persist.
    /// No-op without an active canvas.
    pub fn save_current_canvas(&mut self) {
        if self.commit() {
            self.persist();
        }
    }

    /// Commit and write storage now, regardless of `autosave`.
    pub fn flush(&mut self) -> Result<(), EngineError> {
        if self.commit() {
            self.dirty = true;
        }
        if !self.dirty {
            return Ok(());
        }
        save_state(&mut self.storage, &self.canvases, self.session.canvas_id)?;
        self.dirty = false;
        Ok(())
    }

    fn commit(&mut self) -> bool {
        let Some(id) = self.session.canvas_id else {
            return false;
        };
        let Some(pos) = self.position_of(id) else {
            return false;
        };
        self.session.commit_into(&mut self.canvases[pos]);
        true
    }

    fn persist(&mut self) {
        self.dirty = true;
        if self.config.autosave {
            self.write_storage();
        }
    }

    fn write_storage(&mut self) {
        if !self.dirty {
            return;
        }
        match save_state(&mut self.storage, &self.canvases, self.session.canvas_id) {
            Ok(()) => self.dirty = false,
            Err(err) => log::warn!("failed to write canvas storage: {err}"),
        }
    }

    // ─── Export / import ─────────────────────────────────────────────────

    /// Snapshot of the live mirror under the active canvas's name.
    pub fn export_snapshot(&self) -> ExportedCanvas {
        let name = self
            .active_canvas()
            .map(|c| c.name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| UNTITLED_EXPORT_NAME.to_string());
        ExportedCanvas {
            name,
            nodes: self.session.nodes.clone(),
            connections: self.session.connections.clone(),
            zoom: self.session.view.zoom,
            pan_x: self.session.view.pan.x,
            pan_y: self.session.view.pan.y,
            exported_at: Utc::now(),
            version: EXPORT_VERSION,
        }
    }

    /// Serialize the live mirror to the export file format.
    pub fn export_canvas(&self) -> Result<String, EngineError> {
        let snapshot = self.export_snapshot();
        let json = if self.config.pretty_export {
            serde_json::to_string_pretty(&snapshot)
        } else {
            serde_json::to_string(&snapshot)
        };
        json.map_err(EngineError::Serialize)
    }

    /// Parse an export and activate it as a new canvas.
    ///
    /// On a parse failure nothing changes and the error is returned.
    pub fn import_canvas(&mut self, data: &str) -> Result<CanvasId, EngineError> {
        let imported = match ImportedCanvas::parse(data) {
            Ok(imported) => imported,
            Err(err) => {
                log::error!("failed to import canvas: {err}");
                return Err(EngineError::Parse(err));
            }
        };
        let dangling = imported.dangling_connections();
        if dangling > 0 {
            log::debug!("imported canvas carries {dangling} dangling connection(s)");
        }

        self.commit();
        let canvas = imported.into_canvas();
        let id = canvas.id;
        log::info!(
            "canvas imported: {id} `{}` nodes={} connections={}",
            canvas.name,
            canvas.nodes.len(),
            canvas.connections.len()
        );
        self.session = ActiveSession::load(&canvas);
        self.canvases.push(canvas);
        self.persist();
        Ok(id)
    }

    /// Empty the active canvas's content. The canvas itself stays.
    pub fn clear_canvas(&mut self) {
        self.session.clear_content();
        self.save_current_canvas();
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn canvases(&self) -> &[Canvas] {
        &self.canvases
    }

    pub fn canvas(&self, id: CanvasId) -> Option<&Canvas> {
        self.canvases.iter().find(|c| c.id == id)
    }

    pub fn active_canvas_id(&self) -> Option<CanvasId> {
        self.session.canvas_id
    }

    /// Stored record of the active canvas (may lag the live mirror).
    pub fn active_canvas(&self) -> Option<&Canvas> {
        self.session.canvas_id.and_then(|id| self.canvas(id))
    }

    pub fn session(&self) -> &ActiveSession {
        &self.session
    }

    pub fn nodes(&self) -> &[Node] {
        self.session.nodes()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.session.node(id)
    }

    pub fn connections(&self) -> &[Connection] {
        self.session.connections()
    }

    pub fn selected_node_id(&self) -> Option<NodeId> {
        self.session.selected_node_id()
    }

    pub fn zoom(&self) -> f64 {
        self.session.zoom()
    }

    pub fn pan(&self) -> Vec2 {
        self.session.pan()
    }

    pub fn view(&self) -> ViewTransform {
        self.session.view()
    }

    pub fn max_z_index(&self) -> i64 {
        self.session.max_z_index()
    }

    /// Live connections with both endpoints present; dangling ones are skipped.
    pub fn resolved_connections(&self) -> Vec<ResolvedConnection<'_>> {
        let by_id: HashMap<NodeId, &Node> =
            self.session.nodes.iter().map(|n| (n.id, n)).collect();
        self.session
            .connections
            .iter()
            .filter_map(|connection| {
                Some(ResolvedConnection {
                    connection,
                    from: by_id.get(&connection.from_id).copied()?,
                    to: by_id.get(&connection.to_id).copied()?,
                })
            })
            .collect()
    }

    pub fn summaries(&self) -> Vec<CanvasSummary> {
        self.canvases
            .iter()
            .map(|c| CanvasSummary {
                id: c.id,
                name: c.name.clone(),
                node_count: c.nodes.len(),
                connection_count: c.connections.len(),
                updated_at: c.updated_at,
                is_active: self.session.canvas_id == Some(c.id),
            })
            .collect()
    }

    /// Canvases whose name contains `query`, case-insensitively.
    pub fn search(&self, query: &str) -> Vec<&Canvas> {
        let query = query.to_lowercase();
        self.canvases
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&query))
            .collect()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// True when stored state has changes not yet written.
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    fn position_of(&self, id: CanvasId) -> Option<usize> {
        self.canvases.iter().position(|c| c.id == id)
    }

    fn canvas_mut(&mut self, id: CanvasId) -> Option<&mut Canvas> {
        self.canvases.iter_mut().find(|c| c.id == id)
    }
}

impl CanvasEngine<MemoryStorage> {
    /// An engine over a fresh, empty in-memory slot.
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }
}

impl Default for CanvasEngine<MemoryStorage> {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl<S: Storage> Drop for CanvasEngine<S> {
    fn drop(&mut self) {
        if self.dirty {
            self.write_storage();
        }
    }
}
