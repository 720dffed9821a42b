//! The live mirror of the active canvas.
//!
//! `ActiveSession` holds the working copy of the active canvas's nodes,
//! connections, and view, plus the transient selection and the running
//! z-index counter. It diverges from the stored `Canvas` record until
//! `commit_into` writes it back.

use chrono::Utc;
use marble_core::model::max_z_index;
use marble_core::{
    Canvas, CanvasId, Connection, Node, NodeId, ViewTransform, Vec2, clamp_zoom, finite_or,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveSession {
    pub(crate) canvas_id: Option<CanvasId>,
    pub(crate) nodes: Vec<Node>,
    pub(crate) connections: Vec<Connection>,
    pub(crate) selected: Option<NodeId>,
    pub(crate) view: ViewTransform,
    pub(crate) max_z_index: i64,
}

impl ActiveSession {
    /// No active canvas, identity view.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Mirror a stored canvas. Selection starts empty; a stored zoom outside
    /// the supported range is clamped.
    pub fn load(canvas: &Canvas) -> Self {
        Self {
            canvas_id: Some(canvas.id),
            nodes: canvas.nodes.clone(),
            connections: canvas.connections.clone(),
            selected: None,
            view: ViewTransform::new(
                clamp_zoom(canvas.zoom),
                finite_or(canvas.pan_x, 0.0),
                finite_or(canvas.pan_y, 0.0),
            ),
            max_z_index: max_z_index(&canvas.nodes),
        }
    }

    /// Write nodes, connections, and view back into the stored record and
    /// bump its `updated_at`.
    pub fn commit_into(&self, canvas: &mut Canvas) {
        canvas.nodes.clone_from(&self.nodes);
        canvas.connections.clone_from(&self.connections);
        canvas.zoom = self.view.zoom;
        canvas.pan_x = self.view.pan.x;
        canvas.pan_y = self.view.pan.y;
        canvas.updated_at = Utc::now();
    }

    /// Reserve the next stacking index.
    pub(crate) fn next_z_index(&mut self) -> i64 {
        self.max_z_index += 1;
        self.max_z_index
    }

    /// Reset the content (not the view) to empty.
    pub(crate) fn clear_content(&mut self) {
        self.nodes.clear();
        self.connections.clear();
        self.selected = None;
        self.max_z_index = 0;
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn canvas_id(&self) -> Option<CanvasId> {
        self.canvas_id
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn selected_node_id(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn view(&self) -> ViewTransform {
        self.view
    }

    pub fn zoom(&self) -> f64 {
        self.view.zoom
    }

    pub fn pan(&self) -> Vec2 {
        self.view.pan
    }

    pub fn max_z_index(&self) -> i64 {
        self.max_z_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marble_core::NodeType;
    use pretty_assertions::assert_eq;

    #[test]
    fn load_recomputes_max_z_and_clears_selection() {
        let mut canvas = Canvas::new("A");
        canvas.nodes.push(Node::new(NodeType::Note, 0.0, 0.0, None, 4));
        canvas.nodes.push(Node::new(NodeType::Code, 0.0, 0.0, None, 11));
        canvas.zoom = 1.5;
        canvas.pan_x = -30.0;

        let session = ActiveSession::load(&canvas);
        assert_eq!(session.canvas_id(), Some(canvas.id));
        assert_eq!(session.max_z_index(), 11);
        assert_eq!(session.selected_node_id(), None);
        assert_eq!(session.view(), ViewTransform::new(1.5, -30.0, 0.0));
    }

    #[test]
    fn load_clamps_stored_zoom() {
        let mut canvas = Canvas::new("Legacy");
        canvas.zoom = 0.0;
        assert_eq!(ActiveSession::load(&canvas).zoom(), 0.25);
        canvas.zoom = 7.0;
        assert_eq!(ActiveSession::load(&canvas).zoom(), 2.0);
    }

    #[test]
    fn commit_writes_live_state_back() {
        let mut canvas = Canvas::new("A");
        let before = canvas.updated_at;
        let mut session = ActiveSession::load(&canvas);
        let z = session.next_z_index();
        session.nodes.push(Node::new(NodeType::Task, 1.0, 2.0, None, z));
        session.view = ViewTransform::new(0.5, 10.0, 20.0);

        session.commit_into(&mut canvas);
        assert_eq!(canvas.nodes, session.nodes);
        assert_eq!((canvas.zoom, canvas.pan_x, canvas.pan_y), (0.5, 10.0, 20.0));
        assert!(canvas.updated_at >= before);
    }
}
