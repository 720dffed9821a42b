//! Entity model for Marble canvases.
//!
//! A `Canvas` is a named workspace holding an ordered list of `Node`s
//! (positioned content blocks) and `Connection`s (directed links between
//! nodes), plus the view state it was last left in. Every type here is a
//! plain value; the engine crate owns mutation and lifecycle.

use crate::id::{CanvasId, ConnectionId, NodeId};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Deserializer, Serialize};

/// Name given to canvases created without an explicit one.
pub const DEFAULT_CANVAS_NAME: &str = "Untitled Canvas";

/// Suffix appended to the name of a duplicated canvas.
pub const COPY_SUFFIX: &str = " (Copy)";

// ─── Node kinds ──────────────────────────────────────────────────────────

/// The kind of content block. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Note,
    Image,
    Link,
    Code,
    Task,
}

impl NodeType {
    pub const ALL: [NodeType; 5] = [
        NodeType::Note,
        NodeType::Image,
        NodeType::Link,
        NodeType::Code,
        NodeType::Task,
    ];

    /// Size a freshly created node of this kind gets.
    pub const fn default_size(self) -> Size {
        match self {
            NodeType::Note => Size::new(280.0, 180.0),
            NodeType::Image => Size::new(300.0, 200.0),
            NodeType::Link => Size::new(320.0, 100.0),
            NodeType::Code => Size::new(400.0, 200.0),
            NodeType::Task => Size::new(280.0, 120.0),
        }
    }

    /// Placeholder content for a freshly created node of this kind.
    pub const fn default_content(self) -> &'static str {
        match self {
            NodeType::Note | NodeType::Image => "",
            NodeType::Code => "// Start typing your code...",
            NodeType::Task => "[ ] New task",
            NodeType::Link => "https://",
        }
    }

    /// Only notes open in edit mode on creation.
    pub const fn starts_editing(self) -> bool {
        matches!(self, NodeType::Note)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            NodeType::Note => "note",
            NodeType::Image => "image",
            NodeType::Link => "link",
            NodeType::Code => "code",
            NodeType::Task => "task",
        }
    }
}

impl std::str::FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown node type `{s}` (expected note, image, link, code or task)"))
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Width/height of a node, in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

// ─── Colors ──────────────────────────────────────────────────────────────

/// Cosmetic color tag from the fixed node palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeColor {
    Coral,
    Mint,
    Lavender,
    Amber,
    Rose,
    Sky,
}

impl NodeColor {
    pub const PALETTE: [NodeColor; 6] = [
        NodeColor::Coral,
        NodeColor::Mint,
        NodeColor::Lavender,
        NodeColor::Amber,
        NodeColor::Rose,
        NodeColor::Sky,
    ];

    /// Uniform pick from the palette.
    pub fn random() -> Self {
        *Self::PALETTE
            .choose(&mut rand::thread_rng())
            .unwrap_or(&NodeColor::Lavender)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            NodeColor::Coral => "coral",
            NodeColor::Mint => "mint",
            NodeColor::Lavender => "lavender",
            NodeColor::Amber => "amber",
            NodeColor::Rose => "rose",
            NodeColor::Sky => "sky",
        }
    }
}

impl std::str::FromStr for NodeColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeColor::PALETTE
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown node color `{s}`"))
    }
}

// ─── Lenient field decoding ──────────────────────────────────────────────
//
// Stored and imported records may carry values this build cannot represent:
// `null` where a non-finite number was written, or a color string from
// outside the palette. These decode to a default instead of failing the
// whole record.

/// Replace a non-finite value with `fallback`.
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?
        .map(|v| finite_or(v, 0.0))
        .unwrap_or_default())
}

fn lenient_zoom<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?
        .filter(|z| z.is_finite())
        .unwrap_or_else(default_zoom))
}

fn lenient_color<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<NodeColor>, D::Error> {
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match raw.parse() {
        Ok(color) => Ok(Some(color)),
        Err(_) => {
            log::debug!("dropping unknown color `{raw}`");
            Ok(None)
        }
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// A positioned content block on a canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeType,
    #[serde(deserialize_with = "lenient_f64")]
    pub x: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub y: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub width: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub height: f64,
    /// Type-specific payload; tasks use the bracket-prefixed line format.
    pub content: String,
    #[serde(
        default,
        deserialize_with = "lenient_color",
        skip_serializing_if = "Option::is_none"
    )]
    pub color: Option<NodeColor>,
    /// Transient UI state, carried through storage untouched.
    #[serde(default)]
    pub is_editing: bool,
    pub z_index: i64,
    pub created_at: DateTime<Utc>,
}

impl Node {
    /// Build a node with the per-type defaults applied.
    ///
    /// Empty or absent `content` falls back to the type's placeholder.
    pub fn new(kind: NodeType, x: f64, y: f64, content: Option<String>, z_index: i64) -> Self {
        let size = kind.default_size();
        let content = content
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| kind.default_content().to_string());
        Self {
            id: NodeId::generate(),
            kind,
            x: finite_or(x, 0.0),
            y: finite_or(y, 0.0),
            width: size.width,
            height: size.height,
            content,
            color: Some(NodeColor::random()),
            is_editing: kind.starts_editing(),
            z_index,
            created_at: Utc::now(),
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Merge a partial update. `id` and `kind` are never touched, and
    /// non-finite geometry is ignored.
    pub fn apply(&mut self, patch: &NodePatch) {
        if let Some(x) = patch.x {
            self.x = finite_or(x, self.x);
        }
        if let Some(y) = patch.y {
            self.y = finite_or(y, self.y);
        }
        if let Some(width) = patch.width {
            self.width = finite_or(width, self.width);
        }
        if let Some(height) = patch.height {
            self.height = finite_or(height, self.height);
        }
        if let Some(content) = &patch.content {
            self.content.clone_from(content);
        }
        if let Some(color) = patch.color {
            self.color = Some(color);
        }
        if let Some(is_editing) = patch.is_editing {
            self.is_editing = is_editing;
        }
        if let Some(z_index) = patch.z_index {
            self.z_index = z_index;
        }
    }
}

/// Partial node update. Absent fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodePatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub content: Option<String>,
    pub color: Option<NodeColor>,
    pub is_editing: Option<bool>,
    pub z_index: Option<i64>,
}

impl NodePatch {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn size(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }
}

// ─── Connections ─────────────────────────────────────────────────────────

/// A directed visual link between two nodes.
///
/// Endpoints are not guaranteed to exist; readers must skip dangling ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: ConnectionId,
    pub from_id: NodeId,
    pub to_id: NodeId,
    #[serde(
        default,
        deserialize_with = "lenient_color",
        skip_serializing_if = "Option::is_none"
    )]
    pub color: Option<NodeColor>,
}

impl Connection {
    pub fn new(from_id: NodeId, to_id: NodeId) -> Self {
        Self {
            id: ConnectionId::generate(),
            from_id,
            to_id,
            color: Some(NodeColor::Lavender),
        }
    }

    pub fn touches(&self, node: NodeId) -> bool {
        self.from_id == node || self.to_id == node
    }
}

// ─── Canvases ────────────────────────────────────────────────────────────

/// A named, independent workspace with its own persisted view state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Canvas {
    pub id: CanvasId,
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "default_zoom", deserialize_with = "lenient_zoom")]
    pub zoom: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub pan_x: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub pan_y: f64,
}

fn default_zoom() -> f64 {
    1.0
}

impl Canvas {
    /// A new empty canvas at the identity view.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: CanvasId::generate(),
            name: name.into(),
            nodes: Vec::new(),
            connections: Vec::new(),
            created_at: now,
            updated_at: now,
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }

    /// Highest stacking index on the canvas, or 0 when it has no nodes.
    pub fn max_z_index(&self) -> i64 {
        max_z_index(&self.nodes)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Copy this canvas under a new id with every node re-identified.
    ///
    /// Connections are dropped: their endpoints referred to the old ids.
    pub fn duplicate(&self) -> Canvas {
        let now = Utc::now();
        Canvas {
            id: CanvasId::generate(),
            name: format!("{}{COPY_SUFFIX}", self.name),
            nodes: self
                .nodes
                .iter()
                .map(|n| Node {
                    id: NodeId::generate(),
                    ..n.clone()
                })
                .collect(),
            connections: Vec::new(),
            created_at: now,
            updated_at: now,
            zoom: self.zoom,
            pan_x: self.pan_x,
            pan_y: self.pan_y,
        }
    }
}

/// `max(0, max zIndex)` over a node list.
pub fn max_z_index(nodes: &[Node]) -> i64 {
    nodes.iter().map(|n| n.z_index).max().unwrap_or(0).max(0)
}
