//! Export/import file format.
//!
//! An export is a JSON object carrying the active canvas's name, nodes,
//! connections, and view, stamped with `exportedAt` and a format
//! `version`. Import is lenient about missing top-level fields and falls
//! back to defaults; node and connection records themselves must be well
//! formed.

use chrono::{DateTime, Utc};
use marble_core::{Canvas, Connection, Node, clamp_zoom};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const EXPORT_VERSION: &str = "1.0";

/// Name used when an import carries no (or an empty) name.
pub const IMPORTED_CANVAS_NAME: &str = "Imported Canvas";

/// Name exported when there is no active canvas.
pub const UNTITLED_EXPORT_NAME: &str = "Untitled";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedCanvas {
    pub name: String,
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
    pub exported_at: DateTime<Utc>,
    pub version: &'static str,
}

/// Parsed import payload. `exportedAt` and `version` are accepted but unused.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportedCanvas {
    pub name: Option<String>,
    pub nodes: Option<Vec<Node>>,
    pub connections: Option<Vec<Connection>>,
    pub zoom: Option<f64>,
    pub pan_x: Option<f64>,
    pub pan_y: Option<f64>,
}

impl ImportedCanvas {
    pub fn parse(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }

    /// Connections whose endpoints are not among the imported nodes.
    pub fn dangling_connections(&self) -> usize {
        let nodes = self.nodes.as_deref().unwrap_or_default();
        let ids: HashSet<_> = nodes.iter().map(|n| n.id).collect();
        self.connections
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|c| !ids.contains(&c.from_id) || !ids.contains(&c.to_id))
            .count()
    }

    /// Build a fresh canvas record. Node ids are kept as imported.
    pub fn into_canvas(self) -> Canvas {
        let name = self
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| IMPORTED_CANVAS_NAME.to_string());
        let mut canvas = Canvas::new(name);
        canvas.nodes = self.nodes.unwrap_or_default();
        canvas.connections = self.connections.unwrap_or_default();
        canvas.zoom = clamp_zoom(self.zoom.filter(|z| *z != 0.0).unwrap_or(1.0));
        canvas.pan_x = self.pan_x.unwrap_or(0.0);
        canvas.pan_y = self.pan_y.unwrap_or(0.0);
        canvas
    }
}
