//! Integration tests: export → import round-trip and import failure
//! isolation.

use marble_core::{NodePatch, NodeType};
use marble_engine::{CanvasEngine, EngineError, MemoryStorage};
use pretty_assertions::assert_eq;

fn populated_engine() -> CanvasEngine {
    let mut engine = CanvasEngine::in_memory();
    engine.create_canvas(Some("Research"));
    let note = engine.add_node(NodeType::Note, 12.5, -40.0, Some("hypothesis"));
    let tasks = engine.add_node(NodeType::Task, 300.0, 10.0, None);
    let code = engine.add_node(NodeType::Code, 0.0, 400.0, None);
    engine.add_task(tasks, "collect data");
    engine.toggle_task(tasks, 0);
    engine.update_node(code, &NodePatch::size(640.0, 320.0));
    engine.add_connection(note, tasks);
    engine.add_connection(tasks, code);
    engine.set_zoom(0.75);
    engine.set_pan(33.0, -7.0);
    engine
}

#[test]
fn export_contains_the_documented_fields() {
    let engine = populated_engine();
    let json: serde_json::Value = serde_json::from_str(&engine.export_canvas().unwrap()).unwrap();

    assert_eq!(json["name"], "Research");
    assert_eq!(json["version"], "1.0");
    assert_eq!(json["zoom"], 0.75);
    assert_eq!(json["panX"], 33.0);
    assert_eq!(json["panY"], -7.0);
    assert!(json["exportedAt"].is_string());
    assert_eq!(json["nodes"].as_array().unwrap().len(), 3);
    assert_eq!(json["nodes"][1]["content"], "[x] New task\n[ ] collect data");
    assert_eq!(json["connections"][0]["color"], "lavender");
}

#[test]
fn import_of_export_reproduces_nodes_and_connections() {
    let mut engine = populated_engine();
    let original = engine.active_canvas_id();
    let nodes = engine.nodes().to_vec();
    let connections = engine.connections().to_vec();

    let exported = engine.export_canvas().unwrap();
    let imported = engine.import_canvas(&exported).unwrap();

    assert_ne!(Some(imported), original);
    assert_eq!(engine.active_canvas_id(), Some(imported));
    assert_eq!(engine.canvases().len(), 2);
    assert_eq!(engine.nodes(), nodes.as_slice());
    assert_eq!(engine.connections(), connections.as_slice());
    assert_eq!(engine.zoom(), 0.75);
    assert_eq!(engine.max_z_index(), 3);
    assert_eq!(engine.canvas(imported).unwrap().name, "Research");
}

#[test]
fn import_commits_the_previous_canvas_first() {
    let mut engine = populated_engine();
    let original = engine.active_canvas_id().unwrap();
    engine.set_zoom(1.5);
    engine.import_canvas(r#"{"name": "Blank"}"#).unwrap();
    assert_eq!(engine.canvas(original).unwrap().zoom, 1.5);
}

#[test]
fn export_without_active_canvas_is_untitled() {
    let engine = CanvasEngine::in_memory();
    let snapshot = engine.export_snapshot();
    assert_eq!(snapshot.name, "Untitled");
    assert!(snapshot.nodes.is_empty());
}

#[test]
fn malformed_import_leaves_state_untouched() {
    let mut engine = populated_engine();
    let canvases = engine.canvases().to_vec();
    let active = engine.active_canvas_id();
    let nodes = engine.nodes().to_vec();
    let writes = engine.storage().write_count();
    let slot = engine.storage().contents().map(str::to_string);

    for bad in [
        "",
        "{ definitely not json",
        "42",
        r#"{"nodes": [{"id": "n1", "type": "sticky"}]}"#,
        r#"{"zoom": "big"}"#,
    ] {
        let err = engine.import_canvas(bad).unwrap_err();
        assert!(matches!(err, EngineError::Parse(_)), "unexpected error for {bad:?}: {err}");
    }

    assert_eq!(engine.canvases(), canvases.as_slice());
    assert_eq!(engine.active_canvas_id(), active);
    assert_eq!(engine.nodes(), nodes.as_slice());
    assert_eq!(engine.storage().write_count(), writes);
    assert_eq!(engine.storage().contents().map(str::to_string), slot);
}

#[test]
fn import_keeps_dangling_connections() {
    let mut engine = CanvasEngine::new(MemoryStorage::new());
    let payload = r#"{
        "name": "Loose ends",
        "connections": [{ "id": "c1", "fromId": "gone-a", "toId": "gone-b" }]
    }"#;
    engine.import_canvas(payload).unwrap();
    assert_eq!(engine.connections().len(), 1);
    assert!(engine.resolved_connections().is_empty());
    assert_eq!(engine.max_z_index(), 0);
}

#[test]
fn import_tolerates_colors_outside_the_palette() {
    let mut engine = CanvasEngine::in_memory();
    let payload = r##"{
        "name": "Hex colors",
        "nodes": [{
            "id": "n-hex", "type": "note", "x": 0, "y": 0, "width": 280, "height": 180,
            "content": "red", "color": "#ff0000", "zIndex": 2,
            "createdAt": "2024-05-01T00:00:00Z"
        }],
        "connections": [{ "id": "c-hex", "fromId": "n-hex", "toId": "n-hex", "color": "teal" }]
    }"##;
    engine.import_canvas(payload).unwrap();
    assert_eq!(engine.nodes()[0].color, None);
    assert_eq!(engine.nodes()[0].content, "red");
    assert_eq!(engine.connections()[0].color, None);
    assert_eq!(engine.max_z_index(), 2);
}
