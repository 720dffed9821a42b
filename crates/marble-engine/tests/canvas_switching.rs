//! Integration tests: canvas lifecycle and the switch protocol.
//!
//! Exercises create/delete/duplicate/switch against the live mirror and
//! the stored records.

use marble_core::{NodePatch, NodeType};
use marble_engine::CanvasEngine;
use pretty_assertions::assert_eq;

// ─── Switch round-trip ──────────────────────────────────────────────────

#[test]
fn switching_away_and_back_restores_everything() {
    let mut engine = CanvasEngine::in_memory();
    let x = engine.create_canvas(Some("X"));
    let a = engine.add_node(NodeType::Note, 10.0, 20.0, Some("first"));
    let b = engine.add_node(NodeType::Code, 300.0, 40.0, None);
    engine.add_connection(a, b);
    engine.bring_to_front(a);
    engine.set_zoom(1.75);
    engine.set_pan(-120.0, 64.0);

    let nodes = engine.nodes().to_vec();
    let connections = engine.connections().to_vec();

    let y = engine.create_canvas(Some("Y"));
    engine.add_node(NodeType::Task, 0.0, 0.0, None);
    assert_eq!(engine.active_canvas_id(), Some(y));
    assert_eq!(engine.zoom(), 1.0);

    engine.switch_canvas(x);
    assert_eq!(engine.active_canvas_id(), Some(x));
    assert_eq!(engine.nodes(), nodes.as_slice());
    assert_eq!(engine.connections(), connections.as_slice());
    assert_eq!(engine.zoom(), 1.75);
    assert_eq!((engine.pan().x, engine.pan().y), (-120.0, 64.0));
    assert_eq!(engine.selected_node_id(), None);
    assert_eq!(engine.max_z_index(), 3);
}

#[test]
fn switch_commits_uncommitted_view_state() {
    let mut engine = CanvasEngine::in_memory();
    let x = engine.create_canvas(Some("X"));
    engine.create_canvas(Some("Y"));
    engine.switch_canvas(x);
    engine.set_pan(5.0, 6.0);

    let y = engine.canvases()[1].id;
    engine.switch_canvas(y);
    let stored = engine.canvas(x).unwrap();
    assert_eq!((stored.pan_x, stored.pan_y), (5.0, 6.0));
}

#[test]
fn z_index_counter_is_per_canvas() {
    let mut engine = CanvasEngine::in_memory();
    let x = engine.create_canvas(Some("X"));
    for _ in 0..4 {
        engine.add_node(NodeType::Note, 0.0, 0.0, None);
    }
    engine.create_canvas(Some("Y"));
    assert_eq!(engine.max_z_index(), 0);
    let first = engine.add_node(NodeType::Note, 0.0, 0.0, None);
    assert_eq!(engine.node(first).unwrap().z_index, 1);

    engine.switch_canvas(x);
    assert_eq!(engine.max_z_index(), 4);
    let next = engine.add_node(NodeType::Note, 0.0, 0.0, None);
    assert_eq!(engine.node(next).unwrap().z_index, 5);
}

// ─── Delete ─────────────────────────────────────────────────────────────

#[test]
fn deleting_active_canvas_activates_first_remaining() {
    let mut engine = CanvasEngine::in_memory();
    let first = engine.create_canvas(Some("First"));
    let note = engine.add_node(NodeType::Note, 1.0, 2.0, None);
    let second = engine.create_canvas(Some("Second"));
    engine.add_node(NodeType::Link, 0.0, 0.0, None);

    engine.delete_canvas(second);
    assert_eq!(engine.canvases().len(), 1);
    assert_eq!(engine.active_canvas_id(), Some(first));
    assert_eq!(engine.nodes().len(), 1);
    assert_eq!(engine.nodes()[0].id, note);
    assert_eq!(engine.max_z_index(), 1);
}

#[test]
fn deleting_last_canvas_clears_the_mirror() {
    let mut engine = CanvasEngine::in_memory();
    let only = engine.create_canvas(None);
    engine.add_node(NodeType::Note, 0.0, 0.0, None);
    engine.set_zoom(0.5);

    engine.delete_canvas(only);
    assert!(engine.canvases().is_empty());
    assert_eq!(engine.active_canvas_id(), None);
    assert!(engine.nodes().is_empty());
    assert_eq!(engine.zoom(), 1.0);
    assert_eq!(engine.max_z_index(), 0);
}

#[test]
fn deleting_inactive_canvas_leaves_mirror_alone() {
    let mut engine = CanvasEngine::in_memory();
    let other = engine.create_canvas(Some("Other"));
    let active = engine.create_canvas(Some("Active"));
    let node = engine.add_node(NodeType::Note, 0.0, 0.0, None);
    engine.set_pan(9.0, 9.0);

    engine.delete_canvas(other);
    assert_eq!(engine.active_canvas_id(), Some(active));
    assert_eq!(engine.selected_node_id(), Some(node));
    assert_eq!((engine.pan().x, engine.pan().y), (9.0, 9.0));
}

// ─── Rename / duplicate ─────────────────────────────────────────────────

#[test]
fn rename_touches_only_the_record() {
    let mut engine = CanvasEngine::in_memory();
    let id = engine.create_canvas(Some("Draft"));
    let before = engine.canvas(id).unwrap().updated_at;
    engine.rename_canvas(id, "Final");
    let canvas = engine.canvas(id).unwrap();
    assert_eq!(canvas.name, "Final");
    assert!(canvas.updated_at >= before);
}

#[test]
fn duplicate_drops_connections_and_reidentifies_nodes() {
    let mut engine = CanvasEngine::in_memory();
    let source = engine.create_canvas(Some("Board"));
    let a = engine.add_node(NodeType::Note, 0.0, 0.0, None);
    let b = engine.add_node(NodeType::Task, 50.0, 0.0, None);
    let c = engine.add_node(NodeType::Image, 100.0, 0.0, None);
    engine.add_connection(a, b);
    engine.add_connection(b, c);
    engine.update_node(c, &NodePatch::content("https://example.com/cat.png"));

    let copy_id = engine.duplicate_canvas(source).unwrap();
    assert_eq!(engine.active_canvas_id(), Some(source));

    let original = engine.canvas(source).unwrap().clone();
    let copy = engine.canvas(copy_id).unwrap();
    assert_eq!(copy.name, "Board (Copy)");
    assert_eq!(copy.nodes.len(), 3);
    assert!(copy.connections.is_empty());
    assert_eq!(original.connections.len(), 2);
    for node in &copy.nodes {
        assert!(original.node(node.id).is_none());
    }
    assert_eq!(copy.nodes[2].content, "https://example.com/cat.png");
}
