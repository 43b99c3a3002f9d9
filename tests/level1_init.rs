//! Level 1: Basic Initialization Tests
//!
//! Tests controller creation, initial state, and deferred measurement.

mod common;

use common::harness::{FlowTestHarness, CONTAINER, NODE_HEIGHT, NODE_WIDTH};
use slint::Model;
use slint_flow_viewport::{
    Edge, FlowConfig, FlowController, FlowError, Node, NodeChange, Point, Size, Transform,
};

#[test]
fn test_controller_initializes_with_defaults() {
    let harness = FlowTestHarness::new();

    assert_eq!(harness.ctrl.zoom(), 1.0);
    assert_eq!(harness.ctrl.transform(), Transform::IDENTITY);
    assert!(!harness.ctrl.is_connecting());
    assert!(!harness.ctrl.is_dragging_nodes());
    assert!(harness.ctrl.selected_nodes().is_empty());
}

#[test]
fn test_zero_sized_container_fails() {
    let result = FlowController::new(Size::new(800.0, 0.0), FlowConfig::default());
    assert!(matches!(
        result,
        Err(FlowError::ZeroSizedContainer { width, height }) if width == 800.0 && height == 0.0
    ));
}

#[test]
fn test_default_zoom_is_clamped_into_range() {
    let config = FlowConfig {
        default_zoom: 5.0,
        ..FlowConfig::default()
    };
    let ctrl = FlowController::new(CONTAINER, config).unwrap();
    assert_eq!(ctrl.zoom(), 2.0);
}

#[test]
fn test_models_populated_after_render() {
    let harness = FlowTestHarness::new();
    assert_eq!(harness.nodes_model.row_count(), 0);

    harness.render();

    assert_eq!(harness.nodes_model.row_count(), 2);
    assert_eq!(harness.edges_model.row_count(), 1);
    let row = harness.nodes_model.row_data(0).unwrap();
    assert_eq!(row.id.as_str(), "a");
    assert_eq!(row.rect.x, 100.0);
    assert_eq!(row.rect.width, NODE_WIDTH);
}

#[test]
fn test_measurements_are_deferred_until_render() {
    let harness = FlowTestHarness::new();

    assert_eq!(harness.ctrl.tracker().pending(), 2);
    assert!(harness.ctrl.store().borrow().get("a").unwrap().measured.is_none());

    let frame = harness.ctrl.render();

    assert_eq!(harness.ctrl.tracker().pending(), 0);
    assert_eq!(frame.edges.len(), 1);
    assert_eq!(
        harness.ctrl.store().borrow().get("a").unwrap().measured,
        Some(Size::new(NODE_WIDTH, NODE_HEIGHT))
    );
}

#[test]
fn test_unmeasured_nodes_yield_no_edges() {
    let harness = FlowTestHarness::with_nodes_and_edges(
        FlowConfig::default(),
        vec![Node::new("a", 0.0, 0.0), Node::new("b", 300.0, 0.0)],
        vec![Edge::new("a-b", "a", "b")],
    );

    let frame = harness.ctrl.render();
    assert!(frame.edges.is_empty());
    assert!(frame.nodes.is_empty());

    harness.measure("a", 100.0, 50.0);
    assert!(harness.ctrl.render().edges.is_empty());

    harness.measure("b", 100.0, 50.0);
    assert_eq!(harness.ctrl.render().edges.len(), 1);
}

#[test]
fn test_measurement_survives_set_nodes() {
    let harness = FlowTestHarness::new();
    harness.render();

    let mut nodes = harness.ctrl.nodes();
    nodes[0].position = Point::new(0.0, 0.0);
    harness.ctrl.set_nodes(nodes).unwrap();

    let frame = harness.ctrl.render();
    assert_eq!(frame.nodes.len(), 2);
    assert_eq!(frame.edges.len(), 1);
}

#[test]
fn test_exported_nodes_carry_measured_size() {
    let harness = FlowTestHarness::new();
    harness.render();

    let a = harness.ctrl.nodes().into_iter().find(|n| n.id == "a").unwrap();
    assert_eq!(a.width, Some(NODE_WIDTH));
    assert_eq!(a.height, Some(NODE_HEIGHT));
}

#[test]
fn test_duplicate_ids_are_rejected_without_change() {
    let harness = FlowTestHarness::new();
    let result = harness
        .ctrl
        .set_nodes(vec![Node::new("x", 0.0, 0.0), Node::new("x", 10.0, 0.0)]);

    assert!(matches!(result, Err(FlowError::DuplicateNodeId(id)) if id == "x"));
    assert_eq!(harness.ctrl.nodes().len(), 2);
}

#[test]
fn test_parent_cycle_is_rejected() {
    let harness = FlowTestHarness::new();
    let result = harness.ctrl.set_nodes(vec![
        Node::new("p", 0.0, 0.0).with_parent("q"),
        Node::new("q", 0.0, 0.0).with_parent("p"),
    ]);
    assert!(matches!(result, Err(FlowError::ParentCycle { .. })));
}

#[test]
fn test_node_change_events() {
    let harness = FlowTestHarness::new();
    let rx = harness.ctrl.subscribe_node_changes();

    harness.ctrl.set_nodes(vec![Node::new("a", 100.0, 100.0), Node::new("c", 0.0, 0.0)])
        .unwrap();

    let events: Vec<NodeChange> = rx.try_iter().collect();
    assert!(events.contains(&NodeChange::Add { id: "c".into() }));
    assert!(events.contains(&NodeChange::Remove { id: "b".into() }));
}

#[test]
fn test_config_loads_from_json() {
    let config = FlowConfig::from_json(r#"{"min_zoom": 0.25, "snap_to_grid": true}"#).unwrap();
    assert_eq!(config.min_zoom, 0.25);
    assert!(config.snap_to_grid);
    assert_eq!(config.max_zoom, 2.0);

    let ctrl = FlowController::new(CONTAINER, config).unwrap();
    ctrl.zoom_to(0.1, None);
    assert_eq!(ctrl.zoom(), 0.25);
}
