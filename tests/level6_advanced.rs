//! Level 6: Advanced Feature Tests
//!
//! Tests the minimap, export and import, nested nodes, incremental
//! measurement, runtime configuration changes, and a full connect-to-edge
//! application flow.

mod common;

use common::harness::{FlowTestHarness, CONTAINER};
use slint_flow_viewport::{
    ConnectionMode, Edge, EdgeType, FlowConfig, FlowController, FlowExportObject, HandleRole,
    MinimapOptions, Node, Point, Rect, Size, Transform,
};

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

// ============================================================================
// Minimap
// ============================================================================

#[test]
fn test_minimap_fits_viewport_and_nodes() {
    let harness = FlowTestHarness::new();

    let frame = harness.ctrl.minimap(&MinimapOptions::default());

    // Both nodes are inside the 1000x800 viewport, so the viewport decides
    assert!(approx(frame.projection.scale, 800.0 / 150.0));
    let center = frame.projection.project_point(Point::new(500.0, 400.0));
    assert!(approx(center.x, 100.0) && approx(center.y, 75.0));
    assert!(approx(frame.viewport.width, 187.5));
    assert!(approx(frame.viewport.x, 6.25));
    assert_eq!(frame.nodes.len(), 2);
}

#[test]
fn test_minimap_grows_with_far_nodes() {
    let harness = FlowTestHarness::with_nodes_and_edges(
        FlowConfig::default(),
        vec![Node::new("origin", 0.0, 0.0), Node::new("far", 2850.0, 0.0)],
        Vec::new(),
    );
    harness.measure_all();

    let frame = harness.ctrl.minimap(&MinimapOptions::default());

    // Combined box is 3000 wide
    assert!(approx(frame.projection.scale, 15.0));
    let (_, far) = frame.nodes.iter().find(|(id, _)| id == "far").unwrap();
    assert!(approx(far.right(), 200.0));
}

#[test]
fn test_minimap_click_maps_back_to_graph() {
    let harness = FlowTestHarness::new();
    let frame = harness.ctrl.minimap(&MinimapOptions::default());

    let target = frame.projection.unproject_point(Point::new(100.0, 75.0));
    let t = harness.ctrl.set_center(target.x, target.y, None);

    assert!(approx(t.x, 0.0) && approx(t.y, 0.0));
}

// ============================================================================
// Export
// ============================================================================

#[test]
fn test_export_round_trip_is_exact() {
    let harness = FlowTestHarness::new();
    harness.ctrl.set_transform(Transform::new(123.456, -78.9, 1.337));
    harness.node_drag("a", 13.0, 7.0);

    let json = harness.ctrl.to_object().to_json().unwrap();

    let restored = FlowController::new(CONTAINER, FlowConfig::default()).unwrap();
    restored.from_object(FlowExportObject::from_json(&json).unwrap()).unwrap();

    // Measured sizes are exported but re-measured after import
    let unsized_nodes = |nodes: Vec<Node>| -> Vec<Node> {
        nodes
            .into_iter()
            .map(|n| Node {
                width: None,
                height: None,
                ..n
            })
            .collect()
    };
    assert_eq!(restored.transform(), harness.ctrl.transform());
    assert_eq!(unsized_nodes(restored.nodes()), unsized_nodes(harness.ctrl.nodes()));
    assert_eq!(restored.edges(), harness.ctrl.edges());
}

#[test]
fn test_custom_edge_type_survives_export_and_routes_as_bezier() {
    let harness = FlowTestHarness::new();
    harness.ctrl.set_edges(vec![
        Edge::new("plain", "a", "b").with_handles(Some("out"), Some("in")),
        Edge::new("fancy", "a", "b")
            .with_handles(Some("out"), Some("in"))
            .with_type(EdgeType::Custom("wavy".into())),
    ]);

    let frame = harness.ctrl.render();
    assert_eq!(frame.edges.len(), 2);
    assert_eq!(frame.edges[0].path, frame.edges[1].path);

    let json = harness.ctrl.to_object().to_json().unwrap();
    assert!(json.contains(r#""type":"wavy""#));

    let restored = FlowController::new(CONTAINER, FlowConfig::default()).unwrap();
    restored.from_object(FlowExportObject::from_json(&json).unwrap()).unwrap();
    assert_eq!(restored.edges()[1].edge_type, EdgeType::Custom("wavy".into()));
}

#[test]
fn test_import_with_bad_nodes_changes_nothing() {
    let ctrl = FlowController::new(CONTAINER, FlowConfig::default()).unwrap();
    let object = FlowExportObject::new(
        vec![Node::new("x", 0.0, 0.0).with_parent("missing")],
        vec![Edge::new("e", "x", "x")],
        Transform::new(50.0, 50.0, 1.5),
    );

    assert!(ctrl.from_object(object).is_err());
    assert_eq!(ctrl.transform(), Transform::IDENTITY);
    assert!(ctrl.nodes().is_empty());
    assert!(ctrl.edges().is_empty());
}

// ============================================================================
// Nesting
// ============================================================================

#[test]
fn test_nested_nodes_render_at_absolute_positions() {
    let harness = FlowTestHarness::with_nodes_and_edges(
        FlowConfig::default(),
        vec![
            Node::new("group", 100.0, 100.0),
            Node::new("child", 20.0, 30.0).with_parent("group"),
            Node::new("grandchild", 5.0, 5.0).with_parent("child"),
        ],
        Vec::new(),
    );
    harness.measure("group", 400.0, 300.0);
    harness.measure("child", 200.0, 100.0);
    harness.measure("grandchild", 50.0, 50.0);

    let frame = harness.ctrl.render();
    let by_id = |id: &str| frame.nodes.iter().find(|n| n.id == id).unwrap().clone();

    assert_eq!(by_id("child").rect, Rect::new(120.0, 130.0, 200.0, 100.0));
    assert_eq!(by_id("grandchild").rect.origin(), Point::new(125.0, 135.0));
    assert!(by_id("child").z > by_id("group").z);
    assert!(by_id("grandchild").z > by_id("child").z);
}

#[test]
fn test_edges_to_nested_nodes_use_absolute_anchors() {
    let harness = FlowTestHarness::with_nodes_and_edges(
        FlowConfig::default(),
        vec![
            Node::new("outside", 0.0, 0.0),
            Node::new("group", 300.0, 0.0),
            Node::new("inner", 50.0, 50.0).with_parent("group"),
        ],
        vec![Edge::new("e", "outside", "inner").with_type(EdgeType::Straight)],
    );
    harness.measure("outside", 100.0, 100.0);
    harness.measure("group", 300.0, 300.0);
    harness.measure("inner", 100.0, 100.0);

    let frame = harness.ctrl.render();
    assert_eq!(frame.edges[0].path.end(), Some(Point::new(350.0, 100.0)));
}

#[test]
fn test_reparenting_into_own_descendant_fails() {
    let harness = FlowTestHarness::with_nodes_and_edges(
        FlowConfig::default(),
        vec![Node::new("p", 0.0, 0.0), Node::new("c", 0.0, 0.0).with_parent("p")],
        Vec::new(),
    );
    let store = harness.ctrl.store();
    assert!(store.borrow_mut().set_parent("p", Some("c")).is_err());
    assert!(store.borrow_mut().set_parent("c", None).is_ok());
    assert!(store.borrow_mut().set_parent("p", Some("c")).is_ok());
}

// ============================================================================
// Measurement
// ============================================================================

#[test]
fn test_size_only_update_keeps_handles() {
    let harness = FlowTestHarness::new();
    harness.render();

    harness.ctrl.tracker().report_size("a", Size::new(200.0, 100.0));
    let frame = harness.ctrl.render();

    assert_eq!(frame.edges.len(), 1);
    let a = frame.nodes.iter().find(|n| n.id == "a").unwrap();
    assert_eq!(a.rect.width, 200.0);
}

#[test]
fn test_handles_reported_before_size_survive_a_render() {
    let harness = FlowTestHarness::with_nodes_and_edges(
        FlowConfig::default(),
        vec![Node::new("a", 0.0, 0.0), Node::new("b", 300.0, 0.0)],
        vec![Edge::new("e", "a", "b").with_handles(Some("out"), Some("in"))],
    );
    let tracker = harness.ctrl.tracker();
    let handle = tracker.handle_callback();
    for id in ["a", "b"] {
        handle(id.into(), "out".into(), 0, 1, 95.0, 15.0, 10.0, 10.0);
        handle(id.into(), "in".into(), 1, 3, -5.0, 15.0, 10.0, 10.0);
    }
    assert!(harness.ctrl.render().edges.is_empty());

    for id in ["a", "b"] {
        tracker.node_size_callback()(id.into(), 100.0, 40.0);
    }
    let frame = harness.ctrl.render();

    assert_eq!(frame.edges.len(), 1);
    assert_eq!(frame.edges[0].path.start(), Some(Point::new(100.0, 20.0)));
    assert_eq!(frame.edges[0].path.end(), Some(Point::new(300.0, 20.0)));
}

#[test]
fn test_moving_one_handle_keeps_the_others() {
    let harness = FlowTestHarness::new();
    harness.render();

    // Only "out" on node a is re-reported
    let handle = harness.ctrl.tracker().handle_callback();
    handle("a".into(), "out".into(), 0, 2, 70.0, 95.0, 10.0, 10.0);
    let frame = harness.ctrl.render();

    assert_eq!(frame.edges.len(), 1);
    assert_eq!(frame.edges[0].path.start(), Some(Point::new(175.0, 200.0)));
    let store = harness.ctrl.store();
    let bounds = store.borrow().get("a").unwrap().handle_bounds.clone().unwrap();
    assert_eq!(bounds.target.len(), 1);
}

#[test]
fn test_handles_without_ids_resolve_edges_without_ids() {
    let harness = FlowTestHarness::with_nodes_and_edges(
        FlowConfig::default(),
        vec![Node::new("a", 0.0, 0.0), Node::new("b", 300.0, 0.0)],
        vec![Edge::new("e", "a", "b").with_type(EdgeType::Straight)],
    );
    let tracker = harness.ctrl.tracker();
    let handle = tracker.handle_callback();
    for id in ["a", "b"] {
        tracker.node_size_callback()(id.into(), 100.0, 40.0);
        handle(id.into(), "".into(), 0, 2, 45.0, 35.0, 10.0, 10.0);
        handle(id.into(), "".into(), 1, 0, 45.0, -5.0, 10.0, 10.0);
    }

    let frame = harness.ctrl.render();
    let path = &frame.edges[0].path;
    assert_eq!(path.start(), Some(Point::new(50.0, 40.0)));
    assert_eq!(path.end(), Some(Point::new(350.0, 0.0)));
}

// ============================================================================
// Runtime configuration
// ============================================================================

#[test]
fn test_switching_to_loose_mode_at_runtime() {
    let harness = FlowTestHarness::new();
    harness.ctrl.flush_measurements();
    let from = harness.handle_center("a", HandleRole::Source);
    let to = harness.handle_center("b", HandleRole::Source);

    harness.connect_drag(from, to);
    assert_eq!(harness.tracker.connect_count(), 0);

    harness
        .ctrl
        .set_config(FlowConfig::default().with_connection_mode(ConnectionMode::Loose));
    harness.connect_drag(from, to);
    assert_eq!(harness.tracker.connect_count(), 1);
}

#[test]
fn test_narrowing_zoom_range_reclamps() {
    let harness = FlowTestHarness::new();
    harness.ctrl.zoom_to(2.0, None);

    harness.ctrl.set_config(FlowConfig::default().with_zoom_range(0.5, 1.5));

    assert_eq!(harness.ctrl.zoom(), 1.5);
}

// ============================================================================
// Application flow
// ============================================================================

#[test]
fn test_connect_then_render_new_edge() {
    let harness = FlowTestHarness::new();
    harness.ctrl.set_edges(Vec::new());
    harness.ctrl.on_connect({
        let ctrl = harness.ctrl.clone();
        move |c| {
            let mut edges = ctrl.edges();
            edges.push(
                Edge::new(format!("{}-{}", c.source, c.target), &c.source, &c.target)
                    .with_handles(c.source_handle.as_deref(), c.target_handle.as_deref())
                    .with_label("new")
                    .animated(true),
            );
            ctrl.set_edges(edges);
        }
    });
    harness.ctrl.flush_measurements();

    let from = harness.handle_center("a", HandleRole::Source);
    let to = harness.handle_center("b", HandleRole::Target);
    harness.connect_drag(from, to);

    let frame = harness.ctrl.render();
    assert_eq!(frame.edges.len(), 1);
    assert_eq!(frame.edges[0].id, "a-b");
    assert_eq!(frame.edges[0].label.as_deref(), Some("new"));
    assert!(frame.edges[0].animated);
    assert!(harness.edge_row("a-b").is_some());
}
