//! Test harness around a [`FlowController`].
//!
//! Sets up a small two-node flow, wires every callback to a
//! [`CallbackTracker`], binds Slint models the way an application would, and
//! offers helpers that simulate pointer interactions in screen space.

#![allow(dead_code)]

use super::CallbackTracker;
use crossbeam_channel::Receiver;
use slint::{Model, SharedString, VecModel};
use slint_flow_viewport::{
    Edge, FlowConfig, FlowController, HandleRole, Node, Point, Rect, Size, Transform,
};
use std::rc::Rc;

pub const CONTAINER: Size = Size::new(1000.0, 800.0);
pub const NODE_WIDTH: f32 = 150.0;
pub const NODE_HEIGHT: f32 = 100.0;
const HANDLE_SIZE: f32 = 10.0;

/// Row type for the bound edge model.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeRow {
    pub id: SharedString,
    pub path: SharedString,
    pub selected: bool,
}

/// Row type for the bound node model.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeRow {
    pub id: SharedString,
    pub rect: Rect,
    pub z: i32,
    pub selected: bool,
}

pub struct FlowTestHarness {
    pub ctrl: FlowController,
    pub tracker: CallbackTracker,
    pub nodes_model: Rc<VecModel<NodeRow>>,
    pub edges_model: Rc<VecModel<EdgeRow>>,
    pub connection_line: Rc<VecModel<SharedString>>,
    transforms: Receiver<Transform>,
}

impl FlowTestHarness {
    /// Node A at (100, 100) wired to node B at (400, 200), both measured.
    pub fn new() -> Self {
        let harness = Self::with_nodes_and_edges(
            FlowConfig::default(),
            vec![Node::new("a", 100.0, 100.0), Node::new("b", 400.0, 200.0)],
            vec![Edge::new("a-b", "a", "b").with_handles(Some("out"), Some("in"))],
        );
        harness.measure_all();
        harness
    }

    /// A harness with custom content. Nothing is measured yet.
    pub fn with_nodes_and_edges(config: FlowConfig, nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let ctrl = FlowController::new(CONTAINER, config).unwrap();
        let tracker = CallbackTracker::new();

        ctrl.set_nodes(nodes).unwrap();
        ctrl.set_edges(edges);

        ctrl.on_connect({
            let tracker = tracker.clone();
            move |connection| tracker.connect.borrow_mut().push(connection.clone())
        });
        ctrl.on_connect_start({
            let tracker = tracker.clone();
            move |origin| tracker.connect_start.borrow_mut().push(origin.clone())
        });
        ctrl.on_connect_end({
            let tracker = tracker.clone();
            move |outcome| tracker.connect_end.borrow_mut().push(outcome.clone())
        });

        let nodes_model = Rc::new(VecModel::<NodeRow>::default());
        ctrl.bind_nodes(nodes_model.clone(), |id, rect, z, selected| NodeRow {
            id,
            rect,
            z,
            selected,
        });
        let edges_model = Rc::new(VecModel::<EdgeRow>::default());
        ctrl.bind_edges(edges_model.clone(), |id, path, selected, _animated| EdgeRow {
            id,
            path,
            selected,
        });
        let connection_line = Rc::new(VecModel::<SharedString>::default());
        ctrl.bind_connection_line(connection_line.clone());

        let transforms = ctrl.subscribe_transform();

        Self {
            ctrl,
            tracker,
            nodes_model,
            edges_model,
            connection_line,
            transforms,
        }
    }

    /// Report a measurement for `node_id` through the Slint-facing
    /// callbacks: a source handle "out" on the right and a target handle
    /// "in" on the left, both vertically centred.
    pub fn measure(&self, node_id: &str, width: f32, height: f32) {
        let tracker = self.ctrl.tracker();
        tracker.node_size_callback()(node_id.into(), width, height);
        let handle = tracker.handle_callback();
        let y = height / 2.0 - HANDLE_SIZE / 2.0;
        handle(
            node_id.into(),
            "out".into(),
            0,
            1,
            width - HANDLE_SIZE / 2.0,
            y,
            HANDLE_SIZE,
            HANDLE_SIZE,
        );
        handle(
            node_id.into(),
            "in".into(),
            1,
            3,
            -HANDLE_SIZE / 2.0,
            y,
            HANDLE_SIZE,
            HANDLE_SIZE,
        );
    }

    /// Measure every node at the default size.
    pub fn measure_all(&self) {
        for node in self.ctrl.nodes() {
            self.measure(&node.id, NODE_WIDTH, NODE_HEIGHT);
        }
    }

    /// Run a render pass, syncing the bound models.
    pub fn render(&self) {
        self.ctrl.render();
    }

    /// Drain transform notifications into the tracker.
    pub fn pump_transforms(&self) {
        while let Ok(t) = self.transforms.try_recv() {
            self.tracker.transforms.borrow_mut().push(t);
        }
    }

    /// Screen position of a handle centre. The node must be measured and
    /// flushed.
    pub fn handle_center(&self, node_id: &str, role: HandleRole) -> Point {
        let store = self.ctrl.store();
        let store = store.borrow();
        let node = store.get(node_id).expect("node exists");
        let rect = node.absolute_rect().expect("node measured");
        let y = rect.y + rect.height / 2.0;
        let x = match role {
            HandleRole::Source => rect.right(),
            HandleRole::Target => rect.x,
        };
        self.ctrl.unproject(Point::new(x, y))
    }

    /// Screen position of a node's centre.
    pub fn node_center(&self, node_id: &str) -> Option<Point> {
        let store = self.ctrl.store();
        let store = store.borrow();
        let rect = store.absolute_rect(node_id)?;
        Some(self.ctrl.unproject(rect.center()))
    }

    pub fn node_position(&self, node_id: &str) -> Option<Point> {
        self.ctrl.nodes().into_iter().find(|n| n.id == node_id).map(|n| n.position)
    }

    pub fn edge_row(&self, edge_id: &str) -> Option<EdgeRow> {
        self.edges_model.iter().find(|row| row.id == edge_id)
    }

    // === Pointer helpers ===

    /// Drag a connection between two screen positions.
    pub fn connect_drag(&self, from: Point, to: Point) {
        self.ctrl.connection_pointer_down(from, None);
        self.ctrl.connection_pointer_move(to, None);
        self.ctrl.connection_pointer_up();
    }

    /// Drag node `node_id` by a screen-space delta.
    pub fn node_drag(&self, node_id: &str, dx: f32, dy: f32) {
        self.ctrl.flush_measurements();
        let start = self.node_center(node_id).expect("node measured");
        self.ctrl.node_pointer_down(node_id, start, false);
        self.ctrl
            .node_pointer_move(start.offset(dx, dy))
            .expect("drag succeeds");
        self.ctrl.node_pointer_up();
    }

    /// Drag a selection rectangle between two screen positions.
    pub fn box_select(&self, from: Point, to: Point) {
        self.ctrl.flush_measurements();
        self.ctrl.selection_pointer_down(from);
        self.ctrl.selection_pointer_move(to);
        self.ctrl.selection_pointer_up();
    }
}

impl Default for FlowTestHarness {
    fn default() -> Self {
        Self::new()
    }
}
