//! High-level controller for flow viewport applications.
//!
//! [`FlowController`] owns the transform, the node geometry store, the edge
//! list and every interaction state machine, and exposes them through one
//! cloneable handle that can be moved into Slint callbacks.
//!
//! # Example
//!
//! ```ignore
//! use slint_flow_viewport::{FlowConfig, FlowController, Size};
//!
//! let window = MainWindow::new()?;
//! let ctrl = FlowController::new(Size::new(1024.0, 768.0), FlowConfig::default())?;
//!
//! // Measurements from the UI
//! let tracker = ctrl.tracker();
//! window.on_node_size_changed(tracker.node_size_callback());
//! window.on_handle_measured(tracker.handle_callback());
//!
//! // Connections
//! ctrl.on_connect({
//!     let ctrl = ctrl.clone();
//!     move |connection| {
//!         let mut edges = ctrl.edges();
//!         let id = format!("e{}", edges.len());
//!         edges.push(Edge::new(id, &connection.source, &connection.target));
//!         ctrl.set_edges(edges);
//!     }
//! });
//!
//! window.on_handle_pointer_down({
//!     let ctrl = ctrl.clone();
//!     move |x, y| { ctrl.connection_pointer_down(Point::new(x, y), None); }
//! });
//!
//! // Redraw
//! ctrl.bind_edges(edges_model.clone(), |id, path, selected, animated| EdgeData {
//!     id,
//!     path,
//!     selected,
//!     animated,
//! });
//! ctrl.render();
//! ```

use crate::changes::{EdgeChange, NodeChange, Publisher};
use crate::config::FlowConfig;
use crate::connection::{ConnectionDraft, ConnectionDrag, ConnectionOutcome};
use crate::drag::NodeDrag;
use crate::error::FlowResult;
use crate::export::FlowExportObject;
use crate::geometry::{Point, Rect, Size};
use crate::grid::{background_commands, BackgroundOptions};
use crate::hit_test::{find_edge_at, find_handle_at};
use crate::minimap::{minimap_frame, MinimapFrame, MinimapOptions};
use crate::render::{render_frame, route_edge, ModelBindings, RenderFrame, RenderOptions};
use crate::selection::{RectangleSelection, SelectionManager, SelectionResult};
use crate::store::{ElementDefaults, NodeGeometryStore};
use crate::tracking::MeasurementTracker;
use crate::transform::{Transform, TransformManager};
use crate::types::{Connection, Edge, HandleRef, Node};
use crate::validation::{
    AcceptAll, BasicConnectionValidator, ConnectionCandidate, ConnectionValidator, ValidationResult,
};
use crossbeam_channel::Receiver;
use slint::{SharedString, VecModel};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// Sampling resolution for edge hit testing.
const EDGE_HIT_SAMPLES: usize = 20;

/// Options for [`FlowController::fit_view`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitViewOptions {
    /// Fraction of the node bounds added on every side.
    pub padding: f32,
    pub include_hidden: bool,
    /// Narrower zoom range for this fit only.
    pub min_zoom: Option<f32>,
    pub max_zoom: Option<f32>,
}

impl Default for FitViewOptions {
    fn default() -> Self {
        Self {
            padding: 0.1,
            include_hidden: false,
            min_zoom: None,
            max_zoom: None,
        }
    }
}

#[derive(Default)]
struct Callbacks {
    on_connect: Option<Rc<dyn Fn(&Connection)>>,
    on_connect_start: Option<Rc<dyn Fn(&HandleRef)>>,
    on_connect_end: Option<Rc<dyn Fn(&ConnectionOutcome)>>,
}

/// Built-in rules first, then the host's validator.
struct EffectiveValidator<'a> {
    basic: BasicConnectionValidator,
    host: &'a dyn ConnectionValidator,
}

impl ConnectionValidator for EffectiveValidator<'_> {
    fn validate(
        &self,
        candidate: &ConnectionCandidate,
        store: &NodeGeometryStore,
    ) -> ValidationResult {
        let result = self.basic.validate(candidate, store);
        if !result.is_valid() {
            return result;
        }
        self.host.validate(candidate, store)
    }
}

/// Controller that owns viewport state and implements the interactions.
///
/// Clone this controller to share it across callbacks. Host callbacks are
/// always invoked after internal borrows are released, so they may call back
/// into the controller.
#[derive(Clone)]
pub struct FlowController {
    config: Rc<RefCell<FlowConfig>>,
    transforms: Rc<RefCell<TransformManager>>,
    store: Rc<RefCell<NodeGeometryStore>>,
    edges: Rc<RefCell<Vec<Edge>>>,
    tracker: MeasurementTracker,
    connection: Rc<RefCell<ConnectionDrag>>,
    node_drag: Rc<RefCell<Option<NodeDrag>>>,
    rectangle: Rc<RefCell<Option<RectangleSelection>>>,
    validator: Rc<RefCell<Box<dyn ConnectionValidator>>>,
    bindings: Rc<RefCell<ModelBindings>>,
    callbacks: Rc<RefCell<Callbacks>>,
    edge_changes: Rc<RefCell<Publisher<EdgeChange>>>,
}

impl FlowController {
    /// Create a controller for a container of the given screen size.
    ///
    /// # Errors
    /// [`crate::FlowError::ZeroSizedContainer`] when the container has no area.
    pub fn new(container: Size, config: FlowConfig) -> FlowResult<Self> {
        let transforms = TransformManager::new(container, &config)?;
        let store = NodeGeometryStore::new(ElementDefaults::from(&config));
        Ok(Self {
            config: Rc::new(RefCell::new(config)),
            transforms: Rc::new(RefCell::new(transforms)),
            store: Rc::new(RefCell::new(store)),
            edges: Rc::new(RefCell::new(Vec::new())),
            tracker: MeasurementTracker::new(),
            connection: Rc::new(RefCell::new(ConnectionDrag::new())),
            node_drag: Rc::new(RefCell::new(None)),
            rectangle: Rc::new(RefCell::new(None)),
            validator: Rc::new(RefCell::new(Box::new(AcceptAll))),
            bindings: Rc::new(RefCell::new(ModelBindings::new())),
            callbacks: Rc::new(RefCell::new(Callbacks::default())),
            edge_changes: Rc::new(RefCell::new(Publisher::new())),
        })
    }

    pub fn config(&self) -> FlowConfig {
        self.config.borrow().clone()
    }

    /// Replace the configuration. Zoom range and extents are re-applied to
    /// the current transform.
    pub fn set_config(&self, config: FlowConfig) {
        {
            let mut transforms = self.transforms.borrow_mut();
            transforms.set_max_zoom(f32::MAX);
            transforms.set_min_zoom(config.min_zoom);
            transforms.set_max_zoom(config.max_zoom);
            transforms.set_extent_constraints(config.translate_extent, config.node_extent);
        }
        self.store.borrow_mut().set_defaults(ElementDefaults::from(&config));
        *self.config.borrow_mut() = config;
    }

    /// The measurement queue. Wire its callbacks to the UI.
    pub fn tracker(&self) -> MeasurementTracker {
        self.tracker.clone()
    }

    /// Get access to the node geometry store.
    pub fn store(&self) -> Rc<RefCell<NodeGeometryStore>> {
        self.store.clone()
    }

    // === Transform ===

    pub fn transform(&self) -> Transform {
        self.transforms.borrow().transform()
    }

    pub fn set_transform(&self, transform: Transform) -> Transform {
        self.transforms.borrow_mut().set_transform(transform)
    }

    pub fn zoom(&self) -> f32 {
        self.transforms.borrow().zoom()
    }

    /// Screen space to graph space.
    pub fn project(&self, screen: Point) -> Point {
        self.transforms.borrow().unproject(screen)
    }

    /// Graph space to screen space.
    pub fn unproject(&self, graph: Point) -> Point {
        self.transforms.borrow().project(graph)
    }

    pub fn pan(&self, dx: f32, dy: f32) -> Transform {
        self.transforms.borrow_mut().pan(dx, dy)
    }

    pub fn zoom_by(&self, factor: f32, focal: Point) -> Transform {
        self.transforms.borrow_mut().zoom_by(factor, focal)
    }

    pub fn zoom_to(&self, zoom: f32, focal: Option<Point>) -> Transform {
        self.transforms.borrow_mut().zoom_to(zoom, focal)
    }

    pub fn zoom_in(&self) -> Transform {
        self.transforms.borrow_mut().zoom_in()
    }

    pub fn zoom_out(&self) -> Transform {
        self.transforms.borrow_mut().zoom_out()
    }

    /// Fit the node bounds into the container.
    ///
    /// Returns `None` without touching the transform when there are no
    /// measured nodes.
    pub fn fit_view(&self, options: &FitViewOptions) -> Option<Transform> {
        self.flush_measurements();
        let bounds = self.store.borrow().nodes_bounds(options.include_hidden)?;
        let mut transforms = self.transforms.borrow_mut();
        let fitted = transforms.fit_bounds(bounds, options.padding);
        let min = options.min_zoom.unwrap_or(f32::MIN);
        let max = options.max_zoom.unwrap_or(f32::MAX).max(min);
        let zoom = fitted.zoom.clamp(min, max);
        if zoom == fitted.zoom {
            return Some(fitted);
        }
        let center = bounds.center();
        Some(transforms.set_center(center.x, center.y, Some(zoom)))
    }

    pub fn fit_bounds(&self, bounds: Rect, padding: f32) -> Transform {
        self.transforms.borrow_mut().fit_bounds(bounds, padding)
    }

    pub fn set_center(&self, x: f32, y: f32, zoom: Option<f32>) -> Transform {
        self.transforms.borrow_mut().set_center(x, y, zoom)
    }

    pub fn set_container_size(&self, container: Size) -> FlowResult<()> {
        self.transforms.borrow_mut().set_container_size(container)
    }

    /// The graph-space rectangle currently visible.
    pub fn viewport_rect(&self) -> Rect {
        self.transforms.borrow().viewport_rect()
    }

    pub fn subscribe_transform(&self) -> Receiver<Transform> {
        self.transforms.borrow_mut().subscribe()
    }

    // === Nodes and edges ===

    /// Replace the nodes. Measurements survive for ids that persist.
    ///
    /// # Errors
    /// Duplicate ids, unknown parents and parent cycles are rejected and
    /// leave the current nodes untouched.
    pub fn set_nodes(&self, nodes: Vec<Node>) -> FlowResult<()> {
        self.store.borrow_mut().upsert_nodes(nodes)
    }

    /// Current nodes, with positions after any drag and measured sizes.
    pub fn nodes(&self) -> Vec<Node> {
        self.store.borrow().nodes()
    }

    pub fn set_edges(&self, edges: Vec<Edge>) {
        tracing::debug!(count = edges.len(), "edges updated");
        *self.edges.borrow_mut() = edges;
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.edges.borrow().clone()
    }

    pub fn subscribe_node_changes(&self) -> Receiver<NodeChange> {
        self.store.borrow_mut().subscribe()
    }

    pub fn subscribe_edge_changes(&self) -> Receiver<EdgeChange> {
        self.edge_changes.borrow_mut().subscribe()
    }

    /// Apply queued measurements now. Returns how many nodes were updated.
    pub fn flush_measurements(&self) -> usize {
        self.tracker.flush(&mut self.store.borrow_mut())
    }

    pub fn to_object(&self) -> FlowExportObject {
        FlowExportObject::new(self.nodes(), self.edges(), self.transform())
    }

    /// Restore nodes, edges and transform from an export.
    pub fn from_object(&self, object: FlowExportObject) -> FlowResult<()> {
        let transform = object.transform();
        self.set_nodes(object.nodes)?;
        self.set_edges(object.edges);
        self.set_transform(transform);
        Ok(())
    }

    // === Rendering ===

    /// Bind a node model kept in sync by [`FlowController::render`].
    pub fn bind_nodes<P, F>(&self, model: Rc<VecModel<P>>, constructor: F)
    where
        P: Clone + 'static,
        F: Fn(SharedString, Rect, i32, bool) -> P + 'static,
    {
        self.bindings.borrow_mut().bind_nodes(model, constructor);
    }

    /// Bind an edge model kept in sync by [`FlowController::render`].
    pub fn bind_edges<P, F>(&self, model: Rc<VecModel<P>>, constructor: F)
    where
        P: Clone + 'static,
        F: Fn(SharedString, SharedString, bool, bool) -> P + 'static,
    {
        self.bindings.borrow_mut().bind_edges(model, constructor);
    }

    pub fn bind_connection_line(&self, model: Rc<VecModel<SharedString>>) {
        self.bindings.borrow_mut().bind_connection_line(model);
    }

    /// Run a render pass: apply queued measurements, route edges, cull, and
    /// push the result into any bound models.
    pub fn render(&self) -> RenderFrame {
        self.flush_measurements();
        let config = self.config.borrow();
        let options = RenderOptions::from(&*config);
        let (transform, viewport) = {
            let transforms = self.transforms.borrow();
            (transforms.transform(), transforms.viewport_rect())
        };
        let connection_line = self
            .connection
            .borrow()
            .connection_line(config.connection_line_type.clone(), &options.route);
        let frame = render_frame(
            &self.store.borrow(),
            &self.edges.borrow(),
            transform,
            viewport,
            connection_line,
            &options,
        );
        self.bindings.borrow().sync(&frame);
        frame
    }

    pub fn minimap(&self, options: &MinimapOptions) -> MinimapFrame {
        self.flush_measurements();
        let viewport = self.viewport_rect();
        minimap_frame(&self.store.borrow(), viewport, options)
    }

    /// SVG commands for the background pattern at the current transform.
    pub fn background(&self, options: &BackgroundOptions) -> SharedString {
        let transforms = self.transforms.borrow();
        background_commands(transforms.container_size(), &transforms.transform(), options).into()
    }

    /// Find the edge under a screen-space position.
    pub fn edge_at(&self, screen: Point, hover_distance: f32) -> Option<String> {
        let options = RenderOptions::from(&*self.config.borrow());
        let transform = self.transform();
        let point = transform.unproject(screen);
        let store = self.store.borrow();
        let edges = self.edges.borrow();
        let paths: Vec<_> = edges
            .iter()
            .filter(|e| !e.hidden)
            .filter_map(|e| route_edge(&store, e, &options).map(|path| (e.id.as_str(), path)))
            .collect();
        find_edge_at(
            point,
            paths.iter().map(|(id, path)| (*id, path)),
            hover_distance / transform.zoom,
            EDGE_HIT_SAMPLES,
        )
    }

    // === Connections ===

    /// Set the host validity predicate, checked after the built-in rules.
    pub fn set_validator<V: ConnectionValidator + 'static>(&self, validator: V) {
        *self.validator.borrow_mut() = Box::new(validator);
    }

    pub fn on_connect(&self, callback: impl Fn(&Connection) + 'static) {
        self.callbacks.borrow_mut().on_connect = Some(Rc::new(callback));
    }

    pub fn on_connect_start(&self, callback: impl Fn(&HandleRef) + 'static) {
        self.callbacks.borrow_mut().on_connect_start = Some(Rc::new(callback));
    }

    pub fn on_connect_end(&self, callback: impl Fn(&ConnectionOutcome) + 'static) {
        self.callbacks.borrow_mut().on_connect_end = Some(Rc::new(callback));
    }

    pub fn is_connecting(&self) -> bool {
        self.connection.borrow().is_active()
    }

    pub fn connection_draft(&self) -> Option<ConnectionDraft> {
        self.connection.borrow().draft().cloned()
    }

    /// Handle under a screen-space position, within `connection_radius`
    /// screen pixels.
    pub fn handle_at(&self, screen: Point) -> Option<HandleRef> {
        let transform = self.transform();
        let radius = self.config.borrow().connection_radius / transform.zoom;
        find_handle_at(&self.store.borrow(), transform.unproject(screen), radius)
    }

    /// Pointer down for a connection drag. When `handle` is `None` the
    /// handle under the pointer is used.
    ///
    /// Returns `true` when a drag started.
    pub fn connection_pointer_down(&self, screen: Point, handle: Option<HandleRef>) -> bool {
        let Some(origin) = handle.or_else(|| self.handle_at(screen)) else {
            return false;
        };
        let started = {
            let mode = self.config.borrow().connection_mode;
            let transform = self.transform();
            self.connection
                .borrow_mut()
                .begin(origin.clone(), screen, &transform, &self.store.borrow(), mode)
        };
        if started {
            let callback = self.callbacks.borrow().on_connect_start.clone();
            if let Some(callback) = callback {
                callback(&origin);
            }
        }
        started
    }

    /// Pointer move during a connection drag. When `hovered` is `None` the
    /// handle under the pointer is hit-tested.
    pub fn connection_pointer_move(&self, screen: Point, hovered: Option<HandleRef>) {
        if !self.is_connecting() {
            return;
        }
        let hovered = hovered.or_else(|| self.handle_at(screen));
        let transform = self.transform();
        let basic = BasicConnectionValidator::from(&*self.config.borrow());
        let host = self.validator.borrow();
        let validator = EffectiveValidator {
            basic,
            host: host.as_ref(),
        };
        self.connection.borrow_mut().pointer_move(
            screen,
            &transform,
            hovered,
            &self.store.borrow(),
            &validator,
        );
    }

    /// Pointer up ends the drag. Returns the connection when one was made.
    pub fn connection_pointer_up(&self) -> Option<Connection> {
        if !self.is_connecting() {
            return None;
        }
        let outcome = self.connection.borrow_mut().end();
        let (on_connect, on_end) = {
            let callbacks = self.callbacks.borrow();
            (callbacks.on_connect.clone(), callbacks.on_connect_end.clone())
        };
        let connection = match &outcome {
            ConnectionOutcome::Completed(connection) => {
                if let Some(callback) = on_connect {
                    callback(connection);
                }
                Some(connection.clone())
            }
            ConnectionOutcome::Cancelled => None,
        };
        if let Some(callback) = on_end {
            callback(&outcome);
        }
        connection
    }

    /// Abort a connection drag without emitting a connection.
    pub fn cancel_connection(&self) {
        if !self.is_connecting() {
            return;
        }
        self.connection.borrow_mut().cancel();
        let on_end = self.callbacks.borrow().on_connect_end.clone();
        if let Some(callback) = on_end {
            callback(&ConnectionOutcome::Cancelled);
        }
    }

    // === Node drag ===

    /// Pointer down on a node. Applies click selection and starts dragging
    /// the node, or the whole selection when the node is part of it.
    ///
    /// Returns `true` when a drag started.
    pub fn node_pointer_down(&self, node_id: &str, screen: Point, multi_select: bool) -> bool {
        let already_selected = self.store.borrow().get(node_id).is_some_and(|n| n.node.selected);
        if !already_selected || multi_select {
            self.select_node(node_id, multi_select);
        }

        let ids = {
            let store = self.store.borrow();
            match store.get(node_id) {
                Some(n) if n.node.selected => selected_ids(&store),
                Some(_) => vec![node_id.to_owned()],
                None => return false,
            }
        };
        let pointer = self.project(screen);
        let drag = NodeDrag::begin(&mut self.store.borrow_mut(), ids, pointer);
        let started = drag.is_some();
        *self.node_drag.borrow_mut() = drag;
        started
    }

    /// Pointer move during a node drag. Returns the new absolute positions.
    pub fn node_pointer_move(&self, screen: Point) -> FlowResult<Vec<(String, Point)>> {
        let drag = self.node_drag.borrow();
        let Some(drag) = drag.as_ref() else {
            return Ok(Vec::new());
        };
        let (snap, extent) = {
            let config = self.config.borrow();
            (config.snap_to_grid.then_some(config.snap_grid), config.node_extent)
        };
        let pointer = self.project(screen);
        drag.update(&mut self.store.borrow_mut(), pointer, snap, extent)
    }

    pub fn node_pointer_up(&self) {
        let drag = self.node_drag.borrow_mut().take();
        if let Some(drag) = drag {
            drag.end(&mut self.store.borrow_mut());
        }
    }

    pub fn is_dragging_nodes(&self) -> bool {
        self.node_drag.borrow().is_some()
    }

    // === Selection ===

    pub fn selected_nodes(&self) -> Vec<String> {
        selected_ids(&self.store.borrow())
    }

    pub fn selected_edges(&self) -> Vec<String> {
        self.edges
            .borrow()
            .iter()
            .filter(|e| e.selected)
            .map(|e| e.id.clone())
            .collect()
    }

    /// Click selection of a node: toggle with `multi_select`, otherwise
    /// replace the selection (edges included).
    ///
    /// A node's own `selectable` flag overrides `elements_selectable`.
    pub fn select_node(&self, node_id: &str, multi_select: bool) -> bool {
        if !self.store.borrow().is_selectable(node_id) {
            return false;
        }
        let mut selection = SelectionManager::new();
        selection.replace_selection(self.selected_nodes());
        selection.handle_interaction(node_id, multi_select);
        if !multi_select {
            self.apply_edge_selection(&HashSet::new());
        }
        self.apply_node_selection(&selection.iter().collect());
        true
    }

    /// Click selection of an edge, with the same rules as nodes.
    pub fn select_edge(&self, edge_id: &str, multi_select: bool) -> bool {
        if !self.config.borrow().elements_selectable {
            return false;
        }
        let mut selection = SelectionManager::new();
        selection.replace_selection(self.selected_edges());
        selection.handle_interaction(edge_id, multi_select);
        if !multi_select {
            self.apply_node_selection(&HashSet::new());
        }
        self.apply_edge_selection(&selection.iter().collect());
        true
    }

    /// Add nodes to the selection without touching the rest.
    pub fn add_selected_nodes<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selection = SelectionManager::new();
        selection.replace_selection(self.selected_nodes());
        let store = self.store.borrow();
        selection.add(
            ids.into_iter()
                .map(Into::into)
                .filter(|id: &String| store.is_selectable(id)),
        );
        drop(store);
        self.apply_node_selection(&selection.iter().collect());
    }

    /// Deselect every node and edge.
    pub fn reset_selected_elements(&self) {
        self.apply_node_selection(&HashSet::new());
        self.apply_edge_selection(&HashSet::new());
    }

    /// Pointer down on empty canvas: begins a selection rectangle. Only
    /// selectable nodes are picked up by it.
    pub fn selection_pointer_down(&self, screen: Point) {
        *self.rectangle.borrow_mut() = Some(RectangleSelection::new(screen));
    }

    /// Grow the selection rectangle and reselect from scratch.
    pub fn selection_pointer_move(&self, screen: Point) -> SelectionResult {
        let rectangle = {
            let mut rectangle = self.rectangle.borrow_mut();
            let Some(rectangle) = rectangle.as_mut() else {
                return SelectionResult::default();
            };
            rectangle.update(screen);
            *rectangle
        };
        let mode = self.config.borrow().selection_mode;
        let result = rectangle.select(
            &self.transform(),
            &self.store.borrow(),
            &self.edges.borrow(),
            mode,
        );
        self.apply_node_selection(&result.nodes.iter().map(String::as_str).collect());
        self.apply_edge_selection(&result.edges.iter().map(String::as_str).collect());
        result
    }

    pub fn selection_pointer_up(&self) {
        self.rectangle.borrow_mut().take();
    }

    /// The selection rectangle in screen space while one is being dragged.
    pub fn selection_rect(&self) -> Option<Rect> {
        self.rectangle.borrow().as_ref().map(RectangleSelection::screen_rect)
    }

    fn apply_node_selection(&self, selected: &HashSet<&str>) {
        let mut store = self.store.borrow_mut();
        let ids: Vec<String> = store.iter().map(|n| n.id().to_owned()).collect();
        let mut changed = false;
        for id in ids {
            changed |= store.set_selected(&id, selected.contains(id.as_str()));
        }
        if changed {
            store.compute_z_index();
        }
    }

    fn apply_edge_selection(&self, selected: &HashSet<&str>) {
        let mut events = Vec::new();
        for edge in self.edges.borrow_mut().iter_mut() {
            let is_selected = selected.contains(edge.id.as_str());
            if edge.selected != is_selected {
                edge.selected = is_selected;
                events.push(EdgeChange::Select {
                    id: edge.id.clone(),
                    selected: is_selected,
                });
            }
        }
        self.edge_changes.borrow_mut().publish_all(events);
    }
}

fn selected_ids(store: &NodeGeometryStore) -> Vec<String> {
    store
        .iter()
        .filter(|n| n.node.selected)
        .map(|n| n.id().to_owned())
        .collect()
}
