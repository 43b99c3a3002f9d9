//! The render pass.
//!
//! [`render_frame`] reads the store once and produces everything a renderer
//! needs: positioned nodes, routed edges and the connection preview, after
//! optional viewport culling. [`ModelBindings`] pushes frames into Slint
//! models so a `.slint` UI can bind to them directly.
//!
//! # Example
//!
//! ```ignore
//! let edges_model = Rc::new(VecModel::<EdgeData>::default());
//! bindings.bind_edges(edges_model.clone(), |id, path, selected, animated| EdgeData {
//!     id,
//!     path_commands: path,
//!     selected,
//!     animated,
//! });
//! window.set_edges(ModelRc::from(edges_model));
//!
//! // After every render pass
//! bindings.sync(&frame);
//! ```

use crate::config::{ConnectionMode, FlowConfig};
use crate::connection::handle_anchor;
use crate::culling::{is_edge_visible, is_node_visible};
use crate::geometry::Rect;
use crate::path::{route, EdgePath, RouteOptions};
use crate::store::NodeGeometryStore;
use crate::transform::Transform;
use crate::types::{Edge, EdgeType, HandleRef, HandleRole};
use slint::{Model, SharedString, VecModel};
use std::rc::Rc;

/// Settings for one render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub connection_mode: ConnectionMode,
    pub only_render_visible_elements: bool,
    pub route: RouteOptions,
    pub connection_line_type: EdgeType,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from(&FlowConfig::default())
    }
}

impl From<&FlowConfig> for RenderOptions {
    fn from(config: &FlowConfig) -> Self {
        Self {
            connection_mode: config.connection_mode,
            only_render_visible_elements: config.only_render_visible_elements,
            route: RouteOptions {
                bezier_min_offset: config.bezier_min_offset,
                border_radius: config.smoothstep_border_radius,
            },
            connection_line_type: config.connection_line_type.clone(),
        }
    }
}

/// A node ready to draw, in graph space.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNode {
    pub id: String,
    pub rect: Rect,
    pub z: i32,
    pub selected: bool,
    pub dragging: bool,
    pub node_type: Option<String>,
}

/// An edge ready to draw, in graph space.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub edge_type: EdgeType,
    pub path: EdgePath,
    pub selected: bool,
    pub animated: bool,
    pub label: Option<String>,
}

/// Output of one render pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderFrame {
    pub transform: Transform,
    pub viewport: Rect,
    /// Nodes sorted by z-index, lowest first.
    pub nodes: Vec<RenderedNode>,
    pub edges: Vec<RenderedEdge>,
    pub connection_line: Option<EdgePath>,
}

/// Produce a frame from the current store contents.
pub fn render_frame(
    store: &NodeGeometryStore,
    edges: &[Edge],
    transform: Transform,
    viewport: Rect,
    connection_line: Option<EdgePath>,
    options: &RenderOptions,
) -> RenderFrame {
    let nodes = render_nodes(store, &viewport, options);
    let edges = render_edges(store, edges, &viewport, options);
    tracing::trace!(nodes = nodes.len(), edges = edges.len(), "frame rendered");
    RenderFrame {
        transform,
        viewport,
        nodes,
        edges,
        connection_line,
    }
}

/// Measured, non-hidden nodes in z order, culled when enabled.
pub fn render_nodes(
    store: &NodeGeometryStore,
    viewport: &Rect,
    options: &RenderOptions,
) -> Vec<RenderedNode> {
    store
        .iter_by_z()
        .into_iter()
        .filter(|n| !n.node.hidden)
        .filter_map(|n| {
            let rect = n.absolute_rect()?;
            if options.only_render_visible_elements && !is_node_visible(&rect, viewport) {
                return None;
            }
            Some(RenderedNode {
                id: n.id().to_owned(),
                rect,
                z: n.z,
                selected: n.node.selected,
                dragging: n.dragging,
                node_type: n.node.node_type.clone(),
            })
        })
        .collect()
}

/// Route every drawable edge.
///
/// Edges are skipped when hidden, when either endpoint is hidden or not yet
/// measured, or when a handle cannot be resolved (logged as a warning). With
/// culling on, edges outside the viewport are dropped before any handle is
/// resolved or path built.
pub fn render_edges(
    store: &NodeGeometryStore,
    edges: &[Edge],
    viewport: &Rect,
    options: &RenderOptions,
) -> Vec<RenderedEdge> {
    edges
        .iter()
        .filter(|e| !e.hidden)
        .filter_map(|edge| {
            let (source_rect, target_rect) = endpoint_rects(store, edge)?;
            if options.only_render_visible_elements
                && !is_edge_visible(&source_rect, &target_rect, viewport)
            {
                return None;
            }
            let path = route_resolved(store, edge, options)?;
            Some(RenderedEdge {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                edge_type: edge.edge_type.clone(),
                path,
                selected: edge.selected,
                animated: edge.animated,
                label: edge.label.clone(),
            })
        })
        .collect()
}

/// Route one edge regardless of the viewport.
pub fn route_edge(
    store: &NodeGeometryStore,
    edge: &Edge,
    options: &RenderOptions,
) -> Option<EdgePath> {
    endpoint_rects(store, edge)?;
    route_resolved(store, edge, options)
}

/// Bounds of both endpoint nodes, when both are known, visible and measured.
fn endpoint_rects(store: &NodeGeometryStore, edge: &Edge) -> Option<(Rect, Rect)> {
    let (Some(source), Some(target)) = (store.get(&edge.source), store.get(&edge.target)) else {
        tracing::warn!(
            edge_id = %edge.id,
            source = %edge.source,
            target = %edge.target,
            "couldn't create edge: unknown node"
        );
        return None;
    };
    if source.node.hidden || target.node.hidden {
        return None;
    }
    if !source.is_initialized() || !target.is_initialized() {
        return None;
    }
    Some((source.absolute_rect()?, target.absolute_rect()?))
}

/// Resolve both handles and build the path. Endpoints must have passed
/// [`endpoint_rects`].
fn route_resolved(
    store: &NodeGeometryStore,
    edge: &Edge,
    options: &RenderOptions,
) -> Option<EdgePath> {
    #[cfg(test)]
    tests::ROUTED.with(|count| count.set(count.get() + 1));

    let source_ref =
        HandleRef::new(&edge.source, edge.source_handle.as_deref(), HandleRole::Source);
    let Some(source_anchor) = handle_anchor(&source_ref, store, options.connection_mode) else {
        tracing::warn!(
            edge_id = %edge.id,
            handle = ?edge.source_handle,
            "couldn't create edge for source handle"
        );
        return None;
    };
    let target_ref =
        HandleRef::new(&edge.target, edge.target_handle.as_deref(), HandleRole::Target);
    let Some(target_anchor) = handle_anchor(&target_ref, store, options.connection_mode) else {
        tracing::warn!(
            edge_id = %edge.id,
            handle = ?edge.target_handle,
            "couldn't create edge for target handle"
        );
        return None;
    };

    Some(route(edge.edge_type.clone(), source_anchor, target_anchor, &options.route))
}

/// Internal trait for auto-syncing frames to Slint models.
trait ModelSyncer {
    fn sync(&self, frame: &RenderFrame);
}

struct NodeModelSyncer<P, F> {
    model: Rc<VecModel<P>>,
    constructor: F,
}

impl<P, F> ModelSyncer for NodeModelSyncer<P, F>
where
    P: Clone + 'static,
    F: Fn(SharedString, Rect, i32, bool) -> P,
{
    fn sync(&self, frame: &RenderFrame) {
        let items = frame.nodes.iter().map(|n| {
            (self.constructor)(
                SharedString::from(n.id.as_str()),
                frame.transform.project_rect(&n.rect),
                n.z,
                n.selected,
            )
        });
        sync_rows(&self.model, items);
    }
}

struct EdgeModelSyncer<P, F> {
    model: Rc<VecModel<P>>,
    constructor: F,
}

impl<P, F> ModelSyncer for EdgeModelSyncer<P, F>
where
    P: Clone + 'static,
    F: Fn(SharedString, SharedString, bool, bool) -> P,
{
    fn sync(&self, frame: &RenderFrame) {
        let items = frame.edges.iter().map(|e| {
            let path = e.path.transformed(&frame.transform).to_svg();
            (self.constructor)(
                SharedString::from(e.id.as_str()),
                SharedString::from(path.as_str()),
                e.selected,
                e.animated,
            )
        });
        sync_rows(&self.model, items);
    }
}

/// Update existing rows in place, append new ones and drop the excess.
fn sync_rows<P, I>(model: &VecModel<P>, items: I)
where
    P: Clone + 'static,
    I: Iterator<Item = P>,
{
    let mut count = 0;
    for (i, item) in items.enumerate() {
        if i < model.row_count() {
            model.set_row_data(i, item);
        } else {
            model.push(item);
        }
        count = i + 1;
    }
    while model.row_count() > count {
        model.remove(model.row_count() - 1);
    }
}

/// Slint models kept in sync with render frames.
///
/// All geometry handed to the constructors is in screen space.
#[derive(Default)]
pub struct ModelBindings {
    syncers: Vec<Box<dyn ModelSyncer>>,
    connection_line: Option<Rc<VecModel<SharedString>>>,
}

impl ModelBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a node model. The constructor receives
    /// `(id, screen_rect, z, selected)`.
    pub fn bind_nodes<P, F>(&mut self, model: Rc<VecModel<P>>, constructor: F)
    where
        P: Clone + 'static,
        F: Fn(SharedString, Rect, i32, bool) -> P + 'static,
    {
        self.syncers.push(Box::new(NodeModelSyncer { model, constructor }));
    }

    /// Bind an edge model. The constructor receives
    /// `(id, svg_path_commands, selected, animated)`.
    pub fn bind_edges<P, F>(&mut self, model: Rc<VecModel<P>>, constructor: F)
    where
        P: Clone + 'static,
        F: Fn(SharedString, SharedString, bool, bool) -> P + 'static,
    {
        self.syncers.push(Box::new(EdgeModelSyncer { model, constructor }));
    }

    /// Bind a model that holds the connection preview path while a
    /// connection is being dragged, and nothing otherwise.
    pub fn bind_connection_line(&mut self, model: Rc<VecModel<SharedString>>) {
        self.connection_line = Some(model);
    }

    pub fn is_empty(&self) -> bool {
        self.syncers.is_empty() && self.connection_line.is_none()
    }

    pub fn sync(&self, frame: &RenderFrame) {
        for syncer in &self.syncers {
            syncer.sync(frame);
        }
        if let Some(model) = &self.connection_line {
            let line = frame
                .connection_line
                .as_ref()
                .map(|p| SharedString::from(p.transformed(&frame.transform).to_svg().as_str()));
            sync_rows(model, line.into_iter());
        }
    }
}
