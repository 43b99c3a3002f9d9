//! # Slint Flow Viewport
//!
//! The viewport and geometry engine behind node-and-edge diagram editors:
//! flowcharts, pipelines, state machines, and any canvas where boxes are
//! wired together. The UI layer measures and draws; this crate owns the
//! numbers in between.
//!
//! ## Features
//!
//! - **Pan & Zoom** - Focal-point zoom, fit-to-view, zoom and translate limits
//! - **Deferred Measurement** - The UI reports node and handle sizes; they are
//!   applied at the start of the next render pass
//! - **Edge Routing** - Bezier, straight, step and smooth-step paths between
//!   resolved handle anchors, as SVG path commands
//! - **Interactions** - Connection dragging with validation, node dragging with
//!   snapping, click and rectangle selection
//! - **Minimap & Culling** - Overview projection and optional viewport culling
//!
//! ## Quick Start
//!
//! ```ignore
//! use slint_flow_viewport::{FlowConfig, FlowController, Node, Edge, Size};
//!
//! let ctrl = FlowController::new(Size::new(1024.0, 768.0), FlowConfig::default())?;
//! ctrl.set_nodes(vec![Node::new("a", 0.0, 0.0), Node::new("b", 250.0, 80.0)])?;
//! ctrl.set_edges(vec![Edge::new("a-b", "a", "b")]);
//!
//! window.on_node_size_changed(ctrl.tracker().node_size_callback());
//! window.on_handle_measured(ctrl.tracker().handle_callback());
//!
//! let frame = ctrl.render();
//! for edge in &frame.edges {
//!     println!("{}: {}", edge.id, edge.path.to_svg());
//! }
//! ```
//!
//! ## Building Blocks
//!
//! - [`TransformManager`] - Pan/zoom state and its constraints
//! - [`NodeGeometryStore`] - Node positions, nesting, measurements, z-order
//! - [`route`] / [`EdgePath`] - Edge routing
//! - [`ConnectionDrag`] - Connection drag state machine
//! - [`SelectionManager`] / [`RectangleSelection`] - Selection
//! - [`MinimapProjection`] - Overview projection
//! - [`FlowController`] - All of the above behind one cloneable handle

pub mod changes;
pub mod config;
pub mod connection;
pub mod controller;
pub mod culling;
pub mod drag;
pub mod error;
pub mod export;
pub mod geometry;
pub mod grid;
pub mod handles;
pub mod minimap;
pub mod path;
pub mod render;
pub mod selection;
pub mod store;
pub mod tracking;
pub mod transform;
pub mod types;
pub mod validation;

pub use changes::{EdgeChange, NodeChange};
pub use config::{ConnectionMode, FlowConfig, SelectionMode};
pub use connection::{
    handle_anchor, ConnectionDraft, ConnectionDrag, ConnectionOutcome, ConnectionState,
};
pub use controller::{FitViewOptions, FlowController};
pub use culling::{is_edge_visible, is_node_visible};
pub use drag::NodeDrag;
pub use error::{FlowError, FlowResult};
pub use export::FlowExportObject;
pub use geometry::{Point, Position, Rect, Size};
pub use grid::{background_commands, generate_grid_commands, BackgroundOptions, BackgroundVariant};
pub use handles::{compute_anchor, resolve_handle, Anchor};
pub use hit_test::{find_edge_at, find_handle_at, find_node_at, nodes_in_rect};
pub use minimap::{minimap_frame, MinimapFrame, MinimapOptions, MinimapProjection};
pub use path::{route, route_connection_line, EdgePath, PathSegment, RouteOptions};
pub use render::{
    render_edges, render_frame, render_nodes, route_edge, ModelBindings, RenderFrame, RenderOptions,
    RenderedEdge, RenderedNode,
};
pub use selection::{edges_between, RectangleSelection, SelectionManager, SelectionResult};
pub use store::{ElementDefaults, NodeGeometryStore, NodeInternals};
pub use tracking::{Measurement, MeasurementTracker};
pub use transform::{Transform, TransformManager};
pub use types::{Connection, Edge, EdgeType, Handle, HandleBounds, HandleRef, HandleRole, Node};
pub use validation::{
    AcceptAll, BasicConnectionValidator, CompositeValidator, ConnectionCandidate,
    ConnectionValidator, NoDuplicatesValidator, ValidationError, ValidationResult,
};
