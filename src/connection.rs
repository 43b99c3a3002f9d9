//! The connection drag state machine.
//!
//! ```text
//! Idle --begin--> Dragging --pointer_move--> Dragging
//!                    |--end (valid candidate)--> Completed --> Idle
//!                    |--end (no candidate) / cancel--> Cancelled --> Idle
//! ```
//!
//! The pointer is re-projected through the transform passed to every move,
//! so panning or zooming mid-drag keeps the preview line under the cursor.
//! A draft has no side effect unless it completes.

use crate::config::ConnectionMode;
use crate::geometry::Point;
use crate::handles::{compute_anchor, resolve_handle, Anchor};
use crate::path::{route_connection_line, EdgePath, RouteOptions};
use crate::store::NodeGeometryStore;
use crate::transform::Transform;
use crate::types::{Connection, EdgeType, HandleRef};
use crate::validation::{ConnectionCandidate, ConnectionValidator, ValidationResult};

/// An in-progress connection.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionDraft {
    pub origin: HandleRef,
    /// Graph-space anchor of the origin handle.
    pub origin_anchor: Anchor,
    /// Graph-space pointer position.
    pub pointer: Point,
    /// The handle currently under the pointer, with its validation result.
    pub candidate: Option<(ConnectionCandidate, ValidationResult)>,
}

impl ConnectionDraft {
    pub fn source_node_id(&self) -> &str {
        &self.origin.node_id
    }

    pub fn source_handle_id(&self) -> Option<&str> {
        self.origin.handle_id.as_deref()
    }

    /// The candidate handle, if it would produce a valid connection.
    pub fn valid_candidate(&self) -> Option<&ConnectionCandidate> {
        match &self.candidate {
            Some((candidate, result)) if result.is_valid() => Some(candidate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Dragging(ConnectionDraft),
}

/// How a drag ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionOutcome {
    Completed(Connection),
    Cancelled,
}

#[derive(Debug, Default)]
pub struct ConnectionDrag {
    state: ConnectionState,
}

impl ConnectionDrag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ConnectionState::Dragging(_))
    }

    pub fn draft(&self) -> Option<&ConnectionDraft> {
        match &self.state {
            ConnectionState::Dragging(draft) => Some(draft),
            ConnectionState::Idle => None,
        }
    }

    /// Start dragging from `origin` at screen position `screen`.
    ///
    /// Returns `false` and stays idle when the node is not connectable or
    /// the origin handle cannot be resolved.
    pub fn begin(
        &mut self,
        origin: HandleRef,
        screen: Point,
        transform: &Transform,
        store: &NodeGeometryStore,
        mode: ConnectionMode,
    ) -> bool {
        if !store.is_connectable(&origin.node_id) {
            tracing::debug!(node_id = %origin.node_id, "connection start on non-connectable node");
            return false;
        }
        let Some(anchor) = handle_anchor(&origin, store, mode) else {
            tracing::debug!(node_id = %origin.node_id, "connection start on unresolved handle");
            return false;
        };
        tracing::debug!(
            node_id = %origin.node_id,
            handle = ?origin.handle_id,
            "connection drag started"
        );
        self.state = ConnectionState::Dragging(ConnectionDraft {
            origin,
            origin_anchor: anchor,
            pointer: transform.unproject(screen),
            candidate: None,
        });
        true
    }

    /// Track the pointer and re-evaluate the handle under it.
    pub fn pointer_move(
        &mut self,
        screen: Point,
        transform: &Transform,
        hovered: Option<HandleRef>,
        store: &NodeGeometryStore,
        validator: &dyn ConnectionValidator,
    ) {
        let ConnectionState::Dragging(draft) = &mut self.state else {
            return;
        };
        draft.pointer = transform.unproject(screen);
        draft.candidate = hovered.map(|hovered| {
            let candidate = ConnectionCandidate::new(draft.origin.clone(), hovered);
            let result = validator.validate(&candidate, store);
            (candidate, result)
        });
    }

    /// Release the pointer. Completes when the last evaluated candidate is
    /// valid, otherwise cancels. Always returns to idle.
    pub fn end(&mut self) -> ConnectionOutcome {
        let outcome = match std::mem::take(&mut self.state) {
            ConnectionState::Dragging(draft) => match draft.valid_candidate() {
                Some(candidate) => ConnectionOutcome::Completed(candidate.connection.clone()),
                None => ConnectionOutcome::Cancelled,
            },
            ConnectionState::Idle => ConnectionOutcome::Cancelled,
        };
        tracing::debug!(?outcome, "connection drag ended");
        outcome
    }

    pub fn cancel(&mut self) {
        if self.is_active() {
            tracing::debug!("connection drag cancelled");
        }
        self.state = ConnectionState::Idle;
    }

    /// Preview path from the origin handle to the pointer.
    pub fn connection_line(&self, edge_type: EdgeType, options: &RouteOptions) -> Option<EdgePath> {
        self.draft()
            .map(|d| route_connection_line(edge_type, d.origin_anchor, d.pointer, options))
    }
}

/// Absolute anchor of a referenced handle, if the node is measured and the
/// handle resolves.
pub fn handle_anchor(
    handle: &HandleRef,
    store: &NodeGeometryStore,
    mode: ConnectionMode,
) -> Option<Anchor> {
    let internals = store.get(&handle.node_id)?;
    let bounds = internals.handle_bounds.as_ref()?;
    let resolved = resolve_handle(bounds, handle.role, handle.handle_id.as_deref(), mode)?;
    Some(compute_anchor(internals.absolute_position, resolved))
}
