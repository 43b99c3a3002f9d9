//! Handle lookup and anchor computation.

use crate::config::ConnectionMode;
use crate::geometry::{Point, Position};
use crate::types::{Handle, HandleBounds, HandleRole};

/// Where an edge attaches: an absolute graph-space point and the side it leaves from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub point: Point,
    pub side: Position,
}

/// Find the handle an edge endpoint refers to.
///
/// With a `handle_id` the handle carrying that id is returned, otherwise the
/// first handle of the role. In [`ConnectionMode::Loose`] a target lookup on
/// a node without target handles falls back to its source handles.
///
/// # Returns
/// `None` when nothing matches. The edge is then skipped for the pass.
pub fn resolve_handle<'a>(
    bounds: &'a HandleBounds,
    role: HandleRole,
    handle_id: Option<&str>,
    mode: ConnectionMode,
) -> Option<&'a Handle> {
    let candidates = match (role, mode) {
        (HandleRole::Target, ConnectionMode::Loose) if bounds.target.is_empty() => &bounds.source,
        _ => bounds.by_role(role),
    };
    match handle_id {
        Some(id) => candidates.iter().find(|h| h.id.as_deref() == Some(id)),
        None => candidates.first(),
    }
}

/// Absolute centre of `handle` on a node whose top-left corner is `node_origin`.
pub fn compute_anchor(node_origin: Point, handle: &Handle) -> Anchor {
    Anchor {
        point: Point::new(
            node_origin.x + handle.x + handle.width / 2.0,
            node_origin.y + handle.y + handle.height / 2.0,
        ),
        side: handle.side,
    }
}
