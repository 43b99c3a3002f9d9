//! Viewport culling.
//!
//! Both tests are inclusive: an element touching the viewport edge counts as
//! visible. Culling only decides what is drawn, never what exists.

use crate::geometry::Rect;

/// True when the node's graph-space bounds overlap the viewport.
pub fn is_node_visible(node: &Rect, viewport: &Rect) -> bool {
    node.intersects(viewport)
}

/// True when the box spanning both endpoint nodes overlaps the viewport.
///
/// This over-approximates the edge itself, so a visible edge is never culled.
pub fn is_edge_visible(source: &Rect, target: &Rect, viewport: &Rect) -> bool {
    source.union(target).intersects(viewport)
}
