//! Minimap projection.
//!
//! The overview shows the union of all node bounds and the current viewport,
//! scaled uniformly to fit the overview and centred in it. Node rectangles
//! and the viewport outline go through the same projection.

use crate::geometry::{Point, Rect, Size};
use crate::store::NodeGeometryStore;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinimapOptions {
    pub width: f32,
    pub height: f32,
    /// Empty border around the content, in overview pixels.
    pub margin: f32,
}

impl Default for MinimapOptions {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 150.0,
            margin: 0.0,
        }
    }
}

/// Maps graph space into overview pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimapProjection {
    /// Graph units per overview pixel.
    pub scale: f32,
    /// Graph point shown at overview pixel (0, 0).
    pub origin: Point,
    /// The graph-space box the overview was fitted to.
    pub bounds: Rect,
    pub size: Size,
}

impl MinimapProjection {
    /// Fit `nodes_bounds` (if any) together with `viewport` into the overview.
    pub fn new(nodes_bounds: Option<Rect>, viewport: Rect, options: &MinimapOptions) -> Self {
        let bounds = match nodes_bounds {
            Some(nodes) => nodes.union(&viewport),
            None => viewport,
        };
        let inner_w = (options.width - 2.0 * options.margin).max(1.0);
        let inner_h = (options.height - 2.0 * options.margin).max(1.0);
        let scale = (bounds.width / inner_w).max(bounds.height / inner_h).max(f32::MIN_POSITIVE);

        let center = bounds.center();
        let origin = Point::new(
            center.x - options.width / 2.0 * scale,
            center.y - options.height / 2.0 * scale,
        );
        Self {
            scale,
            origin,
            bounds,
            size: Size::new(options.width, options.height),
        }
    }

    pub fn project_point(&self, p: Point) -> Point {
        Point::new((p.x - self.origin.x) / self.scale, (p.y - self.origin.y) / self.scale)
    }

    pub fn project_rect(&self, r: &Rect) -> Rect {
        let origin = self.project_point(r.origin());
        Rect::new(origin.x, origin.y, r.width / self.scale, r.height / self.scale)
    }

    /// Overview pixel back to graph space, e.g. to pan by clicking the minimap.
    pub fn unproject_point(&self, p: Point) -> Point {
        Point::new(p.x * self.scale + self.origin.x, p.y * self.scale + self.origin.y)
    }
}

/// Everything a minimap draws, already in overview pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimapFrame {
    pub projection: MinimapProjection,
    pub nodes: Vec<(String, Rect)>,
    pub viewport: Rect,
}

/// Project all visible, measured nodes and the viewport outline.
pub fn minimap_frame(
    store: &NodeGeometryStore,
    viewport: Rect,
    options: &MinimapOptions,
) -> MinimapFrame {
    let projection = MinimapProjection::new(store.nodes_bounds(false), viewport, options);
    let nodes = store
        .iter()
        .filter(|n| !n.node.hidden)
        .filter_map(|n| {
            n.absolute_rect()
                .map(|r| (n.id().to_owned(), projection.project_rect(&r)))
        })
        .collect();
    MinimapFrame {
        projection,
        nodes,
        viewport: projection.project_rect(&viewport),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Node;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_scale_is_max_ratio_and_content_is_centered() {
        let nodes = Rect::new(0.0, 0.0, 1000.0, 1000.0);
        let viewport = Rect::new(100.0, 100.0, 400.0, 300.0);
        let projection = MinimapProjection::new(Some(nodes), viewport, &MinimapOptions::default());

        assert!(approx(projection.scale, 1000.0 / 150.0));
        let center = projection.project_point(Point::new(500.0, 500.0));
        assert!(approx(center.x, 100.0));
        assert!(approx(center.y, 75.0));
    }

    #[test]
    fn test_viewport_only_when_no_nodes() {
        let viewport = Rect::new(0.0, 0.0, 800.0, 600.0);
        let projection = MinimapProjection::new(None, viewport, &MinimapOptions::default());
        assert!(approx(projection.scale, 4.0));
        let r = projection.project_rect(&viewport);
        assert!(approx(r.x, 0.0));
        assert!(approx(r.width, 200.0));
        assert!(approx(r.height, 150.0));
    }

    #[test]
    fn test_margin_shrinks_content() {
        let viewport = Rect::new(0.0, 0.0, 800.0, 600.0);
        let options = MinimapOptions {
            margin: 10.0,
            ..MinimapOptions::default()
        };
        let projection = MinimapProjection::new(None, viewport, &options);
        let r = projection.project_rect(&viewport);
        assert!(r.x >= 10.0 - 1e-3);
        assert!(r.right() <= 190.0 + 1e-3);
    }

    #[test]
    fn test_unproject_inverts_project() {
        let projection = MinimapProjection::new(
            Some(Rect::new(-300.0, 50.0, 900.0, 200.0)),
            Rect::new(0.0, 0.0, 400.0, 300.0),
            &MinimapOptions::default(),
        );
        let p = Point::new(123.0, -45.0);
        let back = projection.unproject_point(projection.project_point(p));
        assert!(approx(back.x, p.x));
        assert!(approx(back.y, p.y));
    }

    #[test]
    fn test_frame_projects_measured_nodes() {
        let mut store = NodeGeometryStore::default();
        store
            .upsert_nodes(vec![
                Node::new("a", 0.0, 0.0),
                Node::new("unmeasured", 50.0, 50.0),
                Node::new("hidden", 10.0, 10.0).hidden(true),
            ])
            .unwrap();
        store.report_measurement("a", Size::new(400.0, 300.0), vec![]);
        store.report_measurement("hidden", Size::new(10.0, 10.0), vec![]);

        let viewport = Rect::new(0.0, 0.0, 400.0, 300.0);
        let frame = minimap_frame(&store, viewport, &MinimapOptions::default());
        assert_eq!(frame.nodes.len(), 1);
        assert_eq!(frame.nodes[0].0, "a");
        assert_eq!(frame.nodes[0].1, frame.viewport);
    }
}
