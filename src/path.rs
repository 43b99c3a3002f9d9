//! Edge routing.
//!
//! [`route`] turns two anchors into an [`EdgePath`] for one of the edge
//! styles. Routing is pure: the same anchors always give the same path, the
//! first point is exactly the source anchor and the last point exactly the
//! target anchor.

use crate::geometry::{Point, Position};
use crate::handles::Anchor;
use crate::transform::Transform;
use crate::types::EdgeType;
use std::fmt::Write;

/// Tunables shared by the routers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteOptions {
    /// Minimum distance of bezier control points from their anchor.
    pub bezier_min_offset: f32,
    /// Corner radius of smooth-step paths.
    pub border_radius: f32,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            bezier_min_offset: 50.0,
            border_radius: 5.0,
        }
    }
}

/// One drawing command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    CubicTo { c1: Point, c2: Point, to: Point },
    /// Circular arc of `radius`; `sweep` is the SVG sweep flag (clockwise on screen).
    ArcTo { radius: f32, sweep: bool, to: Point },
}

impl PathSegment {
    pub fn end_point(&self) -> Point {
        match *self {
            PathSegment::MoveTo(p) | PathSegment::LineTo(p) => p,
            PathSegment::CubicTo { to, .. } | PathSegment::ArcTo { to, .. } => to,
        }
    }
}

/// A routed edge.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgePath {
    pub segments: Vec<PathSegment>,
    /// Where a label should be centred.
    pub label: Point,
}

impl EdgePath {
    pub fn start(&self) -> Option<Point> {
        self.segments.first().map(PathSegment::end_point)
    }

    pub fn end(&self) -> Option<Point> {
        self.segments.last().map(PathSegment::end_point)
    }

    /// SVG path data, e.g. `"M 0 0 C 50 0 50 100 100 100"`.
    pub fn to_svg(&self) -> String {
        let mut out = String::with_capacity(self.segments.len() * 24);
        for segment in &self.segments {
            if !out.is_empty() {
                out.push(' ');
            }
            // Writing into a String cannot fail.
            let _ = match *segment {
                PathSegment::MoveTo(p) => write!(out, "M {} {}", p.x, p.y),
                PathSegment::LineTo(p) => write!(out, "L {} {}", p.x, p.y),
                PathSegment::CubicTo { c1, c2, to } => write!(
                    out,
                    "C {} {} {} {} {} {}",
                    c1.x, c1.y, c2.x, c2.y, to.x, to.y
                ),
                PathSegment::ArcTo { radius, sweep, to } => write!(
                    out,
                    "A {} {} 0 0 {} {} {}",
                    radius,
                    radius,
                    u8::from(sweep),
                    to.x,
                    to.y
                ),
            };
        }
        out
    }

    /// The path mapped through `transform`, e.g. from graph to screen space.
    pub fn transformed(&self, transform: &Transform) -> EdgePath {
        let map = |p: Point| transform.project(p);
        EdgePath {
            segments: self
                .segments
                .iter()
                .map(|segment| match *segment {
                    PathSegment::MoveTo(p) => PathSegment::MoveTo(map(p)),
                    PathSegment::LineTo(p) => PathSegment::LineTo(map(p)),
                    PathSegment::CubicTo { c1, c2, to } => PathSegment::CubicTo {
                        c1: map(c1),
                        c2: map(c2),
                        to: map(to),
                    },
                    PathSegment::ArcTo { radius, sweep, to } => PathSegment::ArcTo {
                        radius: radius * transform.zoom,
                        sweep,
                        to: map(to),
                    },
                })
                .collect(),
            label: map(self.label),
        }
    }

    /// Shortest distance from `point` to the path.
    ///
    /// Curves are sampled with `samples` segments; arcs are measured along
    /// their chord, which is within a fraction of the corner radius.
    pub fn distance_to(&self, point: Point, samples: usize) -> f32 {
        let mut min_dist = f32::MAX;
        let mut current = Point::ZERO;
        for segment in &self.segments {
            match *segment {
                PathSegment::MoveTo(p) => {
                    min_dist = min_dist.min(point.distance_to(p));
                    current = p;
                }
                PathSegment::LineTo(to) | PathSegment::ArcTo { to, .. } => {
                    min_dist = min_dist.min(distance_to_line_segment_sq(point, current, to).sqrt());
                    current = to;
                }
                PathSegment::CubicTo { c1, c2, to } => {
                    let bezier = CubicBezier {
                        p0: current,
                        p1: c1,
                        p2: c2,
                        p3: to,
                    };
                    min_dist = min_dist.min(distance_to_bezier(point, &bezier, samples));
                    current = to;
                }
            }
        }
        min_dist
    }
}

/// Route an edge of `edge_type` between two anchors.
pub fn route(
    edge_type: EdgeType,
    source: Anchor,
    target: Anchor,
    options: &RouteOptions,
) -> EdgePath {
    match edge_type {
        EdgeType::Straight => straight_path(source.point, target.point),
        EdgeType::Step => smooth_step_path(source, target, 0.0),
        EdgeType::SmoothStep => smooth_step_path(source, target, options.border_radius),
        EdgeType::Bezier | EdgeType::Custom(_) => {
            bezier_path(source, target, options.bezier_min_offset)
        }
    }
}

/// Route the preview line of an in-progress connection from its origin
/// handle to the pointer. The free end faces the origin.
pub fn route_connection_line(
    edge_type: EdgeType,
    from: Anchor,
    pointer: Point,
    options: &RouteOptions,
) -> EdgePath {
    let to = Anchor {
        point: pointer,
        side: opposite_side(from.side),
    };
    route(edge_type, from, to, options)
}

fn opposite_side(side: Position) -> Position {
    match side {
        Position::Top => Position::Bottom,
        Position::Bottom => Position::Top,
        Position::Left => Position::Right,
        Position::Right => Position::Left,
    }
}

pub fn straight_path(source: Point, target: Point) -> EdgePath {
    EdgePath {
        segments: vec![PathSegment::MoveTo(source), PathSegment::LineTo(target)],
        label: source.lerp(target, 0.5),
    }
}

/// Cubic curve whose control points leave each anchor along its side's
/// outward normal.
pub fn bezier_path(source: Anchor, target: Anchor, min_offset: f32) -> EdgePath {
    let bezier = CubicBezier::from_anchors(source, target, min_offset);
    let label = bezier.eval(0.5);
    EdgePath {
        segments: vec![
            PathSegment::MoveTo(bezier.p0),
            PathSegment::CubicTo {
                c1: bezier.p1,
                c2: bezier.p2,
                to: bezier.p3,
            },
        ],
        label,
    }
}

/// Orthogonal path through a corridor halfway between the anchors.
///
/// The corridor runs across the axis the source side faces: a vertical
/// corridor at mid-x for left/right sources, a horizontal one at mid-y for
/// top/bottom sources. With a positive `radius` every corner becomes a
/// quarter-round arc, clipped to half of the shorter adjacent leg.
pub fn smooth_step_path(source: Anchor, target: Anchor, radius: f32) -> EdgePath {
    let s = source.point;
    let t = target.point;
    let center = s.lerp(t, 0.5);

    let mut points = if source.side.is_horizontal() {
        vec![s, Point::new(center.x, s.y), Point::new(center.x, t.y), t]
    } else {
        vec![s, Point::new(s.x, center.y), Point::new(t.x, center.y), t]
    };
    points.dedup();

    let mut segments = Vec::with_capacity(points.len() * 2);
    segments.push(PathSegment::MoveTo(s));
    for i in 1..points.len() {
        let corner = points[i];
        let Some(&next) = points.get(i + 1) else {
            segments.push(PathSegment::LineTo(corner));
            break;
        };
        let prev = points[i - 1];
        segments.extend(corner_segments(prev, corner, next, radius));
    }

    if points.len() == 1 {
        segments.push(PathSegment::LineTo(t));
    }

    EdgePath {
        segments,
        label: center,
    }
}

fn corner_segments(prev: Point, corner: Point, next: Point, radius: f32) -> Vec<PathSegment> {
    let leg_in = prev.distance_to(corner);
    let leg_out = corner.distance_to(next);
    let r = radius.min(leg_in / 2.0).min(leg_out / 2.0);

    let d_in = (corner - prev).scaled(1.0 / leg_in);
    let d_out = (next - corner).scaled(1.0 / leg_out);
    let cross = d_in.x * d_out.y - d_in.y * d_out.x;

    if r <= 0.0 || cross.abs() < f32::EPSILON {
        return vec![PathSegment::LineTo(corner)];
    }

    let arc_start = corner - d_in.scaled(r);
    let arc_end = corner + d_out.scaled(r);
    vec![
        PathSegment::LineTo(arc_start),
        PathSegment::ArcTo {
            radius: r,
            sweep: cross > 0.0,
            to: arc_end,
        },
    ]
}

/// Cubic bezier curve used for edge paths and hit testing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub p0: Point, // Start point
    pub p1: Point, // Control point 1
    pub p2: Point, // Control point 2
    pub p3: Point, // End point
}

impl CubicBezier {
    /// Build the edge curve between two anchors.
    ///
    /// Each control point sits on its anchor's outward normal, at half the
    /// distance between the anchors along that axis, but never closer than
    /// `min_offset`.
    pub fn from_anchors(source: Anchor, target: Anchor, min_offset: f32) -> Self {
        let dx = (target.point.x - source.point.x).abs();
        let dy = (target.point.y - source.point.y).abs();
        let control = |anchor: Anchor| {
            let along = if anchor.side.is_horizontal() { dx } else { dy };
            let offset = (along * 0.5).max(min_offset);
            anchor.point + anchor.side.normal().scaled(offset)
        };
        CubicBezier {
            p0: source.point,
            p1: control(source),
            p2: control(target),
            p3: target.point,
        }
    }

    /// Evaluate the bezier curve at parameter t (0.0 to 1.0)
    pub fn eval(&self, t: f32) -> Point {
        let t2 = t * t;
        let t3 = t2 * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        let x = mt3 * self.p0.x
            + 3.0 * mt2 * t * self.p1.x
            + 3.0 * mt * t2 * self.p2.x
            + t3 * self.p3.x;
        let y = mt3 * self.p0.y
            + 3.0 * mt2 * t * self.p1.y
            + 3.0 * mt * t2 * self.p2.y
            + t3 * self.p3.y;

        Point::new(x, y)
    }
}

/// Squared distance from a point to a line segment
fn distance_to_line_segment_sq(point: Point, a: Point, b: Point) -> f32 {
    let ab = b - a;
    let ap = point - a;

    let ab_len_sq = ab.x * ab.x + ab.y * ab.y;

    if ab_len_sq < f32::EPSILON {
        // Degenerate segment (a == b)
        return ap.x * ap.x + ap.y * ap.y;
    }

    // Project point onto line, clamped to segment
    let t = ((ap.x * ab.x + ap.y * ab.y) / ab_len_sq).clamp(0.0, 1.0);
    let closest = a + ab.scaled(t);

    let d = point - closest;
    d.x * d.x + d.y * d.y
}

/// Minimum distance from a point to a cubic bezier curve
///
/// Samples the curve at regular intervals and measures against the polyline.
///
/// # Arguments
/// * `point` - The point to measure distance from
/// * `bezier` - The bezier curve
/// * `num_samples` - Number of samples (0 means the default of 20)
pub fn distance_to_bezier(point: Point, bezier: &CubicBezier, num_samples: usize) -> f32 {
    let num_samples = if num_samples == 0 { 20 } else { num_samples };

    let mut min_dist_sq = f32::MAX;
    let mut prev_point = bezier.eval(0.0);

    for i in 1..=num_samples {
        let t = i as f32 / num_samples as f32;
        let curr_point = bezier.eval(t);

        let dist_sq = distance_to_line_segment_sq(point, prev_point, curr_point);
        if dist_sq < min_dist_sq {
            min_dist_sq = dist_sq;
        }

        prev_point = curr_point;
    }

    min_dist_sq.sqrt()
}
