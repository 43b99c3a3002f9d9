//! Pan/zoom state of the canvas.
//!
//! A [`Transform`] maps graph space to screen space:
//! `screen = graph * zoom + (x, y)`. The [`TransformManager`] owns the
//! current transform and enforces the zoom range and the optional
//! translate extent. Every accepted change is pushed to subscribers.
//!
//! # Example
//!
//! ```ignore
//! let mut transforms = TransformManager::new(Size::new(800.0, 600.0), &FlowConfig::default())?;
//! let rx = transforms.subscribe();
//!
//! transforms.pan(40.0, 0.0);
//! transforms.zoom_by(1.5, Point::new(400.0, 300.0));
//!
//! while let Ok(t) = rx.try_recv() {
//!     window.set_transform(t.x, t.y, t.zoom);
//! }
//! ```

use crate::changes::Publisher;
use crate::config::FlowConfig;
use crate::error::{FlowError, FlowResult};
use crate::geometry::{Point, Rect, Size};
use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};

/// Translation and scale of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    pub zoom: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        x: 0.0,
        y: 0.0,
        zoom: 1.0,
    };

    pub const fn new(x: f32, y: f32, zoom: f32) -> Self {
        Self { x, y, zoom }
    }

    /// Graph space to screen space.
    pub fn project(&self, p: Point) -> Point {
        Point::new(p.x * self.zoom + self.x, p.y * self.zoom + self.y)
    }

    /// Screen space to graph space.
    pub fn unproject(&self, p: Point) -> Point {
        Point::new((p.x - self.x) / self.zoom, (p.y - self.y) / self.zoom)
    }

    pub fn project_rect(&self, r: &Rect) -> Rect {
        let origin = self.project(r.origin());
        Rect::new(origin.x, origin.y, r.width * self.zoom, r.height * self.zoom)
    }

    pub fn unproject_rect(&self, r: &Rect) -> Rect {
        let origin = self.unproject(r.origin());
        Rect::new(origin.x, origin.y, r.width / self.zoom, r.height / self.zoom)
    }

    /// The graph-space rectangle visible in a container of the given size.
    pub fn viewport_rect(&self, container: Size) -> Rect {
        Rect::new(
            -self.x / self.zoom,
            -self.y / self.zoom,
            container.width / self.zoom,
            container.height / self.zoom,
        )
    }
}

/// Owns the canvas transform and its constraints.
pub struct TransformManager {
    transform: Transform,
    container: Size,
    min_zoom: f32,
    max_zoom: f32,
    zoom_step: f32,
    translate_extent: Option<Rect>,
    node_extent: Option<Rect>,
    subscribers: Publisher<Transform>,
}

impl TransformManager {
    /// Create a manager for a container of the given screen size.
    ///
    /// # Errors
    /// [`FlowError::ZeroSizedContainer`] when either dimension is not positive.
    pub fn new(container: Size, config: &FlowConfig) -> FlowResult<Self> {
        check_container(container)?;
        let mut manager = Self {
            transform: Transform::IDENTITY,
            container,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            zoom_step: config.zoom_step,
            translate_extent: config.translate_extent,
            node_extent: config.node_extent,
            subscribers: Publisher::new(),
        };
        let zoom = manager.clamp_zoom(config.default_zoom);
        manager.transform = manager.constrain(Transform::new(0.0, 0.0, zoom));
        Ok(manager)
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn zoom(&self) -> f32 {
        self.transform.zoom
    }

    pub fn container_size(&self) -> Size {
        self.container
    }

    pub fn min_zoom(&self) -> f32 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> f32 {
        self.max_zoom
    }

    pub fn translate_extent(&self) -> Option<Rect> {
        self.translate_extent
    }

    pub fn node_extent(&self) -> Option<Rect> {
        self.node_extent
    }

    /// Receive every transform accepted from now on.
    pub fn subscribe(&mut self) -> Receiver<Transform> {
        self.subscribers.subscribe()
    }

    pub fn viewport_rect(&self) -> Rect {
        self.transform.viewport_rect(self.container)
    }

    pub fn project(&self, p: Point) -> Point {
        self.transform.project(p)
    }

    pub fn unproject(&self, p: Point) -> Point {
        self.transform.unproject(p)
    }

    /// Translate the canvas by a screen-space delta.
    pub fn pan(&mut self, dx: f32, dy: f32) -> Transform {
        let t = self.transform;
        self.apply(Transform::new(t.x + dx, t.y + dy, t.zoom))
    }

    /// Multiply the zoom by `factor`, keeping the graph point under the
    /// screen-space `focal` point fixed.
    pub fn zoom_by(&mut self, factor: f32, focal: Point) -> Transform {
        if !(factor > 0.0) || !factor.is_finite() {
            return self.transform;
        }
        self.zoom_to(self.transform.zoom * factor, Some(focal))
    }

    /// Set an absolute zoom about `focal` (the container centre when `None`).
    pub fn zoom_to(&mut self, zoom: f32, focal: Option<Point>) -> Transform {
        let focal = focal.unwrap_or_else(|| self.container_center());
        let new_zoom = self.clamp_zoom(zoom);
        let graph = self.transform.unproject(focal);
        self.apply(Transform::new(
            focal.x - graph.x * new_zoom,
            focal.y - graph.y * new_zoom,
            new_zoom,
        ))
    }

    pub fn zoom_in(&mut self) -> Transform {
        let focal = self.container_center();
        self.zoom_by(self.zoom_step, focal)
    }

    pub fn zoom_out(&mut self) -> Transform {
        let focal = self.container_center();
        self.zoom_by(1.0 / self.zoom_step, focal)
    }

    /// Fit `bbox` into the container with `padding` (a fraction of the box
    /// size) added on every side, centring it.
    ///
    /// Returns `None` and leaves the transform untouched when there is
    /// nothing to fit.
    pub fn fit_view(&mut self, bbox: Option<Rect>, padding: f32) -> Option<Transform> {
        let bbox = bbox?;
        Some(self.fit_bounds(bbox, padding))
    }

    pub fn fit_bounds(&mut self, bounds: Rect, padding: f32) -> Transform {
        let pad = 1.0 + 2.0 * padding.max(0.0);
        let zoom_x = self.container.width / (bounds.width * pad);
        let zoom_y = self.container.height / (bounds.height * pad);
        let zoom = self.clamp_zoom(zoom_x.min(zoom_y));
        let center = bounds.center();
        self.apply(Transform::new(
            self.container.width / 2.0 - center.x * zoom,
            self.container.height / 2.0 - center.y * zoom,
            zoom,
        ))
    }

    /// Centre the graph point `(x, y)` in the container, optionally at a new zoom.
    pub fn set_center(&mut self, x: f32, y: f32, zoom: Option<f32>) -> Transform {
        let zoom = self.clamp_zoom(zoom.unwrap_or(self.transform.zoom));
        self.apply(Transform::new(
            self.container.width / 2.0 - x * zoom,
            self.container.height / 2.0 - y * zoom,
            zoom,
        ))
    }

    pub fn set_transform(&mut self, transform: Transform) -> Transform {
        let zoom = self.clamp_zoom(transform.zoom);
        self.apply(Transform::new(transform.x, transform.y, zoom))
    }

    pub fn set_extent_constraints(
        &mut self,
        translate_extent: Option<Rect>,
        node_extent: Option<Rect>,
    ) -> Transform {
        self.translate_extent = translate_extent;
        self.node_extent = node_extent;
        self.apply(self.transform)
    }

    pub fn set_min_zoom(&mut self, min_zoom: f32) -> Transform {
        self.min_zoom = min_zoom.min(self.max_zoom);
        self.set_transform(self.transform)
    }

    pub fn set_max_zoom(&mut self, max_zoom: f32) -> Transform {
        self.max_zoom = max_zoom.max(self.min_zoom);
        self.set_transform(self.transform)
    }

    pub fn set_container_size(&mut self, container: Size) -> FlowResult<()> {
        check_container(container)?;
        self.container = container;
        self.apply(self.transform);
        Ok(())
    }

    fn container_center(&self) -> Point {
        Point::new(self.container.width / 2.0, self.container.height / 2.0)
    }

    fn clamp_zoom(&self, zoom: f32) -> f32 {
        if zoom.is_nan() {
            return self.transform.zoom;
        }
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    /// Keep the visible area inside the translate extent. When the view is
    /// larger than the extent on an axis the extent is centred on that axis.
    fn constrain(&self, t: Transform) -> Transform {
        let Some(extent) = self.translate_extent else {
            return t;
        };
        let dx0 = (0.0 - t.x) / t.zoom - extent.x;
        let dx1 = (self.container.width - t.x) / t.zoom - extent.right();
        let dy0 = (0.0 - t.y) / t.zoom - extent.y;
        let dy1 = (self.container.height - t.y) / t.zoom - extent.bottom();
        let shift_x = constrain_axis(dx0, dx1);
        let shift_y = constrain_axis(dy0, dy1);
        Transform::new(t.x + shift_x * t.zoom, t.y + shift_y * t.zoom, t.zoom)
    }

    fn apply(&mut self, candidate: Transform) -> Transform {
        let next = self.constrain(candidate);
        if next != self.transform {
            tracing::trace!(x = next.x, y = next.y, zoom = next.zoom, "transform changed");
            self.transform = next;
            self.subscribers.publish(next);
        }
        self.transform
    }
}

fn constrain_axis(d0: f32, d1: f32) -> f32 {
    if d1 > d0 {
        (d0 + d1) / 2.0
    } else if d0 < 0.0 {
        d0
    } else {
        d1.max(0.0)
    }
}

fn check_container(container: Size) -> FlowResult<()> {
    if container.width <= 0.0 || container.height <= 0.0 {
        return Err(FlowError::ZeroSizedContainer {
            width: container.width,
            height: container.height,
        });
    }
    Ok(())
}
