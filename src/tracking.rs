//! Deferred measurement reporting.
//!
//! The UI measures nodes and handles while it lays them out. Reports are
//! queued by [`MeasurementTracker`] and applied to the store at the start of
//! the next render pass, never while a pass is reading the store.
//!
//! # Example
//!
//! ```ignore
//! let tracker = MeasurementTracker::new();
//!
//! // Wire up callbacks (one-time setup)
//! window.on_node_size_changed(tracker.node_size_callback());
//! window.on_handle_measured(tracker.handle_callback());
//!
//! // Before rendering
//! tracker.flush(&mut store);
//! ```

use crate::geometry::{Position, Rect, Size};
use crate::store::NodeGeometryStore;
use crate::types::{Handle, HandleRole};
use slint::SharedString;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A full measurement of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub node_id: String,
    pub size: Size,
    pub handles: Vec<Handle>,
}

#[derive(Debug, Default)]
struct PendingNode {
    size: Option<Size>,
    handles: Vec<Handle>,
    /// Set by a full [`Measurement`]: `handles` is the complete set.
    replace_handles: bool,
}

impl PendingNode {
    fn merge(&mut self, later: PendingNode) {
        if later.size.is_some() {
            self.size = later.size;
        }
        if later.replace_handles {
            self.handles = later.handles;
            self.replace_handles = true;
        } else {
            merge_handles(&mut self.handles, later.handles);
        }
    }
}

#[derive(Debug, Default)]
struct PendingMeasurements {
    order: Vec<String>,
    nodes: HashMap<String, PendingNode>,
}

impl PendingMeasurements {
    fn entry(&mut self, node_id: &str) -> &mut PendingNode {
        if !self.nodes.contains_key(node_id) {
            self.order.push(node_id.to_owned());
        }
        self.nodes.entry(node_id.to_owned()).or_default()
    }
}

/// Replace handles with the same role and id, append the rest.
fn merge_handles(handles: &mut Vec<Handle>, incoming: Vec<Handle>) {
    for handle in incoming {
        match handles.iter_mut().find(|h| h.role == handle.role && h.id == handle.id) {
            Some(slot) => *slot = handle,
            None => handles.push(handle),
        }
    }
}

/// Queues measurements and hands out ready-to-use Slint callbacks.
#[derive(Clone, Default)]
pub struct MeasurementTracker {
    pending: Rc<RefCell<PendingMeasurements>>,
}

impl MeasurementTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a complete measurement. Its handles replace every handle
    /// previously known for the node.
    pub fn report(&self, measurement: Measurement) {
        let mut pending = self.pending.borrow_mut();
        let entry = pending.entry(&measurement.node_id);
        entry.size = Some(measurement.size);
        entry.handles = measurement.handles;
        entry.replace_handles = true;
    }

    /// Queue a node size. Handles already known for the node are kept.
    pub fn report_size(&self, node_id: &str, size: Size) {
        self.pending.borrow_mut().entry(node_id).size = Some(size);
    }

    /// Queue one handle. It replaces the node's handle with the same role
    /// and id, other handles are kept.
    pub fn report_handle(&self, node_id: &str, handle: Handle) {
        let mut pending = self.pending.borrow_mut();
        merge_handles(&mut pending.entry(node_id).handles, vec![handle]);
    }

    /// Callback for node size updates.
    ///
    /// The signature matches a Slint callback
    /// `(node_id: string, width: length, height: length)`.
    pub fn node_size_callback(&self) -> impl Fn(SharedString, f32, f32) + Clone {
        let tracker = self.clone();
        move |node_id, width, height| {
            tracker.report_size(node_id.as_str(), Size::new(width, height));
        }
    }

    /// Callback for handle measurements.
    ///
    /// The signature matches a Slint callback
    /// `(node_id, handle_id, role, side, x, y, width, height)` where an
    /// empty `handle_id` means "no id", `role` is 0 for source and 1 for
    /// target, and `side` is 0 top, 1 right, 2 bottom, 3 left.
    #[allow(clippy::type_complexity)]
    pub fn handle_callback(
        &self,
    ) -> impl Fn(SharedString, SharedString, i32, i32, f32, f32, f32, f32) + Clone {
        let tracker = self.clone();
        move |node_id, handle_id, role, side, x, y, width, height| {
            let id = (!handle_id.is_empty()).then(|| handle_id.as_str());
            let role = if role == 1 {
                HandleRole::Target
            } else {
                HandleRole::Source
            };
            let bounds = Rect::new(x, y, width, height);
            let handle = Handle::new(id, role, side_from_index(side), bounds);
            tracker.report_handle(node_id.as_str(), handle);
        }
    }

    /// Number of nodes with queued measurements.
    pub fn pending(&self) -> usize {
        self.pending.borrow().order.len()
    }

    /// Apply queued measurements to `store`.
    ///
    /// Handles of a node that has never received a size stay queued until
    /// the size arrives. Returns how many nodes were updated.
    pub fn flush(&self, store: &mut NodeGeometryStore) -> usize {
        let PendingMeasurements { order, mut nodes } =
            std::mem::take(&mut *self.pending.borrow_mut());
        let mut applied = 0;
        let mut waiting = Vec::new();
        for node_id in order {
            let Some(pending) = nodes.remove(&node_id) else {
                continue;
            };
            let Some(existing) = store.get(&node_id) else {
                tracing::debug!(node_id = %node_id, "measurement for unknown node ignored");
                continue;
            };
            let Some(size) = pending.size.or(existing.measured) else {
                tracing::debug!(
                    node_id = %node_id,
                    "handles reported before node size, kept queued"
                );
                waiting.push((node_id, pending));
                continue;
            };
            let handles = if pending.replace_handles {
                pending.handles
            } else {
                let mut handles: Vec<Handle> = existing
                    .handle_bounds
                    .as_ref()
                    .map(|b| b.iter().cloned().collect())
                    .unwrap_or_default();
                merge_handles(&mut handles, pending.handles);
                handles
            };
            if store.report_measurement(&node_id, size, handles) {
                applied += 1;
            }
        }
        if !waiting.is_empty() {
            let mut queue = self.pending.borrow_mut();
            for (node_id, pending) in waiting {
                queue.entry(&node_id).merge(pending);
            }
        }
        if applied > 0 {
            tracing::trace!(applied, "measurements flushed");
        }
        applied
    }
}

fn side_from_index(side: i32) -> Position {
    match side {
        0 => Position::Top,
        2 => Position::Bottom,
        3 => Position::Left,
        _ => Position::Right,
    }
}
