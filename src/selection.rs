//! Click and rectangle selection.
//!
//! [`SelectionManager`] tracks a set of selected element ids and applies the
//! usual click semantics. [`RectangleSelection`] projects a screen-space
//! drag rectangle into graph space and computes which nodes and edges it
//! selects; the result is recomputed from scratch on every pointer move.

use crate::config::SelectionMode;
use crate::geometry::{Point, Rect};
use crate::hit_test::nodes_in_rect;
use crate::store::NodeGeometryStore;
use crate::transform::Transform;
use crate::types::Edge;
use slint::{Model, SharedString, VecModel};
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct SelectionManager {
    selected: HashSet<String>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle selection of an element based on the multi-select modifier
    ///
    /// With the modifier the element is toggled; without it the selection
    /// collapses to just this element.
    pub fn handle_interaction(&mut self, id: &str, multi_select: bool) {
        if multi_select {
            if !self.selected.remove(id) {
                self.selected.insert(id.to_owned());
            }
        } else {
            if self.selected.len() == 1 && self.selected.contains(id) {
                return;
            }
            self.selected.clear();
            self.selected.insert(id.to_owned());
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Add ids without touching the rest of the selection
    pub fn add<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected.extend(ids.into_iter().map(Into::into));
    }

    /// Replace the current selection with a new set of ids
    pub fn replace_selection<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected.clear();
        self.add(ids);
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.selected.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    /// Selected ids in sorted order
    pub fn sorted(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.selected.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Sync the selection to a Slint VecModel, sorted by id
    pub fn sync_to_model(&self, model: &VecModel<SharedString>) {
        let ids: Vec<SharedString> = self
            .sorted()
            .iter()
            .map(|id| SharedString::from(id.as_str()))
            .collect();
        model.set_vec(ids);
    }

    /// Sync the selection from any Slint Model
    pub fn sync_from_model(&mut self, model: &dyn Model<Data = SharedString>) {
        self.selected.clear();
        for i in 0..model.row_count() {
            if let Some(id) = model.row_data(i) {
                self.selected.insert(id.to_string());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

/// Elements selected by a rectangle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionResult {
    pub nodes: Vec<String>,
    pub edges: Vec<String>,
}

/// A rectangle being dragged out on the canvas, in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectangleSelection {
    start: Point,
    current: Point,
}

impl RectangleSelection {
    pub fn new(start: Point) -> Self {
        Self {
            start,
            current: start,
        }
    }

    pub fn update(&mut self, current: Point) {
        self.current = current;
    }

    pub fn screen_rect(&self) -> Rect {
        Rect::from_corners(self.start, self.current)
    }

    /// The rectangle projected through `transform` into graph space.
    pub fn graph_rect(&self, transform: &Transform) -> Rect {
        Rect::from_corners(
            transform.unproject(self.start),
            transform.unproject(self.current),
        )
    }

    /// Nodes inside the rectangle, plus the edges whose endpoints are both
    /// among them.
    pub fn select(
        &self,
        transform: &Transform,
        store: &NodeGeometryStore,
        edges: &[Edge],
        mode: SelectionMode,
    ) -> SelectionResult {
        let nodes = nodes_in_rect(store, &self.graph_rect(transform), mode);
        let edges = edges_between(edges, &nodes);
        SelectionResult { nodes, edges }
    }
}

/// Ids of visible edges whose source and target are both in `nodes`.
pub fn edges_between(edges: &[Edge], nodes: &[String]) -> Vec<String> {
    let set: HashSet<&str> = nodes.iter().map(String::as_str).collect();
    edges
        .iter()
        .filter(|e| !e.hidden && set.contains(e.source.as_str()) && set.contains(e.target.as_str()))
        .map(|e| e.id.clone())
        .collect()
}
