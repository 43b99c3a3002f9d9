//! Per-node geometric bookkeeping.
//!
//! [`NodeGeometryStore`] keeps the host's node descriptors together with the
//! state the engine derives for them: measured size, handle bounds,
//! absolute position (resolved through the parent chain), effective z-index
//! and drag state. Measurements survive host updates for ids that persist.

use crate::changes::{NodeChange, Publisher};
use crate::config::FlowConfig;
use crate::error::{FlowError, FlowResult};
use crate::geometry::{Point, Rect, Size};
use crate::types::{Handle, HandleBounds, Node};
use crossbeam_channel::Receiver;
use std::collections::{HashMap, HashSet};

/// Raise applied to the z-index of selected or dragged nodes.
pub const SELECTED_Z_RAISE: i32 = 1000;

/// A node plus everything the engine knows about its geometry.
#[derive(Debug, Clone)]
pub struct NodeInternals {
    pub node: Node,
    pub measured: Option<Size>,
    pub handle_bounds: Option<HandleBounds>,
    pub absolute_position: Point,
    pub z: i32,
    pub dragging: bool,
}

impl NodeInternals {
    fn new(node: Node) -> Self {
        Self {
            absolute_position: node.position,
            node,
            measured: None,
            handle_bounds: None,
            z: 0,
            dragging: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.node.id
    }

    /// Measured at least once.
    pub fn is_initialized(&self) -> bool {
        self.measured.is_some() && self.handle_bounds.is_some()
    }

    /// Absolute bounds in graph space, `None` until measured.
    pub fn absolute_rect(&self) -> Option<Rect> {
        self.measured
            .map(|size| Rect::from_origin_size(self.absolute_position, size))
    }
}

/// Resolved graph-level defaults for the per-node interaction flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementDefaults {
    pub draggable: bool,
    pub selectable: bool,
    pub connectable: bool,
}

impl Default for ElementDefaults {
    fn default() -> Self {
        Self {
            draggable: true,
            selectable: true,
            connectable: true,
        }
    }
}

impl From<&FlowConfig> for ElementDefaults {
    fn from(config: &FlowConfig) -> Self {
        Self {
            draggable: config.nodes_draggable,
            selectable: config.elements_selectable,
            connectable: config.nodes_connectable,
        }
    }
}

#[derive(Default)]
pub struct NodeGeometryStore {
    nodes: HashMap<String, NodeInternals>,
    order: Vec<String>,
    defaults: ElementDefaults,
    changes: Publisher<NodeChange>,
}

impl NodeGeometryStore {
    pub fn new(defaults: ElementDefaults) -> Self {
        Self {
            defaults,
            ..Default::default()
        }
    }

    pub fn set_defaults(&mut self, defaults: ElementDefaults) {
        self.defaults = defaults;
    }

    pub fn defaults(&self) -> ElementDefaults {
        self.defaults
    }

    pub fn subscribe(&mut self) -> Receiver<NodeChange> {
        self.changes.subscribe()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&NodeInternals> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes in the order the host supplied them.
    pub fn iter(&self) -> impl Iterator<Item = &NodeInternals> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Nodes sorted by effective z-index, lowest first. Ties keep host order.
    pub fn iter_by_z(&self) -> Vec<&NodeInternals> {
        let mut nodes: Vec<_> = self.iter().collect();
        nodes.sort_by_key(|n| n.z);
        nodes
    }

    /// Current descriptors with positions and measured sizes written back.
    pub fn nodes(&self) -> Vec<Node> {
        self.iter()
            .map(|internals| {
                let mut node = internals.node.clone();
                node.width = internals.measured.map(|s| s.width);
                node.height = internals.measured.map(|s| s.height);
                node
            })
            .collect()
    }

    pub fn is_draggable(&self, id: &str) -> bool {
        self.get(id)
            .map(|n| n.node.draggable.unwrap_or(self.defaults.draggable))
            .unwrap_or(false)
    }

    pub fn is_selectable(&self, id: &str) -> bool {
        self.get(id)
            .map(|n| n.node.selectable.unwrap_or(self.defaults.selectable))
            .unwrap_or(false)
    }

    pub fn is_connectable(&self, id: &str) -> bool {
        self.get(id)
            .map(|n| n.node.connectable.unwrap_or(self.defaults.connectable))
            .unwrap_or(false)
    }

    /// Replace the node set with the host's descriptors.
    ///
    /// Measurements and drag state are kept for ids present before and after.
    /// Nothing is modified when the input contains a duplicate id, a parent
    /// reference to an unknown node or a parent cycle.
    pub fn upsert_nodes(&mut self, nodes: Vec<Node>) -> FlowResult<()> {
        validate_hierarchy(&nodes)?;

        let mut previous = std::mem::take(&mut self.nodes);
        let mut events = Vec::new();
        let mut order = Vec::with_capacity(nodes.len());
        for node in nodes {
            let id = node.id.clone();
            let internals = match previous.remove(&id) {
                Some(mut existing) => {
                    existing.node = node;
                    existing
                }
                None => {
                    events.push(NodeChange::Add { id: id.clone() });
                    NodeInternals::new(node)
                }
            };
            order.push(id.clone());
            self.nodes.insert(id, internals);
        }
        for old in self.order.iter().filter(|id| previous.contains_key(*id)) {
            events.push(NodeChange::Remove { id: old.clone() });
        }
        self.order = order;

        self.update_absolute_positions();
        self.compute_z_index();
        tracing::debug!(count = self.order.len(), "nodes updated");
        self.changes.publish_all(events);
        Ok(())
    }

    /// Record the measured size and handles of a node.
    ///
    /// Handle bounds are replaced as a whole. Returns `false` for unknown ids.
    pub fn report_measurement(&mut self, id: &str, size: Size, handles: Vec<Handle>) -> bool {
        let Some(internals) = self.nodes.get_mut(id) else {
            tracing::debug!(node_id = id, "measurement for unknown node ignored");
            return false;
        };
        internals.measured = Some(size);
        internals.handle_bounds = Some(HandleBounds::from_handles(handles));
        self.changes.publish(NodeChange::Dimensions {
            id: id.to_owned(),
            size,
        });
        true
    }

    /// Move a node by a graph-space delta.
    pub fn move_position(
        &mut self,
        id: &str,
        delta: Point,
        snap_grid: Option<[f32; 2]>,
        extent: Option<Rect>,
    ) -> FlowResult<Point> {
        let current = self
            .get(id)
            .map(|n| n.absolute_position)
            .ok_or_else(|| FlowError::UnknownNode(id.to_owned()))?;
        self.set_absolute_position(id, current + delta, snap_grid, extent)
    }

    /// Place a node so its top-left corner lands on `target` (graph space).
    ///
    /// With a snap grid each axis is rounded to the nearest multiple. With an
    /// extent the node's whole box is kept inside it. Returns the resulting
    /// absolute position.
    pub fn set_absolute_position(
        &mut self,
        id: &str,
        target: Point,
        snap_grid: Option<[f32; 2]>,
        extent: Option<Rect>,
    ) -> FlowResult<Point> {
        let internals = self
            .nodes
            .get(id)
            .ok_or_else(|| FlowError::UnknownNode(id.to_owned()))?;
        let size = internals.measured.unwrap_or_default();
        let parent_origin = internals
            .node
            .parent_id
            .as_deref()
            .and_then(|p| self.nodes.get(p))
            .map(|p| p.absolute_position)
            .unwrap_or(Point::ZERO);

        let mut position = target;
        if let Some([gx, gy]) = snap_grid {
            position = snap_to_grid(position, gx, gy);
        }
        if let Some(extent) = extent {
            position = clamp_into_extent(position, size, extent);
        }

        let dragging = internals.dragging;
        if let Some(internals) = self.nodes.get_mut(id) {
            internals.node.position = position - parent_origin;
        }
        self.update_absolute_positions();
        self.changes.publish(NodeChange::Position {
            id: id.to_owned(),
            position,
            dragging,
        });
        Ok(position)
    }

    /// Change a node's parent. The node keeps its relative position.
    pub fn set_parent(&mut self, id: &str, parent_id: Option<&str>) -> FlowResult<()> {
        if !self.contains(id) {
            return Err(FlowError::UnknownNode(id.to_owned()));
        }
        if let Some(parent) = parent_id {
            if !self.contains(parent) {
                return Err(FlowError::UnknownParent {
                    node_id: id.to_owned(),
                    parent_id: parent.to_owned(),
                });
            }
            if chain_reaches(id, parent, |n| self.parent_of(n)) {
                return Err(FlowError::ParentCycle {
                    node_id: id.to_owned(),
                    parent_id: parent.to_owned(),
                });
            }
        }
        if let Some(internals) = self.nodes.get_mut(id) {
            internals.node.parent_id = parent_id.map(str::to_owned);
        }
        self.update_absolute_positions();
        self.compute_z_index();
        Ok(())
    }

    pub fn set_selected(&mut self, id: &str, selected: bool) -> bool {
        let Some(internals) = self.nodes.get_mut(id) else {
            return false;
        };
        if internals.node.selected == selected {
            return false;
        }
        internals.node.selected = selected;
        self.changes.publish(NodeChange::Select {
            id: id.to_owned(),
            selected,
        });
        true
    }

    pub fn set_dragging(&mut self, id: &str, dragging: bool) {
        if let Some(internals) = self.nodes.get_mut(id) {
            internals.dragging = dragging;
        }
    }

    /// Absolute graph-space position, walking the parent chain.
    pub fn absolute_position(&self, id: &str) -> Option<Point> {
        let mut position = Point::ZERO;
        let mut current = Some(id);
        let mut steps = 0;
        while let Some(node_id) = current {
            let internals = self.nodes.get(node_id)?;
            position = position + internals.node.position;
            current = internals.node.parent_id.as_deref();
            steps += 1;
            if steps > self.nodes.len() {
                return None;
            }
        }
        Some(position)
    }

    pub fn absolute_rect(&self, id: &str) -> Option<Rect> {
        self.get(id).and_then(NodeInternals::absolute_rect)
    }

    /// Recompute effective z-indices.
    ///
    /// A node's z is its explicit base (0 by default), raised by
    /// [`SELECTED_Z_RAISE`] while selected or dragging, and always at least
    /// one above its parent.
    pub fn compute_z_index(&mut self) {
        let mut by_depth: Vec<(usize, String)> = self
            .order
            .iter()
            .map(|id| (self.depth(id), id.clone()))
            .collect();
        by_depth.sort_by_key(|(depth, _)| *depth);

        for (_, id) in by_depth {
            let parent_z = self
                .parent_of(&id)
                .and_then(|p| self.nodes.get(p))
                .map(|p| p.z);
            if let Some(internals) = self.nodes.get_mut(&id) {
                let mut z = internals.node.z_index.unwrap_or(0);
                if internals.node.selected || internals.dragging {
                    z += SELECTED_Z_RAISE;
                }
                if let Some(parent_z) = parent_z {
                    z = z.max(parent_z + 1);
                }
                internals.z = z;
            }
        }
    }

    /// Bounding box of measured nodes in graph space.
    pub fn nodes_bounds(&self, include_hidden: bool) -> Option<Rect> {
        Rect::bounds(
            self.iter()
                .filter(|n| include_hidden || !n.node.hidden)
                .filter_map(NodeInternals::absolute_rect),
        )
    }

    pub fn selected_nodes_bounds(&self) -> Option<Rect> {
        Rect::bounds(
            self.iter()
                .filter(|n| n.node.selected)
                .filter_map(NodeInternals::absolute_rect),
        )
    }

    fn parent_of(&self, id: &str) -> Option<&str> {
        self.nodes.get(id).and_then(|n| n.node.parent_id.as_deref())
    }

    fn depth(&self, id: &str) -> usize {
        let mut depth = 0;
        let mut current = self.parent_of(id);
        while let Some(parent) = current {
            depth += 1;
            if depth > self.nodes.len() {
                break;
            }
            current = self.parent_of(parent);
        }
        depth
    }

    fn update_absolute_positions(&mut self) {
        let resolved: Vec<(String, Point)> = self
            .order
            .iter()
            .filter_map(|id| self.absolute_position(id).map(|p| (id.clone(), p)))
            .collect();
        for (id, position) in resolved {
            if let Some(internals) = self.nodes.get_mut(&id) {
                internals.absolute_position = position;
            }
        }
    }
}

/// Reject duplicate ids, unknown parents and parent cycles in one update.
fn validate_hierarchy(nodes: &[Node]) -> FlowResult<()> {
    let mut ids = HashSet::with_capacity(nodes.len());
    for node in nodes {
        if !ids.insert(node.id.as_str()) {
            return Err(FlowError::DuplicateNodeId(node.id.clone()));
        }
    }

    let parents: HashMap<&str, &str> = nodes
        .iter()
        .filter_map(|n| n.parent_id.as_deref().map(|p| (n.id.as_str(), p)))
        .collect();
    for node in nodes {
        let Some(parent) = node.parent_id.as_deref() else {
            continue;
        };
        if !ids.contains(parent) {
            return Err(FlowError::UnknownParent {
                node_id: node.id.clone(),
                parent_id: parent.to_owned(),
            });
        }
        if chain_reaches(&node.id, parent, |n| parents.get(n).copied()) {
            return Err(FlowError::ParentCycle {
                node_id: node.id.clone(),
                parent_id: parent.to_owned(),
            });
        }
    }
    Ok(())
}

/// True when walking up from `start_parent` reaches `id`, i.e. making
/// `start_parent` the parent of `id` closes a loop.
fn chain_reaches<'a, F>(id: &str, start_parent: &'a str, parent_of: F) -> bool
where
    F: Fn(&'a str) -> Option<&'a str>,
{
    let mut visited = HashSet::new();
    let mut current = Some(start_parent);
    while let Some(node) = current {
        if node == id || !visited.insert(node) {
            return true;
        }
        current = parent_of(node);
    }
    false
}

/// Round each axis to the nearest multiple of the grid.
pub fn snap_to_grid(p: Point, grid_x: f32, grid_y: f32) -> Point {
    let snap = |v: f32, g: f32| if g > 0.0 { (v / g).round() * g } else { v };
    Point::new(snap(p.x, grid_x), snap(p.y, grid_y))
}

/// Clamp a top-left corner so a box of `size` stays inside `extent`.
pub fn clamp_into_extent(p: Point, size: Size, extent: Rect) -> Point {
    let max_x = (extent.right() - size.width).max(extent.x);
    let max_y = (extent.bottom() - size.height).max(extent.y);
    Point::new(p.x.clamp(extent.x, max_x), p.y.clamp(extent.y, max_y))
}
