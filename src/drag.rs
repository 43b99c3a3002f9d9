//! Node dragging.
//!
//! A drag remembers where each node and the pointer started and places every
//! node at `start + (pointer - pointer_start)` on each move, so snapping
//! never accumulates rounding. Cancelling leaves nodes where they are.

use crate::error::FlowResult;
use crate::geometry::{Point, Rect};
use crate::store::NodeGeometryStore;

#[derive(Debug, Clone, PartialEq)]
pub struct NodeDrag {
    pointer_start: Point,
    starts: Vec<(String, Point)>,
}

impl NodeDrag {
    /// Start dragging `ids` with the pointer at `pointer` (graph space).
    ///
    /// Nodes that are not draggable are skipped, as are nodes whose ancestor
    /// is dragged too (they follow their parent). Returns `None` when nothing
    /// can be dragged.
    pub fn begin<I, S>(store: &mut NodeGeometryStore, ids: I, pointer: Point) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let candidates: Vec<String> = ids
            .into_iter()
            .map(|id| id.as_ref().to_owned())
            .filter(|id| store.is_draggable(id))
            .collect();

        let starts: Vec<(String, Point)> = candidates
            .iter()
            .filter(|id| !has_dragged_ancestor(store, id, &candidates))
            .filter_map(|id| store.get(id).map(|n| (id.clone(), n.absolute_position)))
            .collect();

        if starts.is_empty() {
            return None;
        }
        for (id, _) in &starts {
            store.set_dragging(id, true);
        }
        store.compute_z_index();
        tracing::debug!(count = starts.len(), "node drag started");
        Some(Self {
            pointer_start: pointer,
            starts,
        })
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.starts.iter().map(|(id, _)| id.as_str())
    }

    /// Move the dragged nodes to follow the pointer.
    ///
    /// # Returns
    /// The new absolute position of every dragged node.
    pub fn update(
        &self,
        store: &mut NodeGeometryStore,
        pointer: Point,
        snap_grid: Option<[f32; 2]>,
        extent: Option<Rect>,
    ) -> FlowResult<Vec<(String, Point)>> {
        let delta = pointer - self.pointer_start;
        let mut moved = Vec::with_capacity(self.starts.len());
        for (id, start) in &self.starts {
            if !store.contains(id) {
                continue;
            }
            let position = store.set_absolute_position(id, *start + delta, snap_grid, extent)?;
            moved.push((id.clone(), position));
        }
        Ok(moved)
    }

    /// Finish the drag. Nodes keep their last position.
    pub fn end(self, store: &mut NodeGeometryStore) {
        for (id, _) in &self.starts {
            store.set_dragging(id, false);
        }
        store.compute_z_index();
        tracing::debug!(count = self.starts.len(), "node drag ended");
    }
}

fn has_dragged_ancestor(store: &NodeGeometryStore, id: &str, dragged: &[String]) -> bool {
    let mut current = store.get(id).and_then(|n| n.node.parent_id.clone());
    let mut steps = 0;
    while let Some(parent) = current {
        if dragged.iter().any(|d| *d == parent) {
            return true;
        }
        steps += 1;
        if steps > store.len() {
            break;
        }
        current = store.get(&parent).and_then(|n| n.node.parent_id.clone());
    }
    false
}
