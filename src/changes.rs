//! Change events and their fan-out to subscribers.
//!
//! Each subscriber gets its own unbounded channel. Subscribers that dropped
//! their receiver are pruned on the next publish.

use crate::geometry::{Point, Size};
use crossbeam_channel::{unbounded, Receiver, Sender};

/// A change to a node's internal state.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeChange {
    Add { id: String },
    Remove { id: String },
    Position { id: String, position: Point, dragging: bool },
    Dimensions { id: String, size: Size },
    Select { id: String, selected: bool },
}

impl NodeChange {
    pub fn id(&self) -> &str {
        match self {
            NodeChange::Add { id }
            | NodeChange::Remove { id }
            | NodeChange::Position { id, .. }
            | NodeChange::Dimensions { id, .. }
            | NodeChange::Select { id, .. } => id,
        }
    }
}

/// A change to an edge's internal state.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeChange {
    Select { id: String, selected: bool },
}

/// Broadcasts values of type `T` to any number of channel subscribers.
pub struct Publisher<T> {
    senders: Vec<Sender<T>>,
}

impl<T> Default for Publisher<T> {
    fn default() -> Self {
        Self {
            senders: Vec::new(),
        }
    }
}

impl<T: Clone> Publisher<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<T> {
        let (tx, rx) = unbounded();
        self.senders.push(tx);
        rx
    }

    pub fn publish(&mut self, value: T) {
        self.senders.retain(|tx| tx.send(value.clone()).is_ok());
    }

    pub fn publish_all<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = T>,
    {
        for value in values {
            self.publish(value);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.senders.len()
    }
}
