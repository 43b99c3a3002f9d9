//! Common test utilities for integration tests.

#![allow(dead_code)]

pub mod harness;

use slint_flow_viewport::{Connection, ConnectionOutcome, HandleRef, Transform};
use std::cell::RefCell;
use std::rc::Rc;

/// Tracks callback invocations for testing.
///
/// Each field records calls to the corresponding callback with their arguments.
#[derive(Default, Clone)]
pub struct CallbackTracker {
    /// Connections emitted by `on_connect`
    pub connect: Rc<RefCell<Vec<Connection>>>,
    /// Origin handles passed to `on_connect_start`
    pub connect_start: Rc<RefCell<Vec<HandleRef>>>,
    /// Outcomes passed to `on_connect_end`
    pub connect_end: Rc<RefCell<Vec<ConnectionOutcome>>>,
    /// Transforms received from the transform subscription
    pub transforms: Rc<RefCell<Vec<Transform>>>,
}

impl CallbackTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all recorded callbacks.
    pub fn clear(&self) {
        self.connect.borrow_mut().clear();
        self.connect_start.borrow_mut().clear();
        self.connect_end.borrow_mut().clear();
        self.transforms.borrow_mut().clear();
    }

    pub fn connect_count(&self) -> usize {
        self.connect.borrow().len()
    }
}
