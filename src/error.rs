//! Error types for the viewport engine.

use thiserror::Error;

/// Errors raised by the viewport engine.
///
/// Soft failures such as an edge whose handles cannot be resolved are not
/// errors: those elements are skipped for the render pass and logged.
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("container must have a non-zero size, got {width}x{height}")]
    ZeroSizedContainer { width: f32, height: f32 },

    #[error("node id `{0}` appears more than once")]
    DuplicateNodeId(String),

    #[error("node `{node_id}` cannot be parented to `{parent_id}`: this would form a cycle")]
    ParentCycle { node_id: String, parent_id: String },

    #[error("node `{node_id}` references unknown parent `{parent_id}`")]
    UnknownParent { node_id: String, parent_id: String },

    #[error("unknown node `{0}`")]
    UnknownNode(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type FlowResult<T> = Result<T, FlowError>;
