//! Serializable snapshot of a flow.
//!
//! The layout is `{ "nodes": [...], "edges": [...], "position": [x, y], "zoom": z }`.

use crate::error::FlowResult;
use crate::transform::Transform;
use crate::types::{Edge, Node};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowExportObject {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub position: [f32; 2],
    pub zoom: f32,
}

impl FlowExportObject {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>, transform: Transform) -> Self {
        Self {
            nodes,
            edges,
            position: [transform.x, transform.y],
            zoom: transform.zoom,
        }
    }

    pub fn transform(&self) -> Transform {
        Transform::new(self.position[0], self.position[1], self.zoom)
    }

    pub fn from_json(json: &str) -> FlowResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> FlowResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> FlowResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
