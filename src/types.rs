//! The host-facing data model: nodes, edges and handles.
//!
//! The host owns these descriptors and hands them to the engine through
//! `set_nodes` / `set_edges`. Fields the engine does not interpret
//! (`node_type`, `data`) are carried through untouched.

use crate::geometry::{Point, Position, Rect};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A node descriptor as supplied by the host.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Node {
    pub id: String,
    /// Position in graph space, relative to the parent when `parent_id` is set.
    pub position: Point,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draggable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selectable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connectable: Option<bool>,
    pub selected: bool,
    pub hidden: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    pub data: serde_json::Value,
    /// Measured width, filled in on export. Ignored on import.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    /// Measured height, filled in on export. Ignored on import.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
}

impl Node {
    pub fn new(id: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            id: id.into(),
            position: Point::new(x, y),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_z_index(mut self, z: i32) -> Self {
        self.z_index = Some(z);
        self
    }

    pub fn with_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = Some(node_type.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn draggable(mut self, draggable: bool) -> Self {
        self.draggable = Some(draggable);
        self
    }

    pub fn connectable(mut self, connectable: bool) -> Self {
        self.connectable = Some(connectable);
        self
    }

    pub fn selectable(mut self, selectable: bool) -> Self {
        self.selectable = Some(selectable);
        self
    }
}

/// Routing style of an edge.
///
/// Unknown tags become [`EdgeType::Custom`], which keeps the tag for the
/// host's own renderer and routes like [`EdgeType::Bezier`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum EdgeType {
    #[default]
    Bezier,
    Straight,
    Step,
    SmoothStep,
    Custom(String),
}

impl EdgeType {
    pub fn as_str(&self) -> &str {
        match self {
            EdgeType::Bezier => "default",
            EdgeType::Straight => "straight",
            EdgeType::Step => "step",
            EdgeType::SmoothStep => "smoothstep",
            EdgeType::Custom(tag) => tag,
        }
    }

    /// Map a type tag to a routing style.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "default" | "bezier" => EdgeType::Bezier,
            "straight" => EdgeType::Straight,
            "step" => EdgeType::Step,
            "smoothstep" => EdgeType::SmoothStep,
            other => {
                tracing::debug!(edge_type = other, "custom edge type routed as bezier");
                EdgeType::Custom(other.to_owned())
            }
        }
    }
}

impl Serialize for EdgeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EdgeType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(EdgeType::from_tag(&tag))
    }
}

/// An edge descriptor as supplied by the host.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    pub selected: bool,
    pub animated: bool,
    pub hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub data: serde_json::Value,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            ..Default::default()
        }
    }

    pub fn with_handles(
        mut self,
        source_handle: Option<&str>,
        target_handle: Option<&str>,
    ) -> Self {
        self.source_handle = source_handle.map(str::to_owned);
        self.target_handle = target_handle.map(str::to_owned);
        self
    }

    pub fn with_type(mut self, edge_type: EdgeType) -> Self {
        self.edge_type = edge_type;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn animated(mut self, animated: bool) -> Self {
        self.animated = animated;
        self
    }
}

/// Whether a handle starts or ends connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleRole {
    Source,
    Target,
}

impl HandleRole {
    pub fn opposite(self) -> Self {
        match self {
            HandleRole::Source => HandleRole::Target,
            HandleRole::Target => HandleRole::Source,
        }
    }
}

/// A measured handle, positioned relative to its node's top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Handle {
    pub id: Option<String>,
    pub role: HandleRole,
    pub side: Position,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Handle {
    pub fn new(id: Option<&str>, role: HandleRole, side: Position, rect: Rect) -> Self {
        Self {
            id: id.map(str::to_owned),
            role,
            side,
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }

    pub fn source(id: Option<&str>, side: Position, rect: Rect) -> Self {
        Self::new(id, HandleRole::Source, side, rect)
    }

    pub fn target(id: Option<&str>, side: Position, rect: Rect) -> Self {
        Self::new(id, HandleRole::Target, side, rect)
    }

    /// Bounds relative to the owning node.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn matches(&self, handle_id: Option<&str>) -> bool {
        match handle_id {
            Some(id) => self.id.as_deref() == Some(id),
            None => true,
        }
    }
}

/// Measured handles of one node, bucketed by role in measurement order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HandleBounds {
    pub source: Vec<Handle>,
    pub target: Vec<Handle>,
}

impl HandleBounds {
    pub fn from_handles<I>(handles: I) -> Self
    where
        I: IntoIterator<Item = Handle>,
    {
        let mut bounds = HandleBounds::default();
        for handle in handles {
            match handle.role {
                HandleRole::Source => bounds.source.push(handle),
                HandleRole::Target => bounds.target.push(handle),
            }
        }
        bounds
    }

    pub fn by_role(&self, role: HandleRole) -> &[Handle] {
        match role {
            HandleRole::Source => &self.source,
            HandleRole::Target => &self.target,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Handle> {
        self.source.iter().chain(self.target.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty() && self.target.is_empty()
    }
}

/// A reference to one handle on one node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandleRef {
    pub node_id: String,
    pub handle_id: Option<String>,
    pub role: HandleRole,
}

impl HandleRef {
    pub fn new(node_id: impl Into<String>, handle_id: Option<&str>, role: HandleRole) -> Self {
        Self {
            node_id: node_id.into(),
            handle_id: handle_id.map(str::to_owned),
            role,
        }
    }
}

/// A completed connection between two handles, always ordered source to target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub source: String,
    pub target: String,
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
}
