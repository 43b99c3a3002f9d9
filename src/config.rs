//! Engine configuration.
//!
//! [`FlowConfig`] gathers the graph-level defaults that the engine consults:
//! zoom bounds, snapping, connection rules and routing options. It can be
//! built in code or loaded from JSON; missing fields take their defaults.
//!
//! ```ignore
//! let config = FlowConfig::from_json(r#"{ "max_zoom": 4.0, "snap_to_grid": true }"#)?;
//! ```

use crate::error::FlowResult;
use crate::geometry::Rect;
use crate::types::EdgeType;
use serde::{Deserialize, Serialize};

/// How strictly handle roles are enforced when connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    /// Source handles connect only to target handles.
    #[default]
    Strict,
    /// Any handle connects to any other handle.
    Loose,
}

/// Rectangle selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Node must lie entirely inside the rectangle.
    #[default]
    Full,
    /// Any overlap is enough.
    Partial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub default_zoom: f32,
    /// Factor used by `zoom_in` / `zoom_out`.
    pub zoom_step: f32,
    pub snap_to_grid: bool,
    pub snap_grid: [f32; 2],
    pub connection_mode: ConnectionMode,
    pub allow_self_loops: bool,
    /// Pointer distance in screen pixels within which a handle counts as hovered.
    pub connection_radius: f32,
    pub connection_line_type: EdgeType,
    pub only_render_visible_elements: bool,
    pub nodes_draggable: bool,
    pub nodes_connectable: bool,
    pub elements_selectable: bool,
    pub selection_mode: SelectionMode,
    pub translate_extent: Option<Rect>,
    pub node_extent: Option<Rect>,
    pub fit_view_padding: f32,
    pub bezier_min_offset: f32,
    pub smoothstep_border_radius: f32,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.5,
            max_zoom: 2.0,
            default_zoom: 1.0,
            zoom_step: 1.2,
            snap_to_grid: false,
            snap_grid: [15.0, 15.0],
            connection_mode: ConnectionMode::Strict,
            allow_self_loops: false,
            connection_radius: 20.0,
            connection_line_type: EdgeType::Bezier,
            only_render_visible_elements: false,
            nodes_draggable: true,
            nodes_connectable: true,
            elements_selectable: true,
            selection_mode: SelectionMode::Full,
            translate_extent: None,
            node_extent: None,
            fit_view_padding: 0.1,
            bezier_min_offset: 50.0,
            smoothstep_border_radius: 5.0,
        }
    }
}

impl FlowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON. Unspecified fields keep their defaults.
    pub fn from_json(json: &str) -> FlowResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> FlowResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_zoom_range(mut self, min_zoom: f32, max_zoom: f32) -> Self {
        self.min_zoom = min_zoom.min(max_zoom);
        self.max_zoom = max_zoom.max(min_zoom);
        self
    }

    pub fn with_snap_grid(mut self, x: f32, y: f32) -> Self {
        self.snap_to_grid = true;
        self.snap_grid = [x, y];
        self
    }

    pub fn with_connection_mode(mut self, mode: ConnectionMode) -> Self {
        self.connection_mode = mode;
        self
    }

    pub fn with_self_loops(mut self, allow: bool) -> Self {
        self.allow_self_loops = allow;
        self
    }

    pub fn with_culling(mut self, enabled: bool) -> Self {
        self.only_render_visible_elements = enabled;
        self
    }

    pub fn with_selection_mode(mut self, mode: SelectionMode) -> Self {
        self.selection_mode = mode;
        self
    }

    pub fn with_translate_extent(mut self, extent: Option<Rect>) -> Self {
        self.translate_extent = extent;
        self
    }

    pub fn with_node_extent(mut self, extent: Option<Rect>) -> Self {
        self.node_extent = extent;
        self
    }

    pub fn clamp_zoom(&self, zoom: f32) -> f32 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}
