//! Background pattern geometry.
//!
//! The background is an infinite pattern anchored to graph space: it scales
//! with the zoom and scrolls with the pan. Output is SVG path data in screen
//! space covering the container.

use crate::geometry::Size;
use crate::transform::Transform;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Patterns smaller than this many screen pixels are not drawn.
const MIN_VISIBLE_GAP: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundVariant {
    Lines,
    #[default]
    Dots,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundOptions {
    pub variant: BackgroundVariant,
    /// Distance between lines or dots in graph units.
    pub gap: f32,
    /// Dot edge length in graph units. Unused for lines.
    pub size: f32,
}

impl Default for BackgroundOptions {
    fn default() -> Self {
        Self {
            variant: BackgroundVariant::Dots,
            gap: 15.0,
            size: 1.0,
        }
    }
}

/// Path data for the background pattern under `transform`.
pub fn background_commands(
    container: Size,
    transform: &Transform,
    options: &BackgroundOptions,
) -> String {
    match options.variant {
        BackgroundVariant::Lines => generate_grid_commands(
            container.width,
            container.height,
            transform.zoom,
            transform.x,
            transform.y,
            options.gap,
        ),
        BackgroundVariant::Dots => {
            generate_dot_commands(container, transform, options.gap, options.size)
        }
    }
}

/// Generate SVG path commands for grid lines
///
/// # Arguments
/// * `width` - Canvas width in pixels
/// * `height` - Canvas height in pixels
/// * `zoom` - Current zoom level
/// * `pan_x` - Pan offset X in pixels
/// * `pan_y` - Pan offset Y in pixels
/// * `spacing` - Base grid spacing (before zoom)
///
/// # Returns
/// SVG path commands string (e.g., "M 24 0 L 24 600 M 48 0 L 48 600...")
pub fn generate_grid_commands(
    width: f32,
    height: f32,
    zoom: f32,
    pan_x: f32,
    pan_y: f32,
    spacing: f32,
) -> String {
    let effective_spacing = spacing * zoom;

    if effective_spacing < MIN_VISIBLE_GAP {
        return String::new();
    }

    // Offset by pan modulo spacing so the pattern scrolls with the canvas
    let offset_x = pan_x.rem_euclid(effective_spacing);
    let offset_y = pan_y.rem_euclid(effective_spacing);

    let mut commands = String::with_capacity(4096);

    let mut x = offset_x;
    while x < width + effective_spacing {
        if !commands.is_empty() {
            commands.push(' ');
        }
        let _ = write!(commands, "M {} 0 L {} {}", x, x, height);
        x += effective_spacing;
    }

    let mut y = offset_y;
    while y < height + effective_spacing {
        commands.push(' ');
        let _ = write!(commands, "M 0 {} L {} {}", y, width, y);
        y += effective_spacing;
    }

    commands
}

/// Generate SVG path commands for a dot pattern, one small square per grid point.
pub fn generate_dot_commands(
    container: Size,
    transform: &Transform,
    gap: f32,
    size: f32,
) -> String {
    let effective_gap = gap * transform.zoom;
    if effective_gap < MIN_VISIBLE_GAP {
        return String::new();
    }
    let dot = (size * transform.zoom).max(0.5);
    let half = dot / 2.0;

    let offset_x = transform.x.rem_euclid(effective_gap);
    let offset_y = transform.y.rem_euclid(effective_gap);

    let mut commands = String::with_capacity(4096);
    let mut y = offset_y;
    while y < container.height + effective_gap {
        let mut x = offset_x;
        while x < container.width + effective_gap {
            if !commands.is_empty() {
                commands.push(' ');
            }
            let _ = write!(
                commands,
                "M {} {} h {} v {} h {} z",
                x - half,
                y - half,
                dot,
                dot,
                -dot
            );
            x += effective_gap;
        }
        y += effective_gap;
    }
    commands
}
