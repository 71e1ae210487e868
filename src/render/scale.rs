//! Resolution-independent caption scaling.
//!
//! Caption metrics are authored against a 500-unit reference frame. Every target surface
//! multiplies them by `min(width, height) / 500`, so captions keep the same relative size and
//! position at any output resolution.

use crate::foundation::core::{Rgba8, Size};
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::model::overlay::TextOverlay;

/// Reference frame height that overlay metrics are expressed against.
pub const REFERENCE_HEIGHT: f32 = 500.0;

/// Smallest font size, in surface pixels, a caption is ever drawn at.
pub const MIN_FONT_SIZE: f32 = 24.0;

/// Scale factor for a surface: `min(width, height) / 500`.
pub fn scale_factor(size: Size) -> ForgeResult<f32> {
    if size.is_empty() {
        return Err(ForgeError::validation(format!(
            "cannot scale captions onto a {size} surface"
        )));
    }
    Ok(size.width.min(size.height) as f32 / REFERENCE_HEIGHT)
}

/// A caption resolved into surface pixel units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaledOverlay<'a> {
    /// Caption text.
    pub content: &'a str,
    /// Font size after scaling and flooring.
    pub font_size: f32,
    /// Font size after scaling, before the legibility floor.
    pub unfloored_font_size: f32,
    /// Outline width after scaling (never floored).
    pub stroke_width: f32,
    /// Fill color.
    pub color: Rgba8,
    /// Outline color.
    pub stroke_color: Rgba8,
    /// Anchor position as a percentage of surface height.
    pub vertical_position_percent: f32,
}

impl ScaledOverlay<'_> {
    /// Anchor y coordinate on a surface of the given height.
    pub fn anchor_y(&self, surface_height: u32) -> f64 {
        f64::from(self.vertical_position_percent) / 100.0 * f64::from(surface_height)
    }
}

/// Apply `factor` to an overlay; font size is floored at [`MIN_FONT_SIZE`].
pub fn scaled_overlay(overlay: &TextOverlay, factor: f32) -> ScaledOverlay<'_> {
    let unfloored = overlay.font_size * factor;
    ScaledOverlay {
        content: &overlay.content,
        font_size: unfloored.max(MIN_FONT_SIZE),
        unfloored_font_size: unfloored,
        stroke_width: overlay.stroke_width * factor,
        color: overlay.color,
        stroke_color: overlay.stroke_color,
        vertical_position_percent: overlay.vertical_position_percent,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/scale.rs"]
mod tests;
