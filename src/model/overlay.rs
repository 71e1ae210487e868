use crate::foundation::core::Rgba8;
use crate::foundation::error::{ForgeError, ForgeResult};

/// Default top caption content.
pub const DEFAULT_TOP_TEXT: &str = "TOP TEXT";
/// Default bottom caption content.
pub const DEFAULT_BOTTOM_TEXT: &str = "BOTTOM TEXT";

/// One styled caption.
///
/// `font_size`, `stroke_width` and the vertical anchor are expressed against the 500-unit
/// reference frame; renderers scale them to the target surface.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOverlay {
    /// Caption text, rendered verbatim.
    pub content: String,
    /// Font size in reference units, `> 0`.
    pub font_size: f32,
    /// Fill color.
    pub color: Rgba8,
    /// Outline color.
    pub stroke_color: Rgba8,
    /// Outline width in reference units, `>= 0`.
    pub stroke_width: f32,
    /// Anchor position as a percentage of surface height, `0..=100`.
    pub vertical_position_percent: f32,
}

impl TextOverlay {
    /// Default-styled caption with the given content and anchor.
    pub fn new(content: impl Into<String>, vertical_position_percent: f32) -> Self {
        Self {
            content: content.into(),
            font_size: 48.0,
            color: Rgba8::WHITE,
            stroke_color: Rgba8::BLACK,
            stroke_width: 3.0,
            vertical_position_percent,
        }
    }

    /// Default top caption.
    pub fn default_top() -> Self {
        Self::new(DEFAULT_TOP_TEXT, 50.0)
    }

    /// Default bottom caption.
    pub fn default_bottom() -> Self {
        Self::new(DEFAULT_BOTTOM_TEXT, 90.0)
    }

    /// Check the numeric ranges.
    pub fn validate(&self) -> ForgeResult<()> {
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(ForgeError::validation("overlay font_size must be finite and > 0"));
        }
        if !self.stroke_width.is_finite() || self.stroke_width < 0.0 {
            return Err(ForgeError::validation(
                "overlay stroke_width must be finite and >= 0",
            ));
        }
        if !(0.0..=100.0).contains(&self.vertical_position_percent) {
            return Err(ForgeError::validation(
                "overlay vertical_position_percent must be within 0..=100",
            ));
        }
        Ok(())
    }
}

/// The two captions of a session.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OverlayPair {
    /// Upper caption.
    pub top: TextOverlay,
    /// Lower caption.
    pub bottom: TextOverlay,
}

impl Default for OverlayPair {
    fn default() -> Self {
        Self {
            top: TextOverlay::default_top(),
            bottom: TextOverlay::default_bottom(),
        }
    }
}

impl OverlayPair {
    /// Validate both captions.
    pub fn validate(&self) -> ForgeResult<()> {
        self.top.validate()?;
        self.bottom.validate()
    }

    /// Restore default caption content, keeping styling.
    pub fn reset_content(&mut self) {
        self.top.content = DEFAULT_TOP_TEXT.to_string();
        self.bottom.content = DEFAULT_BOTTOM_TEXT.to_string();
    }

    /// Load a pair from JSON.
    pub fn from_json(json: &str) -> ForgeResult<Self> {
        let pair: Self = serde_json::from_str(json).map_err(|e| ForgeError::serde(e.to_string()))?;
        pair.validate()?;
        Ok(pair)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/overlay.rs"]
mod tests;
