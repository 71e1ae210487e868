use crate::foundation::core::Size;
use crate::foundation::error::{ForgeError, ForgeResult};

/// Encoded output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Lossless PNG; ignores quality.
    #[default]
    Png,
    /// Lossy JPEG at the configured quality.
    Jpeg,
}

impl ExportFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    /// The `image` crate format tag.
    pub fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

/// Named export size preset. `Low`/`Medium`/`High` apply to video capture only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionTier {
    /// 640x480.
    Low,
    /// 1280x720.
    Medium,
    /// Native decoder-reported dimensions, else 1920x1080.
    #[default]
    High,
    /// Natural dimensions with each axis capped at the given value.
    OriginalCapped(u32),
}

impl ResolutionTier {
    /// Fallback used by `High` when the decoder reports no dimensions.
    pub const HIGH_FALLBACK: Size = Size::new(1920, 1080);

    /// Tier label used in generated file names.
    pub fn label(self) -> String {
        match self {
            Self::Low => "low".to_string(),
            Self::Medium => "medium".to_string(),
            Self::High => "high".to_string(),
            Self::OriginalCapped(max) => format!("max{max}"),
        }
    }

    /// Capture size for a video frame.
    pub fn video_size(self, native: Option<Size>) -> Size {
        match self {
            Self::Low => Size::new(640, 480),
            Self::Medium => Size::new(1280, 720),
            Self::High => native
                .filter(|s| !s.is_empty())
                .unwrap_or(Self::HIGH_FALLBACK),
            Self::OriginalCapped(max) => native
                .filter(|s| !s.is_empty())
                .unwrap_or(Self::HIGH_FALLBACK)
                .cap_each(max),
        }
    }
}

/// Per-request export settings. Never persisted.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExportConfig {
    /// Output format. Video captures always use PNG.
    pub format: ExportFormat,
    /// Encoder quality in `0.1..=1.0`, meaningful for JPEG only.
    pub quality: f32,
    /// Output size preset.
    pub resolution_tier: ResolutionTier,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            quality: 0.9,
            resolution_tier: ResolutionTier::High,
        }
    }
}

impl ExportConfig {
    /// Build a validated config; quality snaps to the nearest 0.1 step.
    pub fn new(
        format: ExportFormat,
        quality: f32,
        resolution_tier: ResolutionTier,
    ) -> ForgeResult<Self> {
        let cfg = Self {
            format,
            quality,
            resolution_tier,
        };
        cfg.validate()?;
        Ok(Self {
            quality: (quality * 10.0).round() / 10.0,
            ..cfg
        })
    }

    /// Check quality range and tier cap.
    pub fn validate(&self) -> ForgeResult<()> {
        if !self.quality.is_finite() || !(0.1..=1.0).contains(&self.quality) {
            return Err(ForgeError::validation(format!(
                "export quality must be within 0.1..=1.0, got {}",
                self.quality
            )));
        }
        if let ResolutionTier::OriginalCapped(0) = self.resolution_tier {
            return Err(ForgeError::validation("resolution cap must be > 0"));
        }
        Ok(())
    }

    /// JPEG encoder quality on the `1..=100` scale.
    pub fn jpeg_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/export.rs"]
mod tests;
