use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::assets::fonts::FontSource;
use crate::assets::media::FfmpegTools;
use crate::export::pipeline::EXPORT_MAX_DIM;
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::preview::controller::PREVIEW_MAX_DIM;

/// Path to a caption font file; selects [`FontSource::File`].
pub const ENV_FONT: &str = "MEMEFORGE_FONT";
/// `ffmpeg` executable override.
pub const ENV_FFMPEG: &str = "MEMEFORGE_FFMPEG";
/// `ffprobe` executable override.
pub const ENV_FFPROBE: &str = "MEMEFORGE_FFPROBE";
/// Preview refresh rate override.
pub const ENV_REFRESH_HZ: &str = "MEMEFORGE_REFRESH_HZ";

/// Engine-wide settings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Largest preview edge.
    pub preview_max_dim: u32,
    /// Per-axis cap for still-image exports.
    pub export_max_dim: u32,
    /// Display refresh rate driving the video preview loop.
    pub refresh_hz: u32,
    /// Caption font.
    pub font: FontSource,
    /// `ffmpeg` executable.
    pub ffmpeg_bin: PathBuf,
    /// `ffprobe` executable.
    pub ffprobe_bin: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let tools = FfmpegTools::default();
        Self {
            preview_max_dim: PREVIEW_MAX_DIM,
            export_max_dim: EXPORT_MAX_DIM,
            refresh_hz: 60,
            font: FontSource::default(),
            ffmpeg_bin: tools.ffmpeg,
            ffprobe_bin: tools.ffprobe,
        }
    }
}

impl EngineConfig {
    /// Load a JSON config file. Missing keys take their defaults.
    pub fn from_path(path: &Path) -> ForgeResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json(&text)
    }

    /// Parse a JSON config.
    pub fn from_json(json: &str) -> ForgeResult<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| ForgeError::serde(format!("engine config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `MEMEFORGE_*` environment overrides.
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup. Unparseable or zero numbers are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup(ENV_FONT).filter(|v| !v.is_empty()) {
            self.font = FontSource::File { path: path.into() };
        }
        if let Some(bin) = lookup(ENV_FFMPEG).filter(|v| !v.is_empty()) {
            self.ffmpeg_bin = bin.into();
        }
        if let Some(bin) = lookup(ENV_FFPROBE).filter(|v| !v.is_empty()) {
            self.ffprobe_bin = bin.into();
        }
        if let Some(hz) = lookup(ENV_REFRESH_HZ)
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&n| n > 0)
        {
            self.refresh_hz = hz;
        }
        self
    }

    /// Reject zero sizes and a zero refresh rate.
    pub fn validate(&self) -> ForgeResult<()> {
        if self.preview_max_dim == 0 || self.export_max_dim == 0 {
            return Err(ForgeError::validation("preview/export max dims must be > 0"));
        }
        if self.export_max_dim > u32::from(u16::MAX) || self.preview_max_dim > u32::from(u16::MAX) {
            return Err(ForgeError::validation("max dims must fit in u16"));
        }
        if self.refresh_hz == 0 {
            return Err(ForgeError::validation("refresh_hz must be > 0"));
        }
        Ok(())
    }

    /// External tool locations.
    pub fn ffmpeg_tools(&self) -> FfmpegTools {
        FfmpegTools {
            ffmpeg: self.ffmpeg_bin.clone(),
            ffprobe: self.ffprobe_bin.clone(),
        }
    }

    /// Interval between preview refresh ticks.
    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / f64::from(self.refresh_hz.max(1)))
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
