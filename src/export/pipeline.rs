use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context as _;

use crate::export::encode::encode_surface;
use crate::foundation::core::Size;
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::model::export::{ExportConfig, ExportFormat, ResolutionTier};
use crate::model::overlay::TextOverlay;
use crate::render::overlay::render_scaled;
use crate::render::scale::{scale_factor, scaled_overlay};
use crate::render::surface::RasterSurface;
use crate::render::text::TextShaper;
use crate::source::FrameSource;

/// Per-axis cap applied to still-image exports.
pub const EXPORT_MAX_DIM: u32 = 1920;

/// An encoded export ready for delivery.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportedAsset {
    /// Generated name, `meme-<stamp>.<ext>` or `meme-frame-<tier>-<stamp>.png`.
    pub file_name: String,
    /// Encoded format.
    pub format: ExportFormat,
    /// Pixel dimensions of the encoded image.
    pub size: Size,
    /// Encoded bytes.
    pub bytes: Vec<u8>,
}

impl ExportedAsset {
    /// Write the asset into `dir` under its generated name and return the full path.
    pub fn write_to_dir(&self, dir: &Path) -> ForgeResult<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create export directory '{}'", dir.display()))?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)
            .with_context(|| format!("failed to write export '{}'", path.display()))?;
        Ok(path)
    }
}

fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Owns the hidden full-resolution surface used for exports.
pub struct ExportPipeline {
    shaper: Box<dyn TextShaper>,
    surface: Option<RasterSurface>,
    max_dim: u32,
    clock: Box<dyn FnMut() -> u64>,
    last_stamp: u64,
}

impl ExportPipeline {
    /// Pipeline stamping exports with the wall clock.
    pub fn new(shaper: Box<dyn TextShaper>) -> Self {
        Self {
            shaper,
            surface: None,
            max_dim: EXPORT_MAX_DIM,
            clock: Box::new(wall_clock_ms),
            last_stamp: 0,
        }
    }

    /// Override the still-image cap.
    pub fn with_max_dim(mut self, max_dim: u32) -> Self {
        self.max_dim = max_dim.max(1);
        self
    }

    /// Replace the millisecond clock used in file names.
    pub fn with_clock(mut self, clock: impl FnMut() -> u64 + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Size of the export surface from the last successful export.
    pub fn surface_size(&self) -> Option<Size> {
        self.surface.as_ref().map(RasterSurface::size)
    }

    /// Render `source`'s current frame with both captions at export resolution and encode it.
    ///
    /// Video sources export the single current frame as PNG at the tier's size. On failure the
    /// export surface is discarded.
    #[tracing::instrument(skip_all, fields(kind = source.kind().label(), format = ?cfg.format))]
    pub fn export(
        &mut self,
        source: &FrameSource,
        top: &TextOverlay,
        bottom: &TextOverlay,
        cfg: &ExportConfig,
    ) -> ForgeResult<ExportedAsset> {
        cfg.validate()?;
        let result = self.export_inner(source, top, bottom, cfg);
        if let Err(err) = &result {
            self.surface = None;
            tracing::error!(%err, "export failed");
        }
        result
    }

    fn export_inner(
        &mut self,
        source: &FrameSource,
        top: &TextOverlay,
        bottom: &TextOverlay,
        cfg: &ExportConfig,
    ) -> ForgeResult<ExportedAsset> {
        let frame = source.require_frame()?;
        let is_video = source.kind().is_video();

        let (size, format) = if is_video {
            (cfg.resolution_tier.video_size(source.natural_size()), ExportFormat::Png)
        } else {
            let cap = match cfg.resolution_tier {
                ResolutionTier::OriginalCapped(n) => n,
                _ => self.max_dim,
            };
            (frame.size().cap_each(cap), cfg.format)
        };
        let effective = ExportConfig { format, ..*cfg };

        if self.surface_size() != Some(size) {
            self.surface = Some(RasterSurface::new(size)?);
        }
        let surface = self
            .surface
            .as_mut()
            .ok_or_else(|| ForgeError::render("export surface missing"))?;
        let factor = scale_factor(size)?;
        let scaled = [scaled_overlay(top, factor), scaled_overlay(bottom, factor)];
        render_scaled(surface, Some(frame), &scaled, self.shaper.as_mut())?;
        let bytes = encode_surface(surface, &effective)?;

        let stamp = self.next_stamp();
        let file_name = if is_video {
            format!("meme-frame-{}-{stamp}.png", cfg.resolution_tier.label())
        } else {
            format!("meme-{stamp}.{}", format.extension())
        };
        tracing::info!(%file_name, %size, bytes = bytes.len(), "export encoded");
        Ok(ExportedAsset {
            file_name,
            format,
            size,
            bytes,
        })
    }

    fn next_stamp(&mut self) -> u64 {
        let now = (self.clock)();
        self.last_stamp = now.max(self.last_stamp + 1);
        self.last_stamp
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/pipeline.rs"]
mod tests;
