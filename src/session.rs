//! Explicit session context: caption state, media selection and both output paths.

use crate::config::EngineConfig;
use crate::export::pipeline::{ExportPipeline, ExportedAsset};
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::model::export::ExportConfig;
use crate::model::media::MediaSource;
use crate::model::overlay::{OverlayPair, TextOverlay};
use crate::preview::controller::{PreviewController, PreviewState};
use crate::render::text::shaper_for;
use crate::source::FrameSource;

/// Category of a user-visible failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    /// Media could not be read or decoded.
    Decode,
    /// The export could not be encoded or written.
    Encode,
    /// A request was rejected before any work started.
    Invalid,
    /// Anything else.
    Internal,
}

/// A failure reported to the user. The session stays usable afterwards.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("{message}")]
pub struct Notice {
    /// Failure category.
    pub kind: NoticeKind,
    /// Human-readable description.
    pub message: String,
}

impl Notice {
    fn from_error(err: &ForgeError) -> Self {
        let kind = match err {
            ForgeError::Decode(_) => NoticeKind::Decode,
            ForgeError::Encode(_) => NoticeKind::Encode,
            ForgeError::Validation(_) | ForgeError::Serde(_) => NoticeKind::Invalid,
            ForgeError::Render(_) | ForgeError::Other(_) => NoticeKind::Internal,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

fn notice(context: &'static str, err: ForgeError) -> Notice {
    let n = Notice::from_error(&err);
    match n.kind {
        NoticeKind::Encode | NoticeKind::Internal => tracing::error!(%err, "{context}"),
        NoticeKind::Decode | NoticeKind::Invalid => tracing::warn!(%err, "{context}"),
    }
    n
}

/// One editing session.
///
/// Captions live here and are handed to the preview and export paths on every call.
pub struct Session {
    config: EngineConfig,
    overlays: OverlayPair,
    media: Option<MediaSource>,
    preview: PreviewController,
    export: ExportPipeline,
}

impl Session {
    /// Start a session with default captions and no media.
    pub fn new(config: EngineConfig) -> ForgeResult<Self> {
        config.validate()?;
        let preview = PreviewController::new(shaper_for(&config.font)?)
            .with_max_dim(config.preview_max_dim)
            .with_refresh_interval(config.refresh_interval());
        let export =
            ExportPipeline::new(shaper_for(&config.font)?).with_max_dim(config.export_max_dim);
        Ok(Self {
            config,
            overlays: OverlayPair::default(),
            media: None,
            preview,
            export,
        })
    }

    /// Replace the export pipeline, e.g. to install a fixed clock.
    pub fn with_export_pipeline(mut self, export: ExportPipeline) -> Self {
        self.export = export;
        self
    }

    /// Engine settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current captions.
    pub fn overlays(&self) -> &OverlayPair {
        &self.overlays
    }

    /// Selected media, if any.
    pub fn media(&self) -> Option<&MediaSource> {
        self.media.as_ref()
    }

    /// The preview controller.
    pub fn preview(&self) -> &PreviewController {
        &self.preview
    }

    /// Preview lifecycle state.
    pub fn state(&self) -> PreviewState {
        self.preview.state()
    }

    /// Select media and try to bring the preview up.
    ///
    /// Unreadable locators leave the preview empty; undecodable bytes leave it loading.
    pub fn select_media(&mut self, media: MediaSource) -> Result<PreviewState, Notice> {
        match FrameSource::open(&media, &self.config.ffmpeg_tools()) {
            Ok(source) => {
                self.preview.select(source);
                self.media = Some(media);
                self.poll()
            }
            Err(err) => self.clear_media_with(notice("media could not be opened", err)),
        }
    }

    /// Select an already constructed frame source. It has no locator, so [`Session::media`]
    /// becomes `None`.
    pub fn select_frame_source(&mut self, source: FrameSource) -> Result<PreviewState, Notice> {
        self.media = None;
        self.preview.select(source);
        self.poll()
    }

    /// Service pending media readiness.
    pub fn poll(&mut self) -> Result<PreviewState, Notice> {
        self.preview
            .poll(&self.overlays)
            .map_err(|e| notice("media failed to load", e))
    }

    /// Drop the selected media.
    pub fn clear_media(&mut self) {
        self.media = None;
        self.preview.reset();
    }

    fn clear_media_with(&mut self, notice: Notice) -> Result<PreviewState, Notice> {
        self.clear_media();
        Err(notice)
    }

    /// Replace the top caption.
    pub fn set_top(&mut self, top: TextOverlay) -> Result<bool, Notice> {
        self.edit_overlays(|pair| pair.top = top)
    }

    /// Replace the bottom caption.
    pub fn set_bottom(&mut self, bottom: TextOverlay) -> Result<bool, Notice> {
        self.edit_overlays(|pair| pair.bottom = bottom)
    }

    /// Apply an edit to both captions and refresh the preview.
    ///
    /// Invalid edits are rejected without touching the current captions. Returns whether the
    /// preview re-rendered.
    pub fn edit_overlays(&mut self, edit: impl FnOnce(&mut OverlayPair)) -> Result<bool, Notice> {
        let mut next = self.overlays.clone();
        edit(&mut next);
        next.validate()
            .map_err(|e| notice("caption edit rejected", e))?;
        self.overlays = next;
        self.preview
            .overlays_changed(&self.overlays)
            .map_err(|e| notice("preview render failed", e))
    }

    /// Restore default caption text, keeping styles.
    pub fn reset_captions(&mut self) -> Result<bool, Notice> {
        self.edit_overlays(OverlayPair::reset_content)
    }

    /// Replace both caption texts with externally generated ones.
    pub fn apply_generated_captions(
        &mut self,
        top: impl Into<String>,
        bottom: impl Into<String>,
    ) -> Result<bool, Notice> {
        let (top, bottom) = (top.into(), bottom.into());
        self.edit_overlays(|pair| {
            pair.top.content = top;
            pair.bottom.content = bottom;
        })
    }

    /// Start video playback.
    pub fn play(&mut self) -> Result<(), Notice> {
        self.preview
            .play()
            .map_err(|e| notice("playback could not start", e))
    }

    /// Pause video playback.
    pub fn pause(&mut self) {
        self.preview.pause();
    }

    /// Display-refresh tick. Returns whether a frame was rendered.
    pub fn refresh_tick(&mut self) -> Result<bool, Notice> {
        self.preview
            .on_refresh(&self.overlays)
            .map_err(|e| notice("video playback failed", e))
    }

    /// Export the current frame with the current captions.
    pub fn export(&mut self, cfg: &ExportConfig) -> Result<ExportedAsset, Notice> {
        let Some(source) = self.preview.source() else {
            return Err(notice(
                "export rejected",
                ForgeError::validation("no media selected"),
            ));
        };
        self.export
            .export(source, &self.overlays.top, &self.overlays.bottom, cfg)
            .map_err(|e| notice("export failed", e))
    }
}

#[cfg(test)]
#[path = "../tests/unit/session.rs"]
mod tests;
