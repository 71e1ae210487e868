use std::time::Duration;

use crate::foundation::error::{ForgeError, ForgeResult};
use crate::model::overlay::OverlayPair;
use crate::preview::scheduler::{FrameHandle, RefreshScheduler};
use crate::render::overlay::{RenderOutcome, render_overlays};
use crate::render::surface::RasterSurface;
use crate::render::text::TextShaper;
use crate::source::FrameSource;

/// Largest edge of the interactive preview surface.
pub const PREVIEW_MAX_DIM: u32 = 600;

/// Refresh interval of a 60 Hz display.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_nanos(1_000_000_000 / 60);

/// Preview lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreviewState {
    /// No media selected.
    Empty,
    /// Media selected, waiting for decode/metadata.
    Loading,
    /// Rendered and idle.
    Ready,
    /// Video playing; the render loop is scheduled.
    Playing,
    /// Video paused; no render loop.
    Paused,
}

/// Owns the low-resolution preview surface and keeps it in sync with media and caption edits.
///
/// Caption state is never stored here: every entry point that may render takes the current
/// [`OverlayPair`] explicitly.
pub struct PreviewController {
    state: PreviewState,
    source: Option<FrameSource>,
    surface: Option<RasterSurface>,
    shaper: Box<dyn TextShaper>,
    scheduler: RefreshScheduler,
    active_loop: Option<FrameHandle>,
    max_dim: u32,
    refresh_interval: Duration,
    renders: u64,
}

impl PreviewController {
    /// Create an empty controller.
    pub fn new(shaper: Box<dyn TextShaper>) -> Self {
        Self {
            state: PreviewState::Empty,
            source: None,
            surface: None,
            shaper,
            scheduler: RefreshScheduler::new(),
            active_loop: None,
            max_dim: PREVIEW_MAX_DIM,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            renders: 0,
        }
    }

    /// Override the preview size cap.
    pub fn with_max_dim(mut self, max_dim: u32) -> Self {
        self.max_dim = max_dim.max(1);
        self
    }

    /// Media time that passes between two refresh callbacks.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PreviewState {
        self.state
    }

    /// The visible preview surface, once media is ready.
    pub fn surface(&self) -> Option<&RasterSurface> {
        self.surface.as_ref()
    }

    /// The selected frame source.
    pub fn source(&self) -> Option<&FrameSource> {
        self.source.as_ref()
    }

    /// Number of completed preview renders.
    pub fn renders(&self) -> u64 {
        self.renders
    }

    /// Render loops currently scheduled; never more than one.
    pub fn scheduled_loops(&self) -> usize {
        self.scheduler.pending()
    }

    /// Select new media. Any running loop for the previous media is cancelled first.
    pub fn select(&mut self, source: FrameSource) {
        self.stop_loop();
        tracing::debug!(kind = source.kind().label(), "preview media selected");
        self.source = Some(source);
        self.surface = None;
        self.state = PreviewState::Loading;
    }

    /// Drop the media and return to [`PreviewState::Empty`].
    pub fn reset(&mut self) {
        self.stop_loop();
        self.source = None;
        self.surface = None;
        self.state = PreviewState::Empty;
    }

    /// Service readiness while loading; renders once when the media becomes ready.
    ///
    /// Decode failures are returned and leave the controller in [`PreviewState::Loading`].
    pub fn poll(&mut self, overlays: &OverlayPair) -> ForgeResult<PreviewState> {
        if self.state != PreviewState::Loading {
            return Ok(self.state);
        }
        let Some(source) = self.source.as_mut() else {
            return Ok(self.state);
        };
        if let Err(err) = source.poll() {
            tracing::warn!(%err, "preview media failed to load");
            return Err(err);
        }
        if !source.is_ready() {
            return Ok(self.state);
        }
        let natural = source
            .natural_size()
            .ok_or_else(|| ForgeError::decode("ready media reported no dimensions"))?;

        // The surface is only committed once the first render succeeds.
        let size = natural.fit_within(self.max_dim);
        let mut surface = RasterSurface::new(size)?;
        let frame = self.source.as_ref().and_then(FrameSource::current_frame);
        let outcome = render_overlays(
            &mut surface,
            frame,
            &overlays.top,
            &overlays.bottom,
            self.shaper.as_mut(),
        )
        .inspect_err(|err| tracing::warn!(%err, "preview media could not be drawn"))?;
        if outcome == RenderOutcome::Rendered {
            self.renders += 1;
        }
        self.surface = Some(surface);
        self.state = PreviewState::Ready;
        tracing::debug!(%natural, preview = %size, "preview ready");
        Ok(self.state)
    }

    /// Start video playback and its per-refresh render loop.
    pub fn play(&mut self) -> ForgeResult<()> {
        match self.state {
            PreviewState::Playing => return Ok(()),
            PreviewState::Ready | PreviewState::Paused => {}
            PreviewState::Empty | PreviewState::Loading => {
                return Err(ForgeError::validation("no ready media to play"));
            }
        }
        let video = self
            .source
            .as_mut()
            .and_then(FrameSource::as_video_mut)
            .ok_or_else(|| ForgeError::validation("only video media can play"))?;
        video.play();
        self.state = PreviewState::Playing;
        self.start_loop();
        Ok(())
    }

    /// Pause playback, cancelling the scheduled render before returning.
    pub fn pause(&mut self) {
        if self.state != PreviewState::Playing {
            return;
        }
        self.stop_loop();
        if let Some(video) = self.source.as_mut().and_then(FrameSource::as_video_mut) {
            video.pause();
        }
        self.state = PreviewState::Paused;
    }

    /// Re-render after a caption edit. Only idle states render; a playing loop picks the edit
    /// up on its next tick.
    pub fn overlays_changed(&mut self, overlays: &OverlayPair) -> ForgeResult<bool> {
        match self.state {
            PreviewState::Ready | PreviewState::Paused => {
                Ok(self.render(overlays)? == RenderOutcome::Rendered)
            }
            _ => Ok(false),
        }
    }

    /// Display-refresh callback. Renders the current video frame when the loop is due.
    ///
    /// A decode failure while playing pauses the preview and is returned.
    pub fn on_refresh(&mut self, overlays: &OverlayPair) -> ForgeResult<bool> {
        let mut rendered = false;
        for handle in self.scheduler.take_due() {
            if self.active_loop != Some(handle) || self.state != PreviewState::Playing {
                continue;
            }
            self.active_loop = None;

            let advanced = match self.source.as_mut().and_then(FrameSource::as_video_mut) {
                Some(video) => video.advance(self.refresh_interval),
                None => Ok(false),
            };
            if let Err(err) = advanced {
                tracing::warn!(%err, "video frame decode failed, pausing preview");
                self.pause();
                return Err(err);
            }

            self.active_loop = Some(self.scheduler.request_frame());
            rendered |= self.render(overlays)? == RenderOutcome::Rendered;
        }
        Ok(rendered)
    }

    fn render(&mut self, overlays: &OverlayPair) -> ForgeResult<RenderOutcome> {
        let (Some(surface), Some(source)) = (self.surface.as_mut(), self.source.as_ref()) else {
            return Ok(RenderOutcome::Skipped);
        };
        let outcome = render_overlays(
            surface,
            source.current_frame(),
            &overlays.top,
            &overlays.bottom,
            self.shaper.as_mut(),
        )?;
        if outcome == RenderOutcome::Rendered {
            self.renders += 1;
        }
        Ok(outcome)
    }

    fn start_loop(&mut self) {
        self.stop_loop();
        self.active_loop = Some(self.scheduler.request_frame());
    }

    fn stop_loop(&mut self) {
        if let Some(handle) = self.active_loop.take() {
            self.scheduler.cancel(handle);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/preview/controller.rs"]
mod tests;
