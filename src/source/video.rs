use std::time::Duration;

use crate::assets::decode::DecodedFrame;
use crate::foundation::core::Size;
use crate::foundation::error::ForgeResult;

/// A streaming video decoder.
///
/// Calls are cooperative: each one does a bounded amount of work and returns.
pub trait VideoDecoder {
    /// Natural frame dimensions, or `None` while metadata is still loading.
    fn load_metadata(&mut self) -> ForgeResult<Option<Size>>;

    /// Next decoded frame in presentation order, or `None` when none is available (end of
    /// stream, or nothing new yet).
    fn next_frame(&mut self) -> ForgeResult<Option<DecodedFrame>>;

    /// Nominal frames per second, once metadata is known. `None` means one frame per refresh.
    fn frame_rate(&self) -> Option<f64> {
        None
    }

    /// Playback started.
    fn on_play(&mut self) {}

    /// Playback paused.
    fn on_pause(&mut self) {}
}

/// Video media exposing the most recently decoded frame and play/pause state.
pub struct VideoFrameSource {
    decoder: Box<dyn VideoDecoder>,
    dims: Option<Size>,
    current: Option<DecodedFrame>,
    playing: bool,
    frames_decoded: u64,
    clock: Duration,
}

impl std::fmt::Debug for VideoFrameSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoFrameSource")
            .field("dims", &self.dims)
            .field("has_frame", &self.current.is_some())
            .field("playing", &self.playing)
            .field("frames_decoded", &self.frames_decoded)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl VideoFrameSource {
    /// Wrap a decoder. Nothing is decoded until [`VideoFrameSource::poll`].
    pub fn new(decoder: Box<dyn VideoDecoder>) -> Self {
        Self {
            decoder,
            dims: None,
            current: None,
            playing: false,
            frames_decoded: 0,
            clock: Duration::ZERO,
        }
    }

    /// Load metadata, then the first frame. Returns readiness.
    pub fn poll(&mut self) -> ForgeResult<bool> {
        if self.dims.is_none() {
            self.dims = self.decoder.load_metadata()?;
        }
        if self.dims.is_some() && self.current.is_none() {
            self.pull_frame()?;
        }
        Ok(self.is_ready())
    }

    /// Metadata and a first frame are both available.
    pub fn is_ready(&self) -> bool {
        self.dims.is_some() && self.current.is_some()
    }

    /// Start playback. No-op when already playing.
    pub fn play(&mut self) {
        if !self.playing {
            self.playing = true;
            self.decoder.on_play();
        }
    }

    /// Pause playback. No-op when already paused.
    pub fn pause(&mut self) {
        if self.playing {
            self.playing = false;
            self.decoder.on_pause();
        }
    }

    /// Whether playback is running.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Advance the media clock by `elapsed` while playing and pull every frame that is due.
    ///
    /// Frames whose presentation time has already passed are decoded and dropped, so playback
    /// keeps real time when refreshes are slower than the video. Without a frame rate, one
    /// frame is pulled per call. Returns whether the current frame changed.
    pub fn advance(&mut self, elapsed: Duration) -> ForgeResult<bool> {
        if !self.playing {
            return Ok(false);
        }
        self.clock += elapsed;
        let Some(fps) = self.decoder.frame_rate().filter(|f| f.is_finite() && *f > 0.0) else {
            return self.pull_frame();
        };

        let clock = self.clock.as_secs_f64();
        let mut changed = false;
        // Frame k is presented at k / fps; the first frame (k = 0) is shown on load.
        while (self.frames_decoded as f64) / fps <= clock {
            if !self.pull_frame()? {
                break;
            }
            changed = true;
        }
        Ok(changed)
    }

    /// Playback position: the sum of elapsed time passed to [`VideoFrameSource::advance`].
    pub fn media_time(&self) -> Duration {
        self.clock
    }

    fn pull_frame(&mut self) -> ForgeResult<bool> {
        match self.decoder.next_frame()? {
            Some(frame) => {
                self.current = Some(frame);
                self.frames_decoded += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Most recently decoded frame.
    pub fn current_frame(&self) -> Option<&DecodedFrame> {
        self.current.as_ref()
    }

    /// Decoder-reported dimensions; `None` until metadata has loaded.
    pub fn natural_dimensions(&self) -> Option<Size> {
        self.dims
    }

    /// Frames pulled from the decoder so far.
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }
}
