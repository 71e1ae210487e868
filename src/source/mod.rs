//! Frame sources: a uniform "current decoded frame" view over still images and video.

pub(crate) mod ffmpeg;
pub(crate) mod video;

use std::sync::Arc;

use crate::assets::decode::{DecodedFrame, decode_image};
use crate::foundation::core::Size;
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::model::media::{MediaKind, MediaSource};

pub use video::{VideoDecoder, VideoFrameSource};

#[derive(Debug)]
enum StaticState {
    Pending(Arc<[u8]>),
    Decoded(DecodedFrame),
    Failed(String),
}

/// A still or animated image, decoded once on first poll.
#[derive(Debug)]
pub struct StaticFrameSource {
    kind: MediaKind,
    state: StaticState,
}

impl StaticFrameSource {
    /// Wrap encoded bytes; decoding is deferred to [`StaticFrameSource::poll`].
    pub fn from_bytes(kind: MediaKind, bytes: Arc<[u8]>) -> Self {
        Self {
            kind,
            state: StaticState::Pending(bytes),
        }
    }

    /// Wrap an already decoded frame.
    pub fn from_frame(kind: MediaKind, frame: DecodedFrame) -> Self {
        Self {
            kind,
            state: StaticState::Decoded(frame),
        }
    }

    /// Decode pending bytes. A failure is reported once; later polls stay not-ready.
    pub fn poll(&mut self) -> ForgeResult<bool> {
        if let StaticState::Pending(bytes) = &self.state {
            match decode_image(bytes, self.kind) {
                Ok(frame) => self.state = StaticState::Decoded(frame),
                Err(err) => {
                    self.state = StaticState::Failed(match &err {
                        ForgeError::Decode(msg) => msg.clone(),
                        other => other.to_string(),
                    });
                    return Err(err);
                }
            }
        }
        Ok(self.is_ready())
    }

    /// Whether a frame is available.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, StaticState::Decoded(_))
    }

    /// The decoded bitmap; the same frame on every call.
    pub fn current_frame(&self) -> Option<&DecodedFrame> {
        match &self.state {
            StaticState::Decoded(frame) => Some(frame),
            _ => None,
        }
    }

    /// Message of the decode failure, if decoding failed.
    pub fn failure(&self) -> Option<&str> {
        match &self.state {
            StaticState::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Media-kind dispatch, decided once at selection time.
pub enum FrameSource {
    /// Image or animated image.
    Static(StaticFrameSource),
    /// Streaming video.
    Video(VideoFrameSource),
}

impl std::fmt::Debug for FrameSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(s) => f.debug_tuple("Static").field(s).finish(),
            Self::Video(v) => f.debug_tuple("Video").field(v).finish(),
        }
    }
}

impl FrameSource {
    /// Open a frame source for selected media.
    ///
    /// Video files get an [`ffmpeg::FfmpegVideoDecoder`]; the process is only started once
    /// the source is polled.
    pub fn open(media: &MediaSource, tools: &crate::assets::media::FfmpegTools) -> ForgeResult<Self> {
        match media.kind() {
            MediaKind::Image | MediaKind::AnimatedImage => Ok(Self::Static(
                StaticFrameSource::from_bytes(media.kind(), media.locator().read_bytes()?),
            )),
            MediaKind::Video => {
                let decoder = ffmpeg::FfmpegVideoDecoder::new(tools.clone(), media.locator())?;
                Ok(Self::Video(VideoFrameSource::new(Box::new(decoder))))
            }
        }
    }

    /// Wrap a custom video decoder.
    pub fn video(decoder: Box<dyn VideoDecoder>) -> Self {
        Self::Video(VideoFrameSource::new(decoder))
    }

    /// Media kind of this source.
    pub fn kind(&self) -> MediaKind {
        match self {
            Self::Static(s) => s.kind,
            Self::Video(_) => MediaKind::Video,
        }
    }

    /// Service pending readiness work (decode, metadata load, first frame).
    pub fn poll(&mut self) -> ForgeResult<bool> {
        match self {
            Self::Static(s) => s.poll(),
            Self::Video(v) => v.poll(),
        }
    }

    /// Whether [`FrameSource::current_frame`] is meaningful.
    pub fn is_ready(&self) -> bool {
        match self {
            Self::Static(s) => s.is_ready(),
            Self::Video(v) => v.is_ready(),
        }
    }

    /// Most recent decoded frame.
    pub fn current_frame(&self) -> Option<&DecodedFrame> {
        match self {
            Self::Static(s) => s.current_frame(),
            Self::Video(v) => v.current_frame(),
        }
    }

    /// Natural media dimensions, once known.
    pub fn natural_size(&self) -> Option<Size> {
        match self {
            Self::Static(s) => s.current_frame().map(|f| f.size()),
            Self::Video(v) => v.natural_dimensions(),
        }
    }

    /// Video capabilities, when this is a video source.
    pub fn as_video_mut(&mut self) -> Option<&mut VideoFrameSource> {
        match self {
            Self::Video(v) => Some(v),
            Self::Static(_) => None,
        }
    }

    /// Current frame or a decode error explaining why none is available.
    pub fn require_frame(&self) -> ForgeResult<&DecodedFrame> {
        self.current_frame().ok_or_else(|| match self {
            Self::Static(s) => match s.failure() {
                Some(msg) => ForgeError::decode(msg.to_string()),
                None => ForgeError::decode("image is not decoded yet"),
            },
            Self::Video(_) => ForgeError::decode("no video frame decoded yet"),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/mod.rs"]
mod tests;
