//! Memeforge composites styled caption overlays onto images and video frames.
//!
//! The API is session-oriented:
//!
//! - Create a [`Session`] from an [`EngineConfig`]
//! - Select a [`MediaSource`] and edit the two [`TextOverlay`] captions; the preview surface
//!   (at most 600x600) re-renders on every edit
//! - Drive video previews with [`Session::play`], [`Session::refresh_tick`] and
//!   [`Session::pause`]
//! - Export the current frame at full resolution with an [`ExportConfig`]
//!
//! Caption size and position are expressed against a 500px reference height and scaled to
//! each target surface, so the preview and the export compose identically.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;

pub(crate) mod config;
pub(crate) mod export;
pub(crate) mod model;
pub(crate) mod preview;
pub(crate) mod render;
pub(crate) mod session;
pub(crate) mod source;

pub use crate::foundation::core::{Rect, Rgba8, Size};
pub use crate::foundation::error::{ForgeError, ForgeResult};

pub use crate::assets::decode::{DecodedFrame, MAX_FRAME_DIM, decode_image};
pub use crate::assets::fonts::{
    DEFAULT_CAPTION_FAMILIES, FontBytes, FontSource, find_system_font, load_font_file,
};
pub use crate::assets::media::{FfmpegTools, VideoSourceInfo, probe_video};
pub use crate::config::{ENV_FFMPEG, ENV_FFPROBE, ENV_FONT, ENV_REFRESH_HZ, EngineConfig};
pub use crate::export::encode::encode_surface;
pub use crate::export::pipeline::{EXPORT_MAX_DIM, ExportPipeline, ExportedAsset};
pub use crate::model::export::{ExportConfig, ExportFormat, ResolutionTier};
pub use crate::model::media::{MediaKind, MediaLocator, MediaSource};
pub use crate::model::overlay::{DEFAULT_BOTTOM_TEXT, DEFAULT_TOP_TEXT, OverlayPair, TextOverlay};
pub use crate::preview::controller::{
    DEFAULT_REFRESH_INTERVAL, PREVIEW_MAX_DIM, PreviewController, PreviewState,
};
pub use crate::preview::scheduler::{FrameHandle, RefreshScheduler};
pub use crate::render::overlay::{
    LINE_HEIGHT_RATIO, OverlayLayout, PositionedLine, RenderOutcome, WRAP_WIDTH_RATIO,
    layout_overlay, render_overlays, render_scaled,
};
pub use crate::render::scale::{
    MIN_FONT_SIZE, REFERENCE_HEIGHT, ScaledOverlay, scale_factor, scaled_overlay,
};
pub use crate::render::surface::RasterSurface;
pub use crate::render::text::{
    BlockShaper, FontShaper, GlyphPaint, LineRun, TextBrushRgba8, TextShaper, shaper_for,
    wrap_words,
};
pub use crate::session::{Notice, NoticeKind, Session};
pub use crate::source::ffmpeg::FfmpegVideoDecoder;
pub use crate::source::{FrameSource, StaticFrameSource, VideoDecoder, VideoFrameSource};
