use std::io::Cursor;
use std::sync::Arc;

use image::AnimationDecoder as _;

use crate::foundation::core::{Size, premultiply_rgba8_in_place};
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::model::media::MediaKind;

/// Largest width or height a frame may have to still be drawable.
pub const MAX_FRAME_DIM: u32 = u16::MAX as u32;

/// A decoded bitmap in premultiplied RGBA8 form.
///
/// Cloning is cheap; pixel data is shared.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedFrame {
    size: Size,
    rgba8_premul: Arc<Vec<u8>>,
}

impl DecodedFrame {
    /// Wrap straight-alpha RGBA8 pixels, premultiplying them.
    ///
    /// Frames with an edge longer than [`MAX_FRAME_DIM`] are rejected as unsupported media.
    pub fn from_straight_rgba8(width: u32, height: u32, mut rgba: Vec<u8>) -> ForgeResult<Self> {
        let size = Size::non_empty(width, height)?;
        check_drawable(size)?;
        if rgba.len() != size.rgba_len() {
            return Err(ForgeError::decode(format!(
                "frame byte length mismatch: got {}, expected {} for {size}",
                rgba.len(),
                size.rgba_len()
            )));
        }
        premultiply_rgba8_in_place(&mut rgba);
        Ok(Self {
            size,
            rgba8_premul: Arc::new(rgba),
        })
    }

    /// Solid-color frame, mostly useful for tests and placeholders.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> ForgeResult<Self> {
        let size = Size::non_empty(width, height)?;
        check_drawable(size)?;
        let data = rgba.repeat(size.width as usize * size.height as usize);
        Self::from_straight_rgba8(width, height, data)
    }

    /// Frame dimensions.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Premultiplied RGBA8 bytes, row-major, tightly packed.
    pub fn rgba8_premul(&self) -> &[u8] {
        &self.rgba8_premul
    }
}

fn check_drawable(size: Size) -> ForgeResult<()> {
    if size.width > MAX_FRAME_DIM || size.height > MAX_FRAME_DIM {
        return Err(ForgeError::decode(format!(
            "{size} frame exceeds the {MAX_FRAME_DIM}px drawable limit"
        )));
    }
    Ok(())
}

/// Decode still or animated image bytes into a frame.
///
/// Animated images yield their first composited frame.
#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
pub fn decode_image(bytes: &[u8], kind: MediaKind) -> ForgeResult<DecodedFrame> {
    let rgba = match kind {
        MediaKind::AnimatedImage => decode_first_gif_frame(bytes)?,
        MediaKind::Image => image::load_from_memory(bytes)
            .map_err(|e| ForgeError::decode(format!("decode image from memory: {e}")))?
            .to_rgba8(),
        MediaKind::Video => {
            return Err(ForgeError::decode(
                "video media cannot be decoded as a still image",
            ));
        }
    };
    let (width, height) = rgba.dimensions();
    DecodedFrame::from_straight_rgba8(width, height, rgba.into_raw())
}

fn decode_first_gif_frame(bytes: &[u8]) -> ForgeResult<image::RgbaImage> {
    let decoder = image::codecs::gif::GifDecoder::new(Cursor::new(bytes))
        .map_err(|e| ForgeError::decode(format!("decode gif header: {e}")))?;
    let frame = decoder
        .into_frames()
        .next()
        .ok_or_else(|| ForgeError::decode("gif contains no frames"))?
        .map_err(|e| ForgeError::decode(format!("decode gif frame: {e}")))?;
    Ok(frame.into_buffer())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
