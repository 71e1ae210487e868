use std::io::Cursor;

use crate::foundation::error::{ForgeError, ForgeResult};
use crate::model::export::{ExportConfig, ExportFormat};
use crate::render::surface::RasterSurface;

/// Matte used where a JPEG export has transparent pixels.
pub const JPEG_MATTE: [u8; 3] = [0, 0, 0];

/// Serialize `surface` in the configured format. PNG ignores quality.
#[tracing::instrument(skip_all, fields(format = ?cfg.format, size = %surface.size()))]
pub fn encode_surface(surface: &RasterSurface, cfg: &ExportConfig) -> ForgeResult<Vec<u8>> {
    match cfg.format {
        ExportFormat::Png => encode_png(surface),
        ExportFormat::Jpeg => encode_jpeg(surface, cfg.jpeg_quality()),
    }
}

fn encode_png(surface: &RasterSurface) -> ForgeResult<Vec<u8>> {
    let img = surface.to_rgba_image()?;
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ExportFormat::Png.image_format())
        .map_err(|e| ForgeError::encode(format!("png: {e}")))?;
    Ok(out.into_inner())
}

fn encode_jpeg(surface: &RasterSurface, quality: u8) -> ForgeResult<Vec<u8>> {
    let size = surface.size();
    let mut rgb = vec![0u8; size.width as usize * size.height as usize * 3];
    flatten_premul_to_rgb8(&mut rgb, surface.pixels_premul(), JPEG_MATTE)?;
    let img = image::RgbImage::from_raw(size.width, size.height, rgb)
        .ok_or_else(|| ForgeError::encode("jpeg: rgb buffer length mismatch"))?;

    let mut out = Cursor::new(Vec::with_capacity(size.rgba_len() / 8));
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality);
    encoder
        .encode_image(&img)
        .map_err(|e| ForgeError::encode(format!("jpeg: {e}")))?;
    Ok(out.into_inner())
}

/// Composite premultiplied RGBA8 over an opaque matte into packed RGB8.
pub(crate) fn flatten_premul_to_rgb8(dst: &mut [u8], src: &[u8], matte: [u8; 3]) -> ForgeResult<()> {
    if !src.len().is_multiple_of(4) || dst.len() != src.len() / 4 * 3 {
        return Err(ForgeError::encode(
            "flatten expects rgba8 input and a matching rgb8 output",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(3).zip(src.chunks_exact(4)) {
        let inv = 255u16 - u16::from(s[3]);
        for c in 0..3 {
            let v = u16::from(s[c]) + mul_div255(u16::from(matte[c]), inv);
            d[c] = v.min(255) as u8;
        }
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

#[cfg(test)]
#[path = "../../tests/unit/export/encode.rs"]
mod tests;
