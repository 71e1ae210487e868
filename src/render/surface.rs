use std::sync::Arc;

use crate::assets::decode::DecodedFrame;
use crate::foundation::core::{Size, unpremultiply_rgba8_in_place};
use crate::foundation::error::{ForgeError, ForgeResult};

/// Fixed-size premultiplied RGBA8 pixel buffer that overlays are composited onto.
///
/// Each controller owns its surface exclusively; surfaces are never shared between the preview
/// and export paths.
pub struct RasterSurface {
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
}

impl std::fmt::Debug for RasterSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl RasterSurface {
    /// Allocate a transparent surface. Zero or oversized dimensions are rejected.
    pub fn new(size: Size) -> ForgeResult<Self> {
        let size = Size::non_empty(size.width, size.height)?;
        let width: u16 = size
            .width
            .try_into()
            .map_err(|_| ForgeError::validation("surface width exceeds u16"))?;
        let height: u16 = size
            .height
            .try_into()
            .map_err(|_| ForgeError::validation("surface height exceeds u16"))?;
        Ok(Self {
            width,
            height,
            pixmap: vello_cpu::Pixmap::new(width, height),
        })
    }

    /// Surface dimensions.
    pub fn size(&self) -> Size {
        Size::new(u32::from(self.width), u32::from(self.height))
    }

    /// Premultiplied RGBA8 pixels, row-major.
    pub fn pixels_premul(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    /// Straight-alpha copy of the surface for encoding.
    pub fn to_rgba_image(&self) -> ForgeResult<image::RgbaImage> {
        let mut data = self.pixels_premul().to_vec();
        unpremultiply_rgba8_in_place(&mut data);
        image::RgbaImage::from_raw(u32::from(self.width), u32::from(self.height), data)
            .ok_or_else(|| ForgeError::render("surface byte length mismatch"))
    }

    /// Reset every pixel to transparent black.
    pub fn clear(&mut self) {
        self.pixmap.data_as_u8_slice_mut().fill(0);
    }

    pub(crate) fn dims_u16(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub(crate) fn pixmap_mut(&mut self) -> &mut vello_cpu::Pixmap {
        &mut self.pixmap
    }
}

/// Convert a decoded frame into a `vello_cpu` image paint.
pub(crate) fn frame_to_image_paint(frame: &DecodedFrame) -> ForgeResult<vello_cpu::Image> {
    let size = frame.size();
    let w: u16 = size
        .width
        .try_into()
        .map_err(|_| ForgeError::render("frame width exceeds u16"))?;
    let h: u16 = size
        .height
        .try_into()
        .map_err(|_| ForgeError::render("frame height exceeds u16"))?;

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(size.width as usize * size.height as usize);
    for px in frame.rgba8_premul().chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, may_have_opacities);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
