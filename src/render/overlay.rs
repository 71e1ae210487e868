use crate::assets::decode::DecodedFrame;
use crate::foundation::core::{Rect, Rgba8, Size};
use crate::foundation::error::ForgeResult;
use crate::model::overlay::TextOverlay;
use crate::render::scale::{ScaledOverlay, scale_factor, scaled_overlay};
use crate::render::surface::{RasterSurface, frame_to_image_paint};
use crate::render::text::{GlyphPaint, LineRun, TextShaper, wrap_words};

/// Captions wrap within this fraction of the surface width.
pub const WRAP_WIDTH_RATIO: f32 = 0.9;
/// Line pitch as a multiple of font size.
pub const LINE_HEIGHT_RATIO: f64 = 1.2;

/// A wrapped caption line, centered horizontally.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionedLine {
    /// Line text.
    pub text: String,
    /// Measured advance width.
    pub width: f32,
    /// Left edge.
    pub left: f64,
    /// Vertical center.
    pub center_y: f64,
    /// Box spanning the advance width and one line pitch.
    pub bounds: Rect,
}

/// A caption fully resolved against one surface.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayLayout {
    /// Font size in surface pixels.
    pub font_size: f32,
    /// Outline width in surface pixels.
    pub stroke_width: f32,
    /// Fill color.
    pub color: Rgba8,
    /// Outline color.
    pub stroke_color: Rgba8,
    /// Anchor y the lines are stacked around.
    pub anchor_y: f64,
    /// Wrap width limit.
    pub max_width: f32,
    /// Distance between consecutive line centers.
    pub line_height: f64,
    /// Lines, top to bottom.
    pub lines: Vec<PositionedLine>,
}

impl OverlayLayout {
    /// Union of all line boxes, or `None` for an empty caption.
    pub fn bounds(&self) -> Option<Rect> {
        self.lines
            .iter()
            .map(|l| l.bounds)
            .reduce(|acc, r| acc.union(r))
    }
}

/// Result of a render call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The surface was repainted.
    Rendered,
    /// No background frame was ready; the surface was left untouched.
    Skipped,
}

/// Wrap and position a scaled caption on a surface of `size`.
pub fn layout_overlay(
    size: Size,
    overlay: &ScaledOverlay<'_>,
    shaper: &mut dyn TextShaper,
) -> ForgeResult<OverlayLayout> {
    let max_width = size.width as f32 * WRAP_WIDTH_RATIO;
    let texts = wrap_words(overlay.content, max_width, overlay.font_size, shaper)?;
    let line_height = LINE_HEIGHT_RATIO * f64::from(overlay.font_size);
    let anchor_y = overlay.anchor_y(size.height);
    let first_center = anchor_y - texts.len().saturating_sub(1) as f64 * line_height / 2.0;

    let mut lines = Vec::with_capacity(texts.len());
    for (i, text) in texts.into_iter().enumerate() {
        let width = shaper.measure(&text, overlay.font_size)?;
        let left = (f64::from(size.width) - f64::from(width)) / 2.0;
        let center_y = first_center + i as f64 * line_height;
        lines.push(PositionedLine {
            bounds: Rect::new(
                left,
                center_y - line_height / 2.0,
                left + f64::from(width),
                center_y + line_height / 2.0,
            ),
            left,
            center_y,
            width,
            text,
        });
    }

    Ok(OverlayLayout {
        font_size: overlay.font_size,
        stroke_width: overlay.stroke_width,
        color: overlay.color,
        stroke_color: overlay.stroke_color,
        anchor_y,
        max_width,
        line_height,
        lines,
    })
}

/// Composite `background` and both captions onto `surface`.
///
/// Captions are given in reference units and scaled to the surface. When `background` is
/// `None` (media not decoded yet) the call is a no-op.
pub fn render_overlays(
    surface: &mut RasterSurface,
    background: Option<&DecodedFrame>,
    top: &TextOverlay,
    bottom: &TextOverlay,
    shaper: &mut dyn TextShaper,
) -> ForgeResult<RenderOutcome> {
    let factor = scale_factor(surface.size())?;
    let scaled = [scaled_overlay(top, factor), scaled_overlay(bottom, factor)];
    render_scaled(surface, background, &scaled, shaper)
}

/// Composite `background` and already-scaled captions onto `surface`.
///
/// Layout happens before any pixel is touched, so a failing shaper leaves the surface intact.
#[tracing::instrument(skip_all, fields(size = %surface.size()))]
pub fn render_scaled(
    surface: &mut RasterSurface,
    background: Option<&DecodedFrame>,
    overlays: &[ScaledOverlay<'_>],
    shaper: &mut dyn TextShaper,
) -> ForgeResult<RenderOutcome> {
    let Some(background) = background else {
        tracing::trace!("background not ready, skipping render");
        return Ok(RenderOutcome::Skipped);
    };

    let size = surface.size();
    let mut layouts = Vec::with_capacity(overlays.len());
    for overlay in overlays {
        layouts.push(layout_overlay(size, overlay, shaper)?);
    }

    let (w, h) = surface.dims_u16();
    let mut ctx = vello_cpu::RenderContext::new(w, h);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    paint_background(&mut ctx, background, size)?;
    for layout in &layouts {
        paint_layout(&mut ctx, layout, shaper)?;
    }
    ctx.flush();

    surface.clear();
    ctx.render_to_pixmap(surface.pixmap_mut());
    Ok(RenderOutcome::Rendered)
}

fn paint_background(
    ctx: &mut vello_cpu::RenderContext,
    frame: &DecodedFrame,
    target: Size,
) -> ForgeResult<()> {
    let paint = frame_to_image_paint(frame)?;
    let src = frame.size();
    let (fw, fh) = (f64::from(src.width), f64::from(src.height));
    ctx.set_transform(vello_cpu::kurbo::Affine::scale_non_uniform(
        f64::from(target.width) / fw,
        f64::from(target.height) / fh,
    ));
    ctx.set_paint(paint);
    ctx.fill_rect(&rect_to_cpu(src.to_rect()));
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    Ok(())
}

// Stroke goes down first so the fill is never covered by the outline.
fn paint_layout(
    ctx: &mut vello_cpu::RenderContext,
    layout: &OverlayLayout,
    shaper: &mut dyn TextShaper,
) -> ForgeResult<()> {
    for line in &layout.lines {
        let run = LineRun {
            text: &line.text,
            left: line.left,
            center_y: line.center_y,
            font_size: layout.font_size,
        };
        if layout.stroke_width > 0.0 {
            shaper.paint_line(
                ctx,
                &run,
                GlyphPaint::Stroke {
                    color: layout.stroke_color,
                    width: layout.stroke_width,
                },
            )?;
        }
        shaper.paint_line(ctx, &run, GlyphPaint::Fill(layout.color))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/overlay.rs"]
mod tests;

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}
