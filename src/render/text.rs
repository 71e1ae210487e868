use crate::assets::fonts::{FontBytes, FontSource, find_system_font, load_font_file};
use crate::foundation::core::Rgba8;
use crate::foundation::error::{ForgeError, ForgeResult};

/// One caption line positioned on a surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineRun<'a> {
    /// Line text.
    pub text: &'a str,
    /// Left edge in surface pixels.
    pub left: f64,
    /// Vertical center in surface pixels.
    pub center_y: f64,
    /// Font size in surface pixels.
    pub font_size: f32,
}

/// How a line's glyphs are painted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GlyphPaint {
    /// Fill glyph interiors.
    Fill(Rgba8),
    /// Outline glyphs with a pen of the given width.
    Stroke {
        /// Pen color.
        color: Rgba8,
        /// Pen width in surface pixels.
        width: f32,
    },
}

/// Measures and paints caption lines.
pub trait TextShaper {
    /// Advance width of `text` at `font_size`, in surface pixels.
    fn measure(&mut self, text: &str, font_size: f32) -> ForgeResult<f32>;

    /// Paint one line into `ctx`.
    fn paint_line(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        line: &LineRun<'_>,
        paint: GlyphPaint,
    ) -> ForgeResult<()>;
}

/// Build the shaper for a configured font source.
///
/// System lookups that find nothing fall back to [`BlockShaper`] with a warning.
pub fn shaper_for(source: &FontSource) -> ForgeResult<Box<dyn TextShaper>> {
    match source {
        FontSource::Block => Ok(Box::new(BlockShaper)),
        FontSource::File { path } => font_shaper(load_font_file(path)?),
        FontSource::System { families } => match find_system_font(families) {
            Ok(bytes) => font_shaper(bytes),
            Err(err) => {
                tracing::warn!(%err, "falling back to block glyphs");
                Ok(Box::new(BlockShaper))
            }
        },
    }
}

fn font_shaper(bytes: FontBytes) -> ForgeResult<Box<dyn TextShaper>> {
    let shaper = FontShaper::new(bytes)?;
    tracing::info!(family = shaper.family_name(), "caption font selected");
    Ok(Box::new(shaper))
}

/// Greedy word wrap at whitespace boundaries.
///
/// Words are never split; a single word wider than `max_width` gets a line of its own.
pub fn wrap_words(
    content: &str,
    max_width: f32,
    font_size: f32,
    shaper: &mut dyn TextShaper,
) -> ForgeResult<Vec<String>> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in content.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if shaper.measure(&candidate, font_size)? <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    Ok(lines)
}

fn peniko_color(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn set_glyph_paint(ctx: &mut vello_cpu::RenderContext, paint: GlyphPaint) {
    match paint {
        GlyphPaint::Fill(color) => ctx.set_paint(peniko_color(color)),
        GlyphPaint::Stroke { color, width } => {
            ctx.set_stroke(
                vello_cpu::kurbo::Stroke::new(f64::from(width))
                    .with_join(vello_cpu::kurbo::Join::Round),
            );
            ctx.set_paint(peniko_color(color));
        }
    }
}

/// Font-independent shaper that draws every glyph as a box on a fixed-advance grid.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlockShaper;

impl BlockShaper {
    /// Horizontal advance per character, as a fraction of font size.
    pub const ADVANCE: f32 = 0.6;
    const GLYPH_WIDTH: f64 = 0.5;
    const GLYPH_HEIGHT: f64 = 0.7;
}

impl TextShaper for BlockShaper {
    fn measure(&mut self, text: &str, font_size: f32) -> ForgeResult<f32> {
        Ok(text.chars().count() as f32 * Self::ADVANCE * font_size)
    }

    fn paint_line(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        line: &LineRun<'_>,
        paint: GlyphPaint,
    ) -> ForgeResult<()> {
        let size = f64::from(line.font_size);
        let advance = f64::from(Self::ADVANCE) * size;
        let (gw, gh) = (Self::GLYPH_WIDTH * size, Self::GLYPH_HEIGHT * size);
        set_glyph_paint(ctx, paint);
        for (i, ch) in line.text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let x0 = line.left + i as f64 * advance + (advance - gw) / 2.0;
            let y0 = line.center_y - gh / 2.0;
            let rect = vello_cpu::kurbo::Rect::new(x0, y0, x0 + gw, y0 + gh);
            match paint {
                GlyphPaint::Fill(_) => ctx.fill_rect(&rect),
                GlyphPaint::Stroke { .. } => ctx.stroke_rect(&rect),
            }
        }
        Ok(())
    }
}

/// RGBA8 brush color carried through Parley layouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

/// Shaper backed by a real font: Parley shapes, `vello_cpu` rasterizes the outlines.
pub struct FontShaper {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
    font: vello_cpu::peniko::FontData,
}

impl FontShaper {
    /// Register font bytes and prepare layout contexts.
    pub fn new(bytes: FontBytes) -> ForgeResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.data.as_ref().clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            ForgeError::validation("no font families registered from font bytes")
        })?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ForgeError::validation("registered font family has no name"))?
            .to_string();

        let font = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(bytes.data.as_ref().clone()),
            bytes.index,
        );

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            font,
        })
    }

    /// Family name resolved from the font bytes.
    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    fn layout(&mut self, text: &str, size_px: f32) -> ForgeResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ForgeError::validation("text size must be finite and > 0"));
        }
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrushRgba8 {
            r: 255,
            g: 255,
            b: 255,
            a: 255,
        }));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

impl TextShaper for FontShaper {
    fn measure(&mut self, text: &str, font_size: f32) -> ForgeResult<f32> {
        Ok(self.layout(text, font_size)?.width())
    }

    fn paint_line(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        line: &LineRun<'_>,
        paint: GlyphPaint,
    ) -> ForgeResult<()> {
        let layout = self.layout(line.text, line.font_size)?;
        let top = line.center_y - f64::from(layout.height()) / 2.0;
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((line.left, top)));
        set_glyph_paint(ctx, paint);

        for layout_line in layout.lines() {
            for item in layout_line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                let builder = ctx.glyph_run(&self.font).font_size(run.run().font_size());
                match paint {
                    GlyphPaint::Fill(_) => builder.fill_glyphs(glyphs),
                    GlyphPaint::Stroke { .. } => builder.stroke_glyphs(glyphs),
                }
            }
        }

        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
