use super::*;
use crate::render::text::BlockShaper;

fn pixel(surface: &RasterSurface, x: u32, y: u32) -> [u8; 4] {
    let w = surface.size().width;
    let i = ((y * w + x) * 4) as usize;
    let p = &surface.pixels_premul()[i..i + 4];
    [p[0], p[1], p[2], p[3]]
}

fn blue_frame() -> DecodedFrame {
    DecodedFrame::solid(100, 100, [0, 0, 255, 255]).unwrap()
}

#[test]
fn background_fills_surface_and_captions_are_painted() {
    let mut surface = RasterSurface::new(Size::new(500, 500)).unwrap();
    let top = TextOverlay::default_top();
    let bottom = TextOverlay::default_bottom();
    let outcome = render_overlays(
        &mut surface,
        Some(&blue_frame()),
        &top,
        &bottom,
        &mut BlockShaper,
    )
    .unwrap();
    assert_eq!(outcome, RenderOutcome::Rendered);

    assert_eq!(pixel(&surface, 5, 5), [0, 0, 255, 255]);
    assert_eq!(pixel(&surface, 495, 100), [0, 0, 255, 255]);
    // Center of the first glyph box of "TOP TEXT" at y = 250.
    assert_eq!(pixel(&surface, 149, 250), [255, 255, 255, 255]);
    // Center of the first glyph box of "BOTTOM TEXT" at y = 450.
    let bottom_left = (500.0 - 11.0 * 0.6 * 48.0) / 2.0;
    let x = (bottom_left + 0.3 * 48.0) as u32;
    assert_eq!(pixel(&surface, x, 450), [255, 255, 255, 255]);
}

#[test]
fn stroke_is_drawn_beneath_fill() {
    let mut surface = RasterSurface::new(Size::new(500, 500)).unwrap();
    let mut top = TextOverlay::default_top();
    top.stroke_width = 6.0;
    top.stroke_color = Rgba8::rgb(255, 0, 0);
    let mut bottom = TextOverlay::default_bottom();
    bottom.content.clear();
    render_overlays(&mut surface, Some(&blue_frame()), &top, &bottom, &mut BlockShaper).unwrap();

    // Glyph box for 'T' spans x in [137.2, 161.2]; its left edge carries the outline.
    assert_eq!(pixel(&surface, 149, 250), [255, 255, 255, 255]);
    let edge = pixel(&surface, 135, 250);
    assert_eq!(edge, [255, 0, 0, 255]);
}

#[test]
fn missing_background_is_a_noop() {
    let mut surface = RasterSurface::new(Size::new(50, 50)).unwrap();
    let outcome = render_overlays(
        &mut surface,
        None,
        &TextOverlay::default_top(),
        &TextOverlay::default_bottom(),
        &mut BlockShaper,
    )
    .unwrap();
    assert_eq!(outcome, RenderOutcome::Skipped);
    assert!(surface.pixels_premul().iter().all(|&b| b == 0));
}

#[test]
fn rendering_twice_is_pixel_identical() {
    let frame = DecodedFrame::from_straight_rgba8(
        4,
        2,
        (0..32u8).map(|v| v.wrapping_mul(37)).collect(),
    )
    .unwrap();
    let top = TextOverlay::new("IDEMPOTENT CAPTION TEXT", 20.0);
    let bottom = TextOverlay::default_bottom();

    let mut a = RasterSurface::new(Size::new(320, 200)).unwrap();
    let mut b = RasterSurface::new(Size::new(320, 200)).unwrap();
    render_overlays(&mut a, Some(&frame), &top, &bottom, &mut BlockShaper).unwrap();
    render_overlays(&mut b, Some(&frame), &top, &bottom, &mut BlockShaper).unwrap();
    let first = a.pixels_premul().to_vec();
    render_overlays(&mut a, Some(&frame), &top, &bottom, &mut BlockShaper).unwrap();
    assert_eq!(a.pixels_premul(), b.pixels_premul());
    assert_eq!(a.pixels_premul(), first.as_slice());
}

#[test]
fn multi_line_layout_is_symmetric_about_anchor() {
    let overlay = TextOverlay::new("A VERY LONG CAPTION THAT MUST WRAP", 50.0);
    let size = Size::new(500, 500);
    let scaled = scaled_overlay(&overlay, scale_factor(size).unwrap());
    let layout = layout_overlay(size, &scaled, &mut BlockShaper).unwrap();

    assert!(layout.lines.len() > 1);
    assert!((layout.line_height - 1.2 * 48.0).abs() < 1e-4);
    let first = layout.lines.first().unwrap().center_y;
    let last = layout.lines.last().unwrap().center_y;
    assert!(((first + last) / 2.0 - layout.anchor_y).abs() < 1e-6);
    for line in &layout.lines {
        let right_margin = 500.0 - (line.left + f64::from(line.width));
        assert!((line.left - right_margin).abs() < 1e-3);
    }
}

#[test]
fn single_line_sits_on_anchor() {
    let overlay = TextOverlay::new("HI", 90.0);
    let size = Size::new(1000, 400);
    let scaled = scaled_overlay(&overlay, scale_factor(size).unwrap());
    let layout = layout_overlay(size, &scaled, &mut BlockShaper).unwrap();
    assert_eq!(layout.lines.len(), 1);
    assert!((layout.lines[0].center_y - 360.0).abs() < 1e-9);
    assert!((layout.max_width - 900.0).abs() < 1e-3);
}

#[test]
fn line_bounds_cover_advance_and_pitch() {
    let overlay = TextOverlay::new("A VERY LONG CAPTION THAT MUST WRAP", 50.0);
    let size = Size::new(500, 500);
    let scaled = scaled_overlay(&overlay, scale_factor(size).unwrap());
    let layout = layout_overlay(size, &scaled, &mut BlockShaper).unwrap();

    for line in &layout.lines {
        assert!((line.bounds.x0 - line.left).abs() < 1e-9);
        assert!((line.bounds.width() - f64::from(line.width)).abs() < 1e-4);
        assert!((line.bounds.height() - layout.line_height).abs() < 1e-9);
        assert!((line.bounds.center().y - line.center_y).abs() < 1e-9);
    }
    let all = layout.bounds().unwrap();
    assert!(all.x0 >= 0.0 && all.x1 <= 500.0);
    assert!((all.height() - layout.line_height * layout.lines.len() as f64).abs() < 1e-6);

    let blank = TextOverlay::new("", 50.0);
    let empty = scaled_overlay(&blank, 1.0);
    assert!(layout_overlay(size, &empty, &mut BlockShaper).unwrap().bounds().is_none());
}

#[test]
fn scaling_law_between_surface_sizes() {
    let overlay = TextOverlay::default_top();
    let lay = |edge: u32| {
        let size = Size::new(edge, edge);
        let scaled = scaled_overlay(&overlay, scale_factor(size).unwrap());
        (scaled.unfloored_font_size, layout_overlay(size, &scaled, &mut BlockShaper).unwrap())
    };
    let (fs_small, small) = lay(500);
    let (fs_big, big) = lay(1000);
    assert_eq!(fs_big, 2.0 * fs_small);
    assert_eq!(big.anchor_y, 2.0 * small.anchor_y);
    assert_eq!(big.lines.len(), small.lines.len());
}
