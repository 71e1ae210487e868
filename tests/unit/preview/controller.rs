use std::cell::Cell;
use std::io::Cursor;
use std::rc::Rc;
use std::sync::Arc;

use super::*;
use crate::assets::decode::DecodedFrame;
use crate::foundation::core::Size;
use crate::model::media::MediaKind;
use crate::render::text::{BlockShaper, GlyphPaint, LineRun, TextShaper};
use crate::source::{StaticFrameSource, VideoDecoder};

fn controller() -> PreviewController {
    PreviewController::new(Box::new(BlockShaper))
}

fn png_bytes(w: u32, h: u32) -> Arc<[u8]> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([40, 90, 160, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf.into()
}

fn still(w: u32, h: u32) -> FrameSource {
    FrameSource::Static(StaticFrameSource::from_bytes(MediaKind::Image, png_bytes(w, h)))
}

/// Endless decoder counting how many frames were pulled.
struct CountingDecoder {
    size: Size,
    pulled: Rc<Cell<u32>>,
    fail_after: Option<u32>,
}

impl VideoDecoder for CountingDecoder {
    fn load_metadata(&mut self) -> ForgeResult<Option<Size>> {
        Ok(Some(self.size))
    }

    fn next_frame(&mut self) -> ForgeResult<Option<DecodedFrame>> {
        let n = self.pulled.get();
        if self.fail_after.is_some_and(|limit| n >= limit) {
            return Err(ForgeError::decode("corrupt packet"));
        }
        self.pulled.set(n + 1);
        DecodedFrame::solid(self.size.width, self.size.height, [(n % 255) as u8, 0, 0, 255])
            .map(Some)
    }
}

fn video(w: u32, h: u32, pulled: Rc<Cell<u32>>) -> FrameSource {
    FrameSource::video(Box::new(CountingDecoder {
        size: Size::new(w, h),
        pulled,
        fail_after: None,
    }))
}

#[test]
fn image_becomes_ready_with_aspect_fitted_preview() {
    let mut c = controller();
    let overlays = OverlayPair::default();
    assert_eq!(c.state(), PreviewState::Empty);

    c.select(still(1024, 768));
    assert_eq!(c.state(), PreviewState::Loading);
    assert!(c.surface().is_none());

    assert_eq!(c.poll(&overlays).unwrap(), PreviewState::Ready);
    assert_eq!(c.surface().unwrap().size(), Size::new(600, 450));
    assert_eq!(c.renders(), 1);

    // A ready controller does not re-render on poll.
    assert_eq!(c.poll(&overlays).unwrap(), PreviewState::Ready);
    assert_eq!(c.renders(), 1);
}

#[test]
fn small_media_is_not_upscaled() {
    let mut c = controller();
    c.select(still(120, 80));
    c.poll(&OverlayPair::default()).unwrap();
    assert_eq!(c.surface().unwrap().size(), Size::new(120, 80));
}

#[test]
fn each_caption_edit_renders_exactly_once() {
    let mut c = controller();
    let mut overlays = OverlayPair::default();
    c.select(still(200, 100));
    c.poll(&overlays).unwrap();
    let before = c.surface().unwrap().pixels_premul().to_vec();

    overlays.top.content = "A MUCH LONGER CAPTION".into();
    assert!(c.overlays_changed(&overlays).unwrap());
    assert_eq!(c.renders(), 2);
    assert_ne!(c.surface().unwrap().pixels_premul(), &before[..]);

    overlays.bottom.font_size = 20.0;
    assert!(c.overlays_changed(&overlays).unwrap());
    assert_eq!(c.renders(), 3);
}

#[test]
fn edits_before_ready_do_not_render() {
    let mut c = controller();
    let overlays = OverlayPair::default();
    assert!(!c.overlays_changed(&overlays).unwrap());
    c.select(still(10, 10));
    assert!(!c.overlays_changed(&overlays).unwrap());
    assert_eq!(c.renders(), 0);
}

#[test]
fn decode_failure_leaves_controller_loading() {
    let mut c = controller();
    let overlays = OverlayPair::default();
    c.select(FrameSource::Static(StaticFrameSource::from_bytes(
        MediaKind::Image,
        Arc::from(&b"not an image"[..]),
    )));
    assert!(c.poll(&overlays).unwrap_err().is_decode());
    assert_eq!(c.state(), PreviewState::Loading);
    assert_eq!(c.poll(&overlays).unwrap(), PreviewState::Loading);
    assert_eq!(c.renders(), 0);
}

#[test]
fn still_images_cannot_play() {
    let mut c = controller();
    assert!(c.play().is_err());
    c.select(still(10, 10));
    c.poll(&OverlayPair::default()).unwrap();
    assert!(c.play().is_err());
    assert_eq!(c.state(), PreviewState::Ready);
    assert_eq!(c.scheduled_loops(), 0);
}

#[test]
fn playing_renders_once_per_refresh() {
    let pulled = Rc::new(Cell::new(0));
    let mut c = controller();
    let overlays = OverlayPair::default();
    c.select(video(64, 48, pulled.clone()));
    c.poll(&overlays).unwrap();
    assert_eq!(pulled.get(), 1);
    assert_eq!(c.renders(), 1);

    c.play().unwrap();
    assert_eq!(c.state(), PreviewState::Playing);
    assert_eq!(c.scheduled_loops(), 1);

    for _ in 0..3 {
        assert!(c.on_refresh(&overlays).unwrap());
        assert_eq!(c.scheduled_loops(), 1);
    }
    assert_eq!(c.renders(), 4);
    assert_eq!(pulled.get(), 4);
}

#[test]
fn play_is_idempotent_and_pause_stops_the_loop() {
    let pulled = Rc::new(Cell::new(0));
    let mut c = controller();
    let overlays = OverlayPair::default();
    c.select(video(32, 32, pulled.clone()));
    c.poll(&overlays).unwrap();

    c.play().unwrap();
    c.play().unwrap();
    assert_eq!(c.scheduled_loops(), 1);

    c.pause();
    c.pause();
    assert_eq!(c.state(), PreviewState::Paused);
    assert_eq!(c.scheduled_loops(), 0);

    let renders = c.renders();
    let frames = pulled.get();
    for _ in 0..5 {
        assert!(!c.on_refresh(&overlays).unwrap());
    }
    assert_eq!(c.renders(), renders);
    assert_eq!(pulled.get(), frames);
}

#[test]
fn edits_while_paused_render_the_held_frame() {
    let pulled = Rc::new(Cell::new(0));
    let mut c = controller();
    let mut overlays = OverlayPair::default();
    c.select(video(32, 32, pulled.clone()));
    c.poll(&overlays).unwrap();
    c.play().unwrap();
    c.on_refresh(&overlays).unwrap();
    c.pause();

    let frames = pulled.get();
    overlays.top.content = "PAUSED".into();
    assert!(c.overlays_changed(&overlays).unwrap());
    assert_eq!(pulled.get(), frames);
}

#[test]
fn edits_while_playing_wait_for_the_next_tick() {
    let mut c = controller();
    let overlays = OverlayPair::default();
    c.select(video(32, 32, Rc::new(Cell::new(0))));
    c.poll(&overlays).unwrap();
    c.play().unwrap();
    assert!(!c.overlays_changed(&overlays).unwrap());
    assert_eq!(c.renders(), 1);
}

#[test]
fn selecting_new_media_cancels_the_running_loop() {
    let pulled = Rc::new(Cell::new(0));
    let mut c = controller();
    let overlays = OverlayPair::default();
    c.select(video(32, 32, pulled.clone()));
    c.poll(&overlays).unwrap();
    c.play().unwrap();

    c.select(still(20, 10));
    assert_eq!(c.scheduled_loops(), 0);
    assert_eq!(c.state(), PreviewState::Loading);
    c.poll(&overlays).unwrap();
    assert_eq!(c.surface().unwrap().size(), Size::new(20, 10));

    c.reset();
    assert_eq!(c.state(), PreviewState::Empty);
    assert!(c.surface().is_none());
    assert!(c.source().is_none());
}

#[test]
fn playback_decode_failure_pauses() {
    let mut c = controller();
    let overlays = OverlayPair::default();
    c.select(FrameSource::video(Box::new(CountingDecoder {
        size: Size::new(16, 16),
        pulled: Rc::new(Cell::new(0)),
        fail_after: Some(2),
    })));
    c.poll(&overlays).unwrap();
    c.play().unwrap();
    assert!(c.on_refresh(&overlays).unwrap());
    assert!(c.on_refresh(&overlays).unwrap_err().is_decode());
    assert_eq!(c.state(), PreviewState::Paused);
    assert_eq!(c.scheduled_loops(), 0);
}

#[test]
fn custom_preview_cap() {
    let mut c = controller().with_max_dim(100);
    c.select(still(400, 200));
    c.poll(&OverlayPair::default()).unwrap();
    assert_eq!(c.surface().unwrap().size(), Size::new(100, 50));
}

struct FailingShaper;

impl TextShaper for FailingShaper {
    fn measure(&mut self, _text: &str, _font_size: f32) -> ForgeResult<f32> {
        Err(ForgeError::render("no glyphs"))
    }

    fn paint_line(
        &mut self,
        _ctx: &mut vello_cpu::RenderContext,
        _line: &LineRun<'_>,
        _paint: GlyphPaint,
    ) -> ForgeResult<()> {
        Err(ForgeError::render("no glyphs"))
    }
}

#[test]
fn failed_first_render_commits_nothing() {
    let mut c = PreviewController::new(Box::new(FailingShaper));
    c.select(still(32, 32));
    let err = c.poll(&OverlayPair::default()).unwrap_err();
    assert!(matches!(err, ForgeError::Render(_)));
    assert_eq!(c.state(), PreviewState::Loading);
    assert!(c.surface().is_none());
    assert_eq!(c.renders(), 0);
}

#[test]
fn refresh_interval_is_configurable() {
    let pulled = Rc::new(Cell::new(0));
    let mut c = controller().with_refresh_interval(Duration::from_millis(110));
    c.select(FrameSource::video(Box::new(RatedDecoder {
        pulled: pulled.clone(),
    })));
    let overlays = OverlayPair::default();
    c.poll(&overlays).unwrap();
    c.play().unwrap();
    // 110ms per refresh at 30fps: three frames are due on the first tick.
    assert!(c.on_refresh(&overlays).unwrap());
    assert_eq!(pulled.get(), 4);
}

struct RatedDecoder {
    pulled: Rc<Cell<u32>>,
}

impl VideoDecoder for RatedDecoder {
    fn load_metadata(&mut self) -> ForgeResult<Option<Size>> {
        Ok(Some(Size::new(8, 8)))
    }

    fn next_frame(&mut self) -> ForgeResult<Option<DecodedFrame>> {
        self.pulled.set(self.pulled.get() + 1);
        DecodedFrame::solid(8, 8, [0, 0, 0, 255]).map(Some)
    }

    fn frame_rate(&self) -> Option<f64> {
        Some(30.0)
    }
}
