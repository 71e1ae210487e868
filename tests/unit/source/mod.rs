use std::cell::Cell;
use std::io::Cursor;
use std::rc::Rc;
use std::time::Duration;

use super::*;

fn png_bytes(w: u32, h: u32) -> Arc<[u8]> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([9, 8, 7, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf.into()
}

const TICK: Duration = Duration::from_nanos(1_000_000_000 / 60);

struct FixedRateDecoder {
    fps: f64,
}

impl VideoDecoder for FixedRateDecoder {
    fn load_metadata(&mut self) -> ForgeResult<Option<Size>> {
        Ok(Some(Size::new(2, 2)))
    }

    fn next_frame(&mut self) -> ForgeResult<Option<DecodedFrame>> {
        DecodedFrame::solid(2, 2, [0, 0, 0, 255]).map(Some)
    }

    fn frame_rate(&self) -> Option<f64> {
        Some(self.fps)
    }
}

struct ScriptedDecoder {
    metadata_after: u32,
    polls: u32,
    size: Size,
    remaining: u32,
    plays: Rc<Cell<u32>>,
}

impl VideoDecoder for ScriptedDecoder {
    fn load_metadata(&mut self) -> ForgeResult<Option<Size>> {
        self.polls += 1;
        Ok((self.polls > self.metadata_after).then_some(self.size))
    }

    fn next_frame(&mut self) -> ForgeResult<Option<DecodedFrame>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        let shade = (self.remaining % 255) as u8;
        DecodedFrame::solid(self.size.width, self.size.height, [shade, 0, 0, 255]).map(Some)
    }

    fn on_play(&mut self) {
        self.plays.set(self.plays.get() + 1);
    }
}

#[test]
fn static_source_decodes_once_and_repeats_frame() {
    let mut src = FrameSource::Static(StaticFrameSource::from_bytes(
        MediaKind::Image,
        png_bytes(8, 6),
    ));
    assert!(!src.is_ready());
    assert!(src.current_frame().is_none());
    assert!(src.poll().unwrap());
    assert_eq!(src.natural_size(), Some(Size::new(8, 6)));
    let a = src.current_frame().unwrap().clone();
    assert!(src.poll().unwrap());
    assert_eq!(src.current_frame().unwrap(), &a);
    assert!(src.as_video_mut().is_none());
}

#[test]
fn static_decode_failure_is_reported_once() {
    let mut src = FrameSource::Static(StaticFrameSource::from_bytes(
        MediaKind::Image,
        Arc::from(&b"garbage"[..]),
    ));
    assert!(src.poll().unwrap_err().is_decode());
    assert!(!src.poll().unwrap());
    assert!(!src.is_ready());
    let err = src.require_frame().unwrap_err();
    assert!(err.is_decode());
    assert!(!err.to_string().contains("decode error: decode error"));
}

#[test]
fn video_waits_for_metadata_then_first_frame() {
    let plays = Rc::new(Cell::new(0));
    let mut src = FrameSource::video(Box::new(ScriptedDecoder {
        metadata_after: 2,
        polls: 0,
        size: Size::new(4, 4),
        remaining: 5,
        plays: plays.clone(),
    }));
    assert_eq!(src.kind(), MediaKind::Video);
    assert!(!src.poll().unwrap());
    assert_eq!(src.natural_size(), None);
    assert!(!src.poll().unwrap());
    assert!(src.poll().unwrap());
    assert_eq!(src.natural_size(), Some(Size::new(4, 4)));

    let video = src.as_video_mut().unwrap();
    assert_eq!(video.frames_decoded(), 1);
    assert!(!video.advance(TICK).unwrap());

    video.play();
    video.play();
    assert_eq!(plays.get(), 1);
    assert!(video.advance(TICK).unwrap());
    assert_eq!(video.frames_decoded(), 2);

    video.pause();
    video.pause();
    assert!(!video.is_playing());
    assert!(!video.advance(TICK).unwrap());
}

#[test]
fn video_keeps_last_frame_at_end_of_stream() {
    let mut src = VideoFrameSource::new(Box::new(ScriptedDecoder {
        metadata_after: 0,
        polls: 0,
        size: Size::new(2, 2),
        remaining: 2,
        plays: Rc::new(Cell::new(0)),
    }));
    assert!(src.poll().unwrap());
    src.play();
    assert!(src.advance(TICK).unwrap());
    let last = src.current_frame().unwrap().clone();
    assert!(!src.advance(TICK).unwrap());
    assert_eq!(src.current_frame().unwrap(), &last);
}

#[test]
fn open_reads_image_bytes_and_rejects_missing_files() {
    let tools = crate::assets::media::FfmpegTools::default();
    let media = MediaSource::with_kind(
        MediaKind::Image,
        crate::model::media::MediaLocator::Bytes {
            bytes: png_bytes(3, 3),
            mime: Some("image/png".into()),
        },
    );
    let mut src = FrameSource::open(&media, &tools).unwrap();
    assert!(src.poll().unwrap());

    let missing = MediaSource::parse("/nonexistent/dir/pic.png").unwrap();
    assert!(FrameSource::open(&missing, &tools).unwrap_err().is_decode());
}

#[test]
fn video_at_30fps_follows_the_media_clock_on_a_60hz_refresh() {
    let mut src = VideoFrameSource::new(Box::new(FixedRateDecoder { fps: 30.0 }));
    assert!(src.poll().unwrap());
    src.play();
    let mut changed = 0;
    for _ in 0..60 {
        if src.advance(TICK).unwrap() {
            changed += 1;
        }
    }
    // One second of media time shows about 30 frames, not 60.
    assert!((29..=31).contains(&src.frames_decoded()), "{}", src.frames_decoded());
    assert!((28..=31).contains(&changed), "{changed}");
    assert!((src.media_time().as_secs_f64() - 1.0).abs() < 1e-3);
}

#[test]
fn slow_refresh_skips_frames_that_are_already_late() {
    let mut src = VideoFrameSource::new(Box::new(FixedRateDecoder { fps: 30.0 }));
    assert!(src.poll().unwrap());
    src.play();
    assert!(src.advance(Duration::from_millis(500)).unwrap());
    // Frames 1..=15 are due by 0.5s; all are pulled in one call.
    assert_eq!(src.frames_decoded(), 16);

    src.pause();
    assert!(!src.advance(Duration::from_secs(5)).unwrap());
    assert_eq!(src.frames_decoded(), 16);
    assert_eq!(src.media_time(), Duration::from_millis(500));
}

#[test]
fn unknown_frame_rate_pulls_one_frame_per_call() {
    let mut src = VideoFrameSource::new(Box::new(FixedRateDecoder { fps: f64::NAN }));
    assert!(src.poll().unwrap());
    src.play();
    for _ in 0..3 {
        assert!(src.advance(Duration::from_secs(1)).unwrap());
    }
    assert_eq!(src.frames_decoded(), 4);
}
