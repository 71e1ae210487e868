use super::*;

#[test]
fn new_surface_is_transparent_and_sized() {
    let s = RasterSurface::new(Size::new(4, 3)).unwrap();
    assert_eq!(s.size(), Size::new(4, 3));
    assert_eq!(s.pixels_premul().len(), 4 * 3 * 4);
    assert!(s.pixels_premul().iter().all(|&b| b == 0));
}

#[test]
fn invalid_dimensions_are_rejected() {
    assert!(RasterSurface::new(Size::new(0, 10)).is_err());
    assert!(RasterSurface::new(Size::new(70_000, 10)).is_err());
}

#[test]
fn rgba_image_matches_dimensions() {
    let s = RasterSurface::new(Size::new(5, 2)).unwrap();
    let img = s.to_rgba_image().unwrap();
    assert_eq!(img.dimensions(), (5, 2));
}

#[test]
fn frame_paint_keeps_frame_size() {
    let frame = DecodedFrame::solid(7, 3, [10, 20, 30, 255]).unwrap();
    let paint = frame_to_image_paint(&frame).unwrap();
    let vello_cpu::ImageSource::Pixmap(p) = &paint.image else {
        panic!("expected pixmap source");
    };
    assert_eq!((p.width(), p.height()), (7, 3));
}
