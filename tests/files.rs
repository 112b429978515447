use std::fs;
use std::path::PathBuf;

use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use pixmap::{Color, Composition, Layer, Pixmap, PixmapError, Point, Rect};

/// Fresh scratch directory per test
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pixmap-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// 4x4 RGBA image with a distinct color per 2x2 quadrant
fn quadrant_image() -> RgbaImage {
    RgbaImage::from_fn(4, 4, |x, y| match (x < 2, y < 2) {
        (true, true) => Rgba([255, 0, 0, 255]),
        (false, true) => Rgba([0, 255, 0, 255]),
        (true, false) => Rgba([0, 0, 255, 255]),
        (false, false) => Rgba([255, 255, 0, 128]),
    })
}

#[test_log::test]
fn test_png_decodes_to_rgba() {
    let dir = scratch_dir("png-rgba");
    let path = dir.join("quad.png");
    quadrant_image().save(&path).unwrap();

    let p = Pixmap::from_file(&path).unwrap();
    assert_eq!(p.size().unwrap(), (4, 4));
    assert_eq!(p.get_pixel(0, 0).unwrap(), Color::new(255, 0, 0, 255));
    assert_eq!(p.get_pixel(3, 0).unwrap(), Color::new(0, 255, 0, 255));
    assert_eq!(p.get_pixel(0, 3).unwrap(), Color::new(0, 0, 255, 255));
    assert_eq!(p.get_pixel(3, 3).unwrap(), Color::new(255, 255, 0, 128));
    assert_eq!(p.get_pixel(4, 0).unwrap(), Color::SENTINEL);
}

#[test]
fn test_rgb_and_gray_sources_expand_to_four_channels() {
    let dir = scratch_dir("expand");
    let rgb = dir.join("rgb.png");
    RgbImage::from_pixel(2, 1, Rgb([10, 20, 30])).save(&rgb).unwrap();
    let gray = dir.join("gray.png");
    GrayImage::from_pixel(1, 2, Luma([77])).save(&gray).unwrap();

    let p = Pixmap::from_file(&rgb).unwrap();
    assert_eq!(p.as_bytes().unwrap().len(), 2 * 4);
    assert_eq!(p.get_pixel(1, 0).unwrap(), Color::new(10, 20, 30, 255));

    let p = Pixmap::from_file(&gray).unwrap();
    assert_eq!(p.size().unwrap(), (1, 2));
    assert_eq!(p.get_pixel(0, 1).unwrap(), Color::new(77, 77, 77, 255));
}

#[test]
fn test_format_is_sniffed_from_content() {
    let dir = scratch_dir("sniff");
    let png = dir.join("quad.png");
    quadrant_image().save(&png).unwrap();
    let misnamed = dir.join("quad.dat");
    fs::copy(&png, &misnamed).unwrap();

    let p = Pixmap::from_file(&misnamed).unwrap();
    assert_eq!(p.get_pixel(2, 0).unwrap(), Color::new(0, 255, 0, 255));
}

#[test]
fn test_missing_and_corrupt_files() {
    let dir = scratch_dir("bad-files");
    assert!(matches!(
        Pixmap::from_file(dir.join("missing.png")),
        Err(PixmapError::NotFound(_))
    ));

    let corrupt = dir.join("corrupt.png");
    fs::write(&corrupt, b"\x89PNG\r\n\x1a\nthis is not really a png").unwrap();
    assert!(matches!(Pixmap::from_file(&corrupt), Err(PixmapError::Decode(_))));
}

#[test]
fn test_from_memory_matches_from_file() {
    let dir = scratch_dir("memory");
    let path = dir.join("quad.png");
    quadrant_image().save(&path).unwrap();

    let bytes = fs::read(&path).unwrap();
    let a = Pixmap::from_memory(&bytes).unwrap();
    let b = Pixmap::from_file(&path).unwrap();
    assert_eq!(a.as_bytes().unwrap(), b.as_bytes().unwrap());
}

#[test]
fn test_save_then_load() {
    let dir = scratch_dir("save");
    let mut p = Pixmap::blank(3, 2).unwrap();
    p.set_pixel(2, 1, Color::new(1, 2, 3, 4)).unwrap();
    let path = dir.join("out.png");
    p.save(&path).unwrap();

    let again = Pixmap::from_file(&path).unwrap();
    assert_eq!(again.as_bytes().unwrap(), p.as_bytes().unwrap());
}

#[test]
fn test_loaded_pixmap_blits_into_blank() {
    let dir = scratch_dir("blit");
    let path = dir.join("quad.png");
    quadrant_image().save(&path).unwrap();

    let src = Pixmap::from_file(&path).unwrap();
    let mut dst = Pixmap::blank(4, 4).unwrap();
    dst.blit(Point::new(1, 1), &src, Rect::new(1, 1, 2, 2)).unwrap();
    assert_eq!(dst.get_pixel(1, 1).unwrap(), Color::new(255, 0, 0, 255));
    assert_eq!(dst.get_pixel(2, 2).unwrap(), Color::new(255, 255, 0, 128));
    assert_eq!(dst.get_pixel(0, 0).unwrap(), Color::TRANSPARENT);
    assert_eq!(dst.get_pixel(3, 3).unwrap(), Color::TRANSPARENT);
}

#[test_log::test]
fn test_composition_renders_file_layers() {
    let dir = scratch_dir("compose");
    quadrant_image().save(dir.join("quad.png")).unwrap();

    let mut doc = Composition::new(8, 8);
    doc.background = Some(Color::BLACK);
    doc.push(Layer::ScaledBlit {
        source: "quad.png".into(),
        dest: Rect::new(0, 0, 8, 8),
        source_rect: None,
    })
    .push(Layer::Blit {
        source: "quad.png".into(),
        origin: Point::new(6, 0),
        source_rect: Some(Rect::new(0, 2, 2, 2)),
    });
    let scene = dir.join("scene.json");
    doc.save(&scene).unwrap();

    let loaded = Composition::load(&scene).unwrap();
    let canvas = loaded.render(&dir).unwrap();
    // upscaled quadrants
    assert_eq!(canvas.get_pixel(0, 0).unwrap(), Color::new(255, 0, 0, 255));
    assert_eq!(canvas.get_pixel(7, 7).unwrap(), Color::new(255, 255, 0, 128));
    assert_eq!(canvas.get_pixel(3, 5).unwrap(), Color::new(0, 0, 255, 255));
    // blue quadrant pasted over the top-right corner
    assert_eq!(canvas.get_pixel(6, 0).unwrap(), Color::new(0, 0, 255, 255));
    assert_eq!(canvas.get_pixel(7, 1).unwrap(), Color::new(0, 0, 255, 255));
    assert_eq!(canvas.get_pixel(5, 0).unwrap(), Color::new(0, 255, 0, 255));

    let out = dir.join("out.png");
    canvas.save(&out).unwrap();
    assert_eq!(Pixmap::from_file(&out).unwrap().size().unwrap(), (8, 8));
}
