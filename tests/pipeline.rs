use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use image::{Rgba, RgbaImage};

use anishot::catalog::Character;
use anishot::compositing::{AssetSource, OverlayLibrary};
use anishot::layout::{CollageOptions, LayoutGeometry, LayoutVariant};
use anishot::pipeline::{CaptureSession, CapturedPhoto, Pipeline, PipelineState};
use anishot::segmentation::SegmentationEngine;

struct InMemory(HashMap<String, Vec<u8>>);

impl AssetSource for InMemory {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.0.get(url).cloned().ok_or_else(|| anyhow!("not found: {url}"))
    }
}

fn png(image: &RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn levi() -> Character {
    Character {
        id: "char-1".into(),
        name: "Levi".into(),
        thumbnail_url: "/characters/levi.png".into(),
        overlay_images: [
            "/characters/levi.png".into(),
            "/characters/levi2.png".into(),
            "/characters/levi3.png".into(),
            "/characters/levi4.png".into(),
        ],
    }
}

fn levi_assets() -> InMemory {
    let colours = [[200, 0, 0], [0, 200, 0], [0, 0, 200], [200, 200, 0]];
    let files = levi()
        .overlay_images
        .iter()
        .zip(colours)
        .map(|(url, [r, g, b])| (url.clone(), png(&RgbaImage::from_pixel(16, 16, Rgba([r, g, b, 255])))))
        .collect();
    InMemory(files)
}

fn camera_photos() -> Vec<RgbaImage> {
    (0..4)
        .map(|i| {
            RgbaImage::from_fn(640, 480, |x, y| {
                Rgba([(x % 256) as u8, (y % 256) as u8, 60 * i as u8, 255])
            })
        })
        .collect()
}

fn gray_photos() -> Vec<CapturedPhoto> {
    (1..=4)
        .map(|id| CapturedPhoto::new(id, RgbaImage::from_pixel(640, 480, Rgba([128, 128, 128, 255]))))
        .collect()
}

/// Collage pixel showing photo pixel (520, 420) of each mobile cell: inside
/// every cut's bottom-right overlay once the 640x480 frame is cover-cropped.
fn overlay_probe_point(cell: &anishot::layout::Rect) -> (u32, u32) {
    (cell.x + 477, cell.y + 455)
}

fn options() -> CollageOptions {
    CollageOptions {
        sparkles: false,
        ..CollageOptions::default()
    }
}

#[test]
fn levi_session_produces_mobile_collage() {
    let pipeline = Pipeline::new(
        LayoutVariant::Mobile,
        Arc::new(OverlayLibrary::new(levi_assets())),
    )
    .with_collage_options(options());
    let mut session = CaptureSession::new(Arc::new(pipeline), levi());

    for photo in camera_photos() {
        session.capture(photo).unwrap();
    }

    let PipelineState::Complete(collage) = session.state() else {
        panic!("expected a collage, got {:?}", session.state());
    };
    assert_eq!((collage.width, collage.height), (1080, 1920));

    let decoded = image::load_from_memory(&collage.png).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (1080, 1920));

    let geometry = LayoutGeometry::compute(&LayoutVariant::Mobile.spec()).unwrap();
    assert!(geometry.is_valid_for(1080, 1920));
    for cell in geometry.cells {
        assert_eq!(cell.width, cell.height);
        // Bordered
        let edge = decoded.get_pixel(cell.x + cell.width / 2, cell.y);
        assert_eq!(*edge, Rgba([0xE0, 0xE0, 0xE0, 255]));
        // Numbered badge
        let badge = decoded.get_pixel(cell.x + 20, cell.y + 6);
        assert_eq!(*badge, Rgba([0xBA, 0x68, 0xC8, 255]));
    }

    let name = session.suggested_filename();
    assert!(name.starts_with("anishot-4cut-Levi-"));
    assert!(name.ends_with(".png"));
}

#[test]
fn unavailable_model_still_completes_with_original_photos() {
    let engine = Arc::new(SegmentationEngine::new(Box::new(|| {
        Err(anyhow!("model weights not found"))
    })));
    let pipeline = Pipeline::new(
        LayoutVariant::Mobile,
        Arc::new(OverlayLibrary::new(InMemory(HashMap::new()))),
    )
    .with_segmentation(engine.clone())
    .with_collage_options(options());

    let photos: Vec<_> = camera_photos()
        .into_iter()
        .enumerate()
        .map(|(i, image)| CapturedPhoto::new(i as u32 + 1, image))
        .collect();

    let collage = pipeline.generate(&photos, &levi()).unwrap();
    assert_eq!((collage.width, collage.height), (1080, 1920));
    assert!(!engine.is_loaded());

    // Without overlays or removal, a cell shows its photo as captured: cover
    // scaling keeps the blue channel untouched.
    let decoded = image::load_from_memory(&collage.png).unwrap().to_rgba8();
    let geometry = LayoutGeometry::compute(&LayoutVariant::Mobile.spec()).unwrap();
    for (i, cell) in geometry.cells.iter().enumerate() {
        let px = decoded.get_pixel(cell.x + cell.width / 2, cell.y + cell.height / 2);
        assert_eq!(px[2], 60 * i as u8);
        assert_eq!(px[3], 255);
    }
}

#[test]
fn corrupt_cut_overlay_falls_back_to_cut_one_in_the_collage() {
    let mut assets = levi_assets();
    assets
        .0
        .insert("/characters/levi3.png".into(), b"not an image at all".to_vec());
    let pipeline = Pipeline::new(LayoutVariant::Mobile, Arc::new(OverlayLibrary::new(assets)))
        .with_collage_options(options());

    let collage = pipeline.generate(&gray_photos(), &levi()).unwrap();
    let decoded = image::load_from_memory(&collage.png).unwrap().to_rgba8();
    let cells = LayoutGeometry::compute(&LayoutVariant::Mobile.spec()).unwrap().cells;

    let at = |i: usize| {
        let (x, y) = overlay_probe_point(&cells[i]);
        *decoded.get_pixel(x, y)
    };
    let red = |p: Rgba<u8>| p[0] > 180 && p[1] < 60 && p[2] < 60;

    assert!(red(at(0)), "cut 1: {:?}", at(0));
    let green = at(1);
    assert!(green[1] > 180 && green[0] < 60 && green[2] < 60, "cut 2: {green:?}");
    // levi3.png is garbage, so the third cut shows the first cut's overlay.
    assert!(red(at(2)), "cut 3: {:?}", at(2));
    // Faded yellow over gray
    let yellow = at(3);
    assert!(yellow[0] > 150 && yellow[1] > 150 && yellow[2] < 60, "cut 4: {yellow:?}");

    // Away from the overlay the photo is untouched.
    for cell in &cells {
        assert_eq!(*decoded.get_pixel(cell.x + 100, cell.y + 200), Rgba([128, 128, 128, 255]));
    }
}

#[test]
fn every_cell_badge_is_numbered() {
    let pipeline = Pipeline::new(
        LayoutVariant::Mobile,
        Arc::new(OverlayLibrary::new(levi_assets())),
    )
    .with_collage_options(options());
    let collage = pipeline.generate(&gray_photos(), &levi()).unwrap();
    let decoded = image::load_from_memory(&collage.png).unwrap().to_rgba8();

    let spec = LayoutVariant::Mobile.spec();
    let r = spec.badge_radius;
    let mut digits = Vec::new();
    for cell in LayoutGeometry::compute(&spec).unwrap().cells {
        let (cx, cy) = (cell.x + r + 4, cell.y + r + 4);
        let glyph: Vec<bool> = (cy - r / 2..cy + r / 2)
            .flat_map(|y| (cx - r / 2..cx + r / 2).map(move |x| (x, y)))
            .map(|(x, y)| decoded.get_pixel(x, y).0[..3].iter().all(|&c| c > 230))
            .collect();
        assert!(glyph.iter().filter(|&&lit| lit).count() > 4);
        digits.push(glyph);
    }
    // Four different numbers, not one repeated label.
    for i in 0..digits.len() {
        for j in i + 1..digits.len() {
            assert_ne!(digits[i], digits[j], "badges {} and {} look alike", i + 1, j + 1);
        }
    }
}
