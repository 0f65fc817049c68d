use image::{Rgba, RgbaImage};

use crate::segmentation::{Label, SegmentationEngine, SegmentationMask};
use crate::{BoothError, BoothResult};

/// Default fill for removed backgrounds.
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Overwrites every background pixel with `fill`; foreground pixels are
/// copied unchanged. The mask must match the image exactly.
pub fn replace_background(
    image: &RgbaImage,
    mask: &SegmentationMask,
    fill: Rgba<u8>,
) -> BoothResult<RgbaImage> {
    let (image_width, image_height) = image.dimensions();
    let (mask_width, mask_height) = mask.dimensions();
    if (mask_width, mask_height) != (image_width, image_height) {
        return Err(BoothError::DimensionMismatch {
            mask_width,
            mask_height,
            image_width,
            image_height,
        });
    }

    let mut out = image.clone();
    for (pixel, label) in out.pixels_mut().zip(mask.labels()) {
        if *label == Label::Background {
            *pixel = fill;
        }
    }
    Ok(out)
}

/// Segments `image` and flattens its background, or hands back the original
/// when segmentation or replacement fails. `on_mask` runs once a mask exists,
/// before the replacement.
pub fn remove_background_or_original(
    engine: &SegmentationEngine,
    image: &RgbaImage,
    fill: Rgba<u8>,
    on_mask: impl FnOnce(),
) -> RgbaImage {
    let result = engine.segment(image).and_then(|mask| {
        on_mask();
        replace_background(image, &mask, fill)
    });
    match result {
        Ok(replaced) => replaced,
        Err(e) => {
            tracing::warn!("Background removal skipped, keeping original: {}", e);
            image.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::SegmentationModel;
    use anyhow::anyhow;

    fn sample_image() -> RgbaImage {
        RgbaImage::from_fn(3, 2, |x, y| Rgba([x as u8 * 40, y as u8 * 90, 7, 200]))
    }

    fn diagonal_mask() -> SegmentationMask {
        use Label::*;
        SegmentationMask::from_labels(
            3,
            2,
            vec![Foreground, Background, Background, Background, Foreground, Background],
        )
        .unwrap()
    }

    #[test]
    fn background_is_filled_and_foreground_untouched() {
        let image = sample_image();
        let mask = diagonal_mask();
        let out = replace_background(&image, &mask, WHITE).unwrap();

        assert_eq!(out.dimensions(), image.dimensions());
        for (x, y, pixel) in out.enumerate_pixels() {
            match mask.label(x, y) {
                Label::Background => assert_eq!(*pixel, Rgba([255, 255, 255, 255])),
                Label::Foreground => assert_eq!(pixel, image.get_pixel(x, y)),
            }
        }
    }

    #[test]
    fn custom_fill_colour_is_used() {
        let green = Rgba([0, 255, 0, 255]);
        let out = replace_background(&sample_image(), &diagonal_mask(), green).unwrap();
        assert_eq!(*out.get_pixel(1, 0), green);
    }

    #[test]
    fn replacing_twice_is_idempotent() {
        let mask = diagonal_mask();
        let once = replace_background(&sample_image(), &mask, WHITE).unwrap();
        let twice = replace_background(&once, &mask, WHITE).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn mismatched_mask_is_rejected() {
        let mask = SegmentationMask::from_labels(2, 2, vec![Label::Background; 4]).unwrap();
        let err = replace_background(&sample_image(), &mask, WHITE).unwrap_err();
        assert!(matches!(
            err,
            BoothError::DimensionMismatch {
                mask_width: 2,
                image_width: 3,
                ..
            }
        ));
    }

    #[test]
    fn unavailable_model_falls_back_to_original() {
        let engine = SegmentationEngine::new(Box::new(|| {
            Err::<Box<dyn SegmentationModel>, _>(anyhow!("model file missing"))
        }));
        let image = sample_image();
        let mut masked = false;
        let out = remove_background_or_original(&engine, &image, WHITE, || masked = true);
        assert_eq!(out, image);
        assert!(!masked);
    }

    #[test]
    fn mask_callback_runs_before_replacement() {
        let engine = SegmentationEngine::new(Box::new(|| {
            Ok(Box::new(EverythingBackground) as Box<dyn SegmentationModel>)
        }));
        let mut masked = 0;
        let out = remove_background_or_original(&engine, &sample_image(), WHITE, || masked += 1);
        assert_eq!(masked, 1);
        assert!(out.pixels().all(|p| *p == WHITE));
    }

    struct EverythingBackground;

    impl SegmentationModel for EverythingBackground {
        fn segment(&mut self, frame: &image::RgbImage) -> anyhow::Result<crate::segmentation::Matte> {
            Ok(vec![0.0; (frame.width() * frame.height()) as usize])
        }

        fn input_size(&self) -> (u32, u32) {
            (3, 2)
        }
    }
}
