use std::path::PathBuf;
use std::sync::Mutex;

use image::buffer::ConvertBuffer;
use image::{RgbImage, RgbaImage};

use super::rvm::RobustVideoMatting;
use super::types::{SegmentationMask, SegmentationModel};
use crate::{BoothError, BoothResult};

/// Matte values strictly above this are foreground.
pub const FOREGROUND_THRESHOLD: f32 = 0.7;

pub type ModelLoader =
    Box<dyn Fn() -> anyhow::Result<Box<dyn SegmentationModel>> + Send + Sync>;

/// Lazily loaded, shared person segmentation.
///
/// The model is built on the first [`SegmentationEngine::segment`] call and
/// reused afterwards. Loading happens under the slot lock, so concurrent
/// first callers never build two models. A failed load leaves the slot empty
/// and the next call tries again.
pub struct SegmentationEngine {
    loader: ModelLoader,
    model: Mutex<Option<Box<dyn SegmentationModel>>>,
    threshold: f32,
}

impl SegmentationEngine {
    pub fn new(loader: ModelLoader) -> Self {
        Self {
            loader,
            model: Mutex::new(None),
            threshold: FOREGROUND_THRESHOLD,
        }
    }

    /// Engine backed by an RVM ONNX file, loaded on first use.
    pub fn from_model_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::new(Box::new(move || {
            let model = RobustVideoMatting::new(&path)?;
            Ok(Box::new(model) as Box<dyn SegmentationModel>)
        }))
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn is_loaded(&self) -> bool {
        self.model.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }

    pub fn segment(&self, image: &RgbaImage) -> BoothResult<SegmentationMask> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(BoothError::InvalidImage { width, height });
        }

        let mut slot = self
            .model
            .lock()
            .map_err(|_| BoothError::ModelUnavailable("model lock poisoned".into()))?;

        if slot.is_none() {
            let _span = tracing::info_span!("model_load").entered();
            let model = (self.loader)()
                .map_err(|e| BoothError::ModelUnavailable(format!("{e:#}")))?;
            let (in_w, in_h) = model.input_size();
            tracing::info!("Segmentation model ready ({}x{} input)", in_w, in_h);
            *slot = Some(model);
        }
        let Some(model) = slot.as_mut() else {
            return Err(BoothError::ModelUnavailable("model slot empty".into()));
        };

        let _span = tracing::debug_span!("segment", width, height).entered();
        let rgb: RgbImage = image.convert();
        model.reset_state();
        let matte = model
            .segment(&rgb)
            .map_err(|e| BoothError::SegmentationFailure(format!("{e:#}")))?;

        SegmentationMask::from_matte(&matte, width, height, self.threshold)
    }
}

impl std::fmt::Debug for SegmentationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentationEngine")
            .field("threshold", &self.threshold)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::{Label, Matte};
    use anyhow::{anyhow, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Marks the left half of every frame as the person.
    struct LeftHalf;

    impl SegmentationModel for LeftHalf {
        fn segment(&mut self, frame: &RgbImage) -> Result<Matte> {
            let (w, h) = frame.dimensions();
            Ok((0..h)
                .flat_map(|_| (0..w).map(move |x| if x < w / 2 { 0.9 } else { 0.1 }))
                .collect())
        }

        fn input_size(&self) -> (u32, u32) {
            (4, 4)
        }
    }

    struct Broken;

    impl SegmentationModel for Broken {
        fn segment(&mut self, _frame: &RgbImage) -> Result<Matte> {
            Err(anyhow!("tensor shape mismatch"))
        }

        fn input_size(&self) -> (u32, u32) {
            (4, 4)
        }
    }

    fn counting_engine(loads: Arc<AtomicUsize>) -> SegmentationEngine {
        SegmentationEngine::new(Box::new(move || {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(LeftHalf) as Box<dyn SegmentationModel>)
        }))
    }

    #[test]
    fn model_loads_once_and_is_reused() {
        let loads = Arc::new(AtomicUsize::new(0));
        let engine = counting_engine(loads.clone());
        assert!(!engine.is_loaded());

        let image = RgbaImage::new(4, 2);
        let mask = engine.segment(&image).unwrap();
        engine.segment(&image).unwrap();

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(engine.is_loaded());
        assert_eq!(mask.dimensions(), (4, 2));
        assert_eq!(mask.label(0, 0), Label::Foreground);
        assert_eq!(mask.label(3, 1), Label::Background);
    }

    #[test]
    fn concurrent_first_callers_share_one_load() {
        let loads = Arc::new(AtomicUsize::new(0));
        let engine = Arc::new(counting_engine(loads.clone()));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = engine.clone();
                std::thread::spawn(move || engine.segment(&RgbaImage::new(2, 2)).is_ok())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_load_is_model_unavailable_and_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let engine = SegmentationEngine::new(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(anyhow!("no such file"))
        }));

        let image = RgbaImage::new(2, 2);
        let err = engine.segment(&image).unwrap_err();
        assert!(matches!(err, BoothError::ModelUnavailable(ref msg) if msg.contains("no such file")));
        assert!(engine.segment(&image).is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert!(!engine.is_loaded());
    }

    #[test]
    fn inference_error_is_segmentation_failure() {
        let engine = SegmentationEngine::new(Box::new(|| {
            Ok(Box::new(Broken) as Box<dyn SegmentationModel>)
        }));
        let err = engine.segment(&RgbaImage::new(2, 2)).unwrap_err();
        assert!(matches!(err, BoothError::SegmentationFailure(_)));
    }

    #[test]
    fn zero_sized_input_fails_before_loading() {
        let loads = Arc::new(AtomicUsize::new(0));
        let engine = counting_engine(loads.clone());
        let err = engine.segment(&RgbaImage::new(0, 10)).unwrap_err();
        assert!(matches!(
            err,
            BoothError::InvalidImage {
                width: 0,
                height: 10
            }
        ));
        assert_eq!(loads.load(Ordering::SeqCst), 0);
    }
}
