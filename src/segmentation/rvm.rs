use super::preprocess::Preprocessor;
use super::types::{Matte, SegmentationModel};
use anyhow::{ensure, Context, Result};
use image::RgbImage;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;

/// RobustVideoMatting person segmentation, used on still photos.
///
/// RVM is recurrent: it takes hidden states r1-r4 next to the frame. Every
/// photo is an independent shot, so each call starts from zeroed states and
/// the updated states the model returns are thrown away.
pub struct RobustVideoMatting {
    session: Session,
    preprocessor: Preprocessor,
    width: u32,
    height: u32,

    // Hidden states are computed at this fraction of the input resolution
    downsample_ratio: f32,
}

impl RobustVideoMatting {
    /// Create a new RVM model from an ONNX file
    ///
    /// # Arguments
    /// * `model_path` - Path to the ONNX model file
    ///
    /// # Default Configuration
    /// - Input size: 512x512
    /// - Downsample ratio: 0.25
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let path = model_path.as_ref();

        tracing::info!("Loading RVM model from {}", path.display());

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        tracing::info!("RVM model loaded successfully");

        let width = 512;
        let height = 512;

        Ok(Self {
            session,
            preprocessor: Preprocessor::new(width, height),
            width,
            height,
            downsample_ratio: 0.25,
        })
    }

    fn zero_state() -> Result<Tensor<f32>> {
        Ok(Tensor::from_array(([1usize, 1, 1, 1], vec![0.0f32]))?)
    }
}

impl SegmentationModel for RobustVideoMatting {
    fn segment(&mut self, frame: &RgbImage) -> Result<Matte> {
        let _span = tracing::debug_span!("rvm_segment").entered();

        let input = self.preprocessor.preprocess(frame)?;
        let shape = [1usize, 3, self.height as usize, self.width as usize];
        let src = Tensor::from_array((shape, input.into_raw_vec()))?;
        let ratio = Tensor::from_array(([1usize], vec![self.downsample_ratio]))?;

        // RVM expects: src, r1i, r2i, r3i, r4i, downsample_ratio
        let _infer_span = tracing::debug_span!("inference").entered();
        let outputs = self
            .session
            .run(ort::inputs![
                src,
                Self::zero_state()?,
                Self::zero_state()?,
                Self::zero_state()?,
                Self::zero_state()?,
                ratio
            ])
            .context("Failed to run inference")?;
        drop(_infer_span);

        // Outputs: fgr, pha, r1o..r4o. Only the alpha matte is needed.
        let (pha_shape, pha) = outputs[1]
            .try_extract_tensor::<f32>()
            .context("Failed to extract alpha matte")?;
        ensure!(
            pha_shape.len() == 4,
            "unexpected matte rank {}",
            pha_shape.len()
        );
        let matte_height = pha_shape[2] as u32;
        let matte_width = pha_shape[3] as u32;
        let matte_flat = pha.to_vec();
        drop(outputs);

        let (frame_width, frame_height) = frame.dimensions();
        Preprocessor::postprocess_matte(
            &matte_flat,
            matte_width,
            matte_height,
            frame_width,
            frame_height,
        )
    }

    fn input_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
