use anyhow::Result;
use image::RgbImage;

use crate::{BoothError, BoothResult};

/// Alpha matte: grayscale values where 0.0 = background, 1.0 = foreground
/// Dimensions match the input frame dimensions
pub type Matte = Vec<f32>;

/// Trait for segmentation models
/// Allows swapping between different backends (RVM, MODNet, mocks in tests)
pub trait SegmentationModel: Send {
    /// Process a frame and return an alpha matte
    ///
    /// # Arguments
    /// * `frame` - Input RGB frame
    ///
    /// # Returns
    /// * Alpha matte with values 0.0-1.0, flattened in row-major order
    fn segment(&mut self, frame: &RgbImage) -> Result<Matte>;

    /// Reset internal state (for models with temporal/recurrent components)
    ///
    /// Called before every still photo, so no cut leaks into the next.
    fn reset_state(&mut self) {}

    /// Get the model's preferred input dimensions
    ///
    /// Returns (width, height)
    fn input_size(&self) -> (u32, u32);
}

/// Per-pixel classification of a photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Foreground,
    Background,
}

/// Foreground/background labels aligned to exactly one source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentationMask {
    width: u32,
    height: u32,
    labels: Vec<Label>,
}

impl SegmentationMask {
    /// Threshold a matte. Values strictly above `threshold` are foreground.
    pub fn from_matte(matte: &[f32], width: u32, height: u32, threshold: f32) -> BoothResult<Self> {
        let labels = matte
            .iter()
            .map(|&v| {
                if v > threshold {
                    Label::Foreground
                } else {
                    Label::Background
                }
            })
            .collect();
        Self::from_labels(width, height, labels)
    }

    pub fn from_labels(width: u32, height: u32, labels: Vec<Label>) -> BoothResult<Self> {
        let expected = width as usize * height as usize;
        if labels.len() != expected {
            return Err(BoothError::SegmentationFailure(format!(
                "mask has {} labels, expected {}x{} = {}",
                labels.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self {
            width,
            height,
            labels,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn label(&self, x: u32, y: u32) -> Label {
        self.labels[(y * self.width + x) as usize]
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn foreground_count(&self) -> usize {
        self.labels
            .iter()
            .filter(|l| **l == Label::Foreground)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_strictly_greater_than() {
        let mask = SegmentationMask::from_matte(&[0.69, 0.7, 0.71, 1.0], 2, 2, 0.7).unwrap();
        assert_eq!(mask.label(0, 0), Label::Background);
        assert_eq!(mask.label(1, 0), Label::Background);
        assert_eq!(mask.label(0, 1), Label::Foreground);
        assert_eq!(mask.label(1, 1), Label::Foreground);
        assert_eq!(mask.foreground_count(), 2);
    }

    #[test]
    fn matte_length_must_match_dimensions() {
        let err = SegmentationMask::from_matte(&[1.0; 5], 2, 2, 0.5).unwrap_err();
        assert!(matches!(err, BoothError::SegmentationFailure(_)));
    }
}
