mod file;
#[cfg(feature = "webcam")]
mod webcam;

pub use file::FileCapture;
#[cfg(feature = "webcam")]
pub use webcam::WebcamCapture;

use anyhow::Result;
use image::RgbaImage;

/// Trait for camera capture sources
pub trait CaptureSource {
    /// Capture a single still
    fn capture_frame(&mut self) -> Result<RgbaImage>;

    /// Resolution of captured frames, if known up front
    fn resolution(&self) -> Option<(u32, u32)>;
}
