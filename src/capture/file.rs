use std::collections::VecDeque;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use image::RgbaImage;

use super::CaptureSource;

/// Replays still images from disk, one per capture, in the given order.
pub struct FileCapture {
    pending: VecDeque<PathBuf>,
    last_size: Option<(u32, u32)>,
}

impl FileCapture {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            pending: paths.into_iter().map(Into::into).collect(),
            last_size: None,
        }
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl CaptureSource for FileCapture {
    fn capture_frame(&mut self) -> Result<RgbaImage> {
        let path = self
            .pending
            .pop_front()
            .ok_or_else(|| anyhow!("No more photos to capture"))?;

        let image = image::open(&path)
            .with_context(|| format!("Failed to open photo {}", path.display()))?
            .to_rgba8();
        tracing::debug!("Captured {} ({}x{})", path.display(), image.width(), image.height());

        self.last_size = Some(image.dimensions());
        Ok(image)
    }

    fn resolution(&self) -> Option<(u32, u32)> {
        self.last_size
    }
}
