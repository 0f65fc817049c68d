use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use image::RgbaImage;

use crate::layout::EncodedCollage;

/// One captured still, numbered 1..=4 by its position in the session.
#[derive(Debug, Clone)]
pub struct CapturedPhoto {
    pub id: u32,
    pub image: RgbaImage,
    pub timestamp: SystemTime,
}

impl CapturedPhoto {
    pub fn new(id: u32, image: RgbaImage) -> Self {
        Self {
            id,
            image,
            timestamp: SystemTime::now(),
        }
    }
}

/// Where a capture session is. Stage states carry the zero-based cut being
/// worked on.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    Idle,
    Capturing { count: usize },
    Segmenting { cut: usize },
    Replacing { cut: usize },
    Compositing { cut: usize },
    Complete(EncodedCollage),
    Failed { reason: String },
}

impl PipelineState {
    pub fn is_generating(&self) -> bool {
        matches!(
            self,
            Self::Segmenting { .. } | Self::Replacing { .. } | Self::Compositing { .. }
        )
    }
}

/// Cooperative cancellation. Cancelling bumps an epoch; work started under
/// an older epoch finishes but its result is dropped.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    epoch: Arc<AtomicU64>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    /// Snapshot of the current epoch for a unit of work about to start.
    pub fn guard(&self) -> EpochGuard {
        EpochGuard {
            token: self.clone(),
            epoch: self.epoch.load(Ordering::SeqCst),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EpochGuard {
    token: CancelToken,
    epoch: u64,
}

impl EpochGuard {
    pub fn is_cancelled(&self) -> bool {
        self.token.epoch.load(Ordering::SeqCst) != self.epoch
    }
}
