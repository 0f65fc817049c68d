use thiserror::Error;

pub type BoothResult<T> = Result<T, BoothError>;

/// Errors raised while turning four captured cuts into a collage.
///
/// Only [`BoothError::is_fatal`] errors abort a generation run. Everything
/// else is caught where it happens and replaced with a fallback (original
/// photo, cut-0 overlay, blank cell).
#[derive(Debug, Error)]
pub enum BoothError {
    #[error("segmentation model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("segmentation failed: {0}")]
    SegmentationFailure(String),

    #[error("invalid image dimensions: {width}x{height}")]
    InvalidImage { width: u32, height: u32 },

    #[error(
        "mask is {mask_width}x{mask_height} but image is {image_width}x{image_height}"
    )]
    DimensionMismatch {
        mask_width: u32,
        mask_height: u32,
        image_width: u32,
        image_height: u32,
    },

    #[error("expected exactly 4 photos, got {0}")]
    InvalidPhotoCount(usize),

    #[error("cannot allocate a {width}x{height} canvas")]
    CanvasAllocation { width: u32, height: u32 },

    #[error("failed to encode collage: {0}")]
    Encode(String),

    #[error("failed to load asset {url}: {reason}")]
    AssetLoad { url: String, reason: String },

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BoothError {
    pub fn asset_load(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::AssetLoad {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Fatal errors end the run and send the user back to capture.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidPhotoCount(_)
                | Self::CanvasAllocation { .. }
                | Self::Encode(_)
                | Self::Other(_)
        )
    }
}
