mod directory;

pub use directory::{suggested_filename, DirectorySink, APP_TAG};

use std::path::PathBuf;

use anyhow::Result;

use crate::layout::EncodedCollage;

/// Destination for a finished collage.
pub trait OutputSink {
    /// Stores the collage under `filename` and returns where it went.
    fn write_collage(&mut self, collage: &EncodedCollage, filename: &str) -> Result<PathBuf>;
}
