//! Four-cut photo booth compositing.
//!
//! Four captured photos go through optional person segmentation and
//! background flattening, get a character overlay per cut, and are laid out
//! on a fixed, branded canvas that is encoded as PNG.

pub mod capture;
pub mod catalog;
pub mod compositing;
pub mod error;
pub mod layout;
pub mod output;
pub mod pipeline;
pub mod segmentation;

pub use error::{BoothError, BoothResult};

/// Number of cuts in every session and every collage.
pub const CUT_COUNT: usize = 4;
