mod engine;
mod preprocess;
mod rvm;
pub mod types;

pub use engine::{ModelLoader, SegmentationEngine, FOREGROUND_THRESHOLD};
pub use preprocess::Preprocessor;
pub use rvm::RobustVideoMatting;
pub use types::{Label, Matte, SegmentationMask, SegmentationModel};
