pub mod assets;
pub mod background;
pub mod blend;
pub mod overlay;

pub use assets::{decode_overlay, AssetSource, DirectoryAssets, OverlayAsset, OverlayLibrary};
pub use background::{remove_background_or_original, replace_background, WHITE};
pub use overlay::{
    apply_cut_overlay, composite_overlay, compose_preview, AnchorPolicy, CutEffect, OverlayConfig,
    Placement, CUT_EFFECTS,
};
