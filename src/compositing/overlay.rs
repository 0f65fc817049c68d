use image::{imageops, Rgba, RgbaImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};

use super::assets::{OverlayAsset, OverlayLibrary};
use super::blend;
use crate::catalog::Character;

/// Where and how an overlay lands on a base image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Top-left corner in base-image pixels; may lie outside the image.
    pub x: i64,
    pub y: i64,
    /// Edge of the square the overlay is stretched into.
    pub size: u32,
    /// Radians, clockwise, about the overlay's own centre.
    pub rotation: f32,
    pub opacity: f32,
}

/// Per-cut variation applied on top of the anchor placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutEffect {
    pub rotation: f32,
    pub scale: f32,
    pub opacity: f32,
}

impl CutEffect {
    pub const PLAIN: CutEffect = CutEffect {
        rotation: 0.0,
        scale: 1.0,
        opacity: 1.0,
    };
}

/// Plain, tilted, enlarged, faded: indexed by cut.
pub const CUT_EFFECTS: [CutEffect; 4] = [
    CutEffect::PLAIN,
    CutEffect {
        rotation: -0.1,
        ..CutEffect::PLAIN
    },
    CutEffect {
        scale: 1.2,
        ..CutEffect::PLAIN
    },
    CutEffect {
        opacity: 0.8,
        ..CutEffect::PLAIN
    },
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnchorPolicy {
    /// Flush with the left edge, bottom aligned. Used for live preview.
    LeftBottom,
    /// Bottom-right corner, inset by `margin`. Used for the final collage.
    RightBottom { margin: u32 },
}

impl AnchorPolicy {
    pub fn origin(&self, width: u32, height: u32, size: u32) -> (i64, i64) {
        let (w, h, s) = (i64::from(width), i64::from(height), i64::from(size));
        match *self {
            AnchorPolicy::LeftBottom => (0, h - s),
            AnchorPolicy::RightBottom { margin } => {
                let m = i64::from(margin);
                (w - s - m, h - s - m)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayConfig {
    pub anchor: AnchorPolicy,
    /// Overlay edge as a fraction of the base image's shorter side.
    pub size_fraction: f32,
    /// Looked up by cut; cuts past the end are plain.
    pub effects: Vec<CutEffect>,
}

impl OverlayConfig {
    pub fn preview() -> Self {
        Self {
            anchor: AnchorPolicy::LeftBottom,
            size_fraction: 0.5,
            effects: Vec::new(),
        }
    }

    pub fn collage() -> Self {
        Self {
            anchor: AnchorPolicy::RightBottom { margin: 0 },
            size_fraction: 0.5,
            effects: CUT_EFFECTS.to_vec(),
        }
    }

    pub fn effect(&self, cut: usize) -> CutEffect {
        self.effects.get(cut).copied().unwrap_or(CutEffect::PLAIN)
    }

    pub fn placement(&self, width: u32, height: u32, cut: usize) -> Placement {
        let effect = self.effect(cut);
        let base = width.min(height) as f32 * self.size_fraction;
        let size = (base * effect.scale).round().max(0.0) as u32;
        let (x, y) = self.anchor.origin(width, height, size);
        Placement {
            x,
            y,
            size,
            rotation: effect.rotation,
            opacity: effect.opacity,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self::collage()
    }
}

/// Returns `base` with `asset` drawn at `placement`, clipped to the base.
pub fn composite_overlay(base: &RgbaImage, asset: &OverlayAsset, placement: &Placement) -> RgbaImage {
    let mut out = base.clone();
    if placement.size == 0 || placement.opacity <= 0.0 {
        return out;
    }

    let scaled = imageops::resize(
        &asset.image,
        placement.size,
        placement.size,
        imageops::FilterType::Triangle,
    );

    if placement.rotation.abs() < f32::EPSILON {
        blend::draw_over(&mut out, &scaled, placement.x, placement.y, placement.opacity);
        return out;
    }

    // Pad to the diagonal so the rotated corners are not cut off.
    let side = (placement.size as f32 * std::f32::consts::SQRT_2).ceil() as u32 + 2;
    let pad = i64::from((side - placement.size) / 2);
    let mut padded = RgbaImage::new(side, side);
    imageops::replace(&mut padded, &scaled, pad, pad);
    let rotated = rotate_about_center(
        &padded,
        placement.rotation,
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 0]),
    );
    blend::draw_over(
        &mut out,
        &rotated,
        placement.x - pad,
        placement.y - pad,
        placement.opacity,
    );
    out
}

/// Composites the character's overlay for `cut`, falling back to cut 0's
/// overlay, and finally to the untouched base.
pub fn apply_cut_overlay(
    base: &RgbaImage,
    library: &OverlayLibrary,
    character: &Character,
    cut: usize,
    config: &OverlayConfig,
) -> RgbaImage {
    let Some(asset) = library.resolve(character, cut) else {
        return base.clone();
    };
    let (width, height) = base.dimensions();
    let placement = config.placement(width, height, cut);
    tracing::debug!(cut, ?placement, url = %asset.source_url, "compositing overlay");
    composite_overlay(base, &asset, &placement)
}

/// Live-preview composite: overlay of edge `size` at the left-bottom corner.
pub fn compose_preview(frame: &RgbaImage, asset: &OverlayAsset, size: u32) -> RgbaImage {
    let (x, y) = AnchorPolicy::LeftBottom.origin(frame.width(), frame.height(), size);
    let placement = Placement {
        x,
        y,
        size,
        rotation: 0.0,
        opacity: 1.0,
    };
    composite_overlay(frame, asset, &placement)
}
