use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use image::RgbaImage;
use resvg::{tiny_skia, usvg};

use crate::catalog::Character;
use crate::{BoothError, BoothResult};

/// A decoded character overlay.
#[derive(Debug, Clone)]
pub struct OverlayAsset {
    pub source_url: String,
    pub natural_width: u32,
    pub natural_height: u32,
    pub image: RgbaImage,
}

/// Where overlay bytes come from.
pub trait AssetSource: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Resolves site-relative URLs such as `/characters/levi.png` under a root
/// directory.
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, url: &str) -> PathBuf {
        self.root.join(url.trim_start_matches('/'))
    }
}

impl AssetSource for DirectoryAssets {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let path = self.resolve(url);
        std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))
    }
}

/// Decodes raster formats through `image` and rasterizes SVG at its natural
/// size.
pub fn decode_overlay(url: &str, bytes: &[u8]) -> BoothResult<OverlayAsset> {
    let image = if looks_like_svg(url, bytes) {
        rasterize_svg(bytes).map_err(|e| BoothError::asset_load(url, format!("{e:#}")))?
    } else {
        image::load_from_memory(bytes)
            .map_err(|e| BoothError::asset_load(url, e))?
            .to_rgba8()
    };

    let (natural_width, natural_height) = image.dimensions();
    if natural_width == 0 || natural_height == 0 {
        return Err(BoothError::asset_load(url, "image has no pixels"));
    }

    Ok(OverlayAsset {
        source_url: url.to_string(),
        natural_width,
        natural_height,
        image,
    })
}

fn looks_like_svg(url: &str, bytes: &[u8]) -> bool {
    if url.to_ascii_lowercase().ends_with(".svg") {
        return true;
    }
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]);
    let head = head.trim_start();
    head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
}

fn rasterize_svg(bytes: &[u8]) -> Result<RgbaImage> {
    let tree = usvg::Tree::from_data(bytes, &usvg::Options::default()).context("parse svg tree")?;
    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
        .context("svg has an empty canvas")?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    let mut rgba = pixmap.take();
    unpremultiply_in_place(&mut rgba);
    RgbaImage::from_raw(size.width(), size.height(), rgba).context("svg pixel buffer size")
}

fn unpremultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

/// Loads overlays on demand and keeps them per character and cut.
pub struct OverlayLibrary {
    source: Box<dyn AssetSource>,
    cache: Mutex<HashMap<(String, usize), Arc<OverlayAsset>>>,
}

impl OverlayLibrary {
    pub fn new(source: impl AssetSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The overlay assigned to `cut`. Failures are not cached.
    pub fn load(&self, character: &Character, cut: usize) -> BoothResult<Arc<OverlayAsset>> {
        let key = (character.id.clone(), cut);
        if let Some(hit) = self.cache.lock().ok().and_then(|c| c.get(&key).cloned()) {
            return Ok(hit);
        }

        let url = character.overlay_url(cut).ok_or_else(|| {
            BoothError::asset_load(format!("{}#{}", character.id, cut), "no overlay for cut")
        })?;
        let _span = tracing::debug_span!("overlay_load", url).entered();
        let bytes = self
            .source
            .fetch(url)
            .map_err(|e| BoothError::asset_load(url, format!("{e:#}")))?;
        let asset = Arc::new(decode_overlay(url, &bytes)?);

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, asset.clone());
        }
        Ok(asset)
    }

    /// The cut's overlay, else cut 0's, else nothing.
    pub fn resolve(&self, character: &Character, cut: usize) -> Option<Arc<OverlayAsset>> {
        match self.load(character, cut) {
            Ok(asset) => return Some(asset),
            Err(e) => tracing::warn!("Overlay for cut {} unavailable: {}", cut + 1, e),
        }
        if cut == 0 {
            return None;
        }
        match self.load(character, 0) {
            Ok(asset) => {
                tracing::info!("Using cut 1 overlay for cut {}", cut + 1);
                Some(asset)
            }
            Err(e) => {
                tracing::warn!("Fallback overlay unavailable, cut {} stays plain: {}", cut + 1, e);
                None
            }
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }
}
