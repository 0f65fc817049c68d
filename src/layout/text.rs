use std::path::Path;

use ab_glyph::{Font, FontArc, FontRef, FontVec, PxScale, ScaleFont};
use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use resvg::usvg::fontdb::{Database, Family, Query, Weight};

/// DejaVu Sans Bold, used when neither a configured nor a system face loads.
static BUNDLED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

/// Preferred families, most specific first.
const FAMILIES: &[Family<'static>] = &[
    Family::Name("DejaVu Sans"),
    Family::Name("Liberation Sans"),
    Family::Name("Noto Sans"),
    Family::Name("Arial"),
    Family::SansSerif,
];

pub fn load_font_file(path: &Path) -> Result<FontArc> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read font {}", path.display()))?;
    FontArc::try_from_vec(bytes).with_context(|| format!("Invalid font {}", path.display()))
}

pub fn bundled_font() -> Result<FontArc> {
    let font = FontRef::try_from_slice(BUNDLED_FONT).context("Invalid bundled font")?;
    Ok(FontArc::new(font))
}

/// A bold sans-serif face installed on this machine.
pub fn system_font() -> Option<FontArc> {
    let mut db = Database::new();
    db.load_system_fonts();

    let id = db.query(&Query {
        families: FAMILIES,
        weight: Weight::BOLD,
        ..Query::default()
    })?;
    let font = db.with_face_data(id, |data, index| {
        FontVec::try_from_vec_and_index(data.to_vec(), index)
    })?;
    match font {
        Ok(font) => {
            if let Some(face) = db.face(id) {
                tracing::debug!("Using system font {:?}", face.post_script_name);
            }
            Some(FontArc::new(font))
        }
        Err(e) => {
            tracing::warn!("System font could not be parsed: {}", e);
            None
        }
    }
}

/// The configured font, else a system face, else the bundled one.
pub fn find_font(configured: Option<&Path>) -> Option<FontArc> {
    if let Some(path) = configured {
        match load_font_file(path) {
            Ok(font) => return Some(font),
            Err(e) => tracing::warn!("{:#}; trying system fonts", e),
        }
    }

    system_font().or_else(|| match bundled_font() {
        Ok(font) => {
            tracing::debug!("No system font found, using the bundled face");
            Some(font)
        }
        Err(e) => {
            tracing::warn!("{:#}, collage text will be skipped", e);
            None
        }
    })
}

/// Draws a single line centred on `center_x` with its baseline at `baseline`.
pub fn draw_centered(
    canvas: &mut RgbaImage,
    font: &FontArc,
    text: &str,
    center_x: i64,
    baseline: i64,
    px: f32,
    color: Rgba<u8>,
) {
    if text.is_empty() || px <= 0.0 {
        return;
    }
    let scale = PxScale::from(px);
    let (width, _) = text_size(scale, font, text);
    let ascent = font.as_scaled(scale).ascent();

    let x = center_x - i64::from(width) / 2;
    let y = baseline - ascent.round() as i64;
    draw_text_mut(canvas, color, x as i32, y as i32, scale, font, text);
}
