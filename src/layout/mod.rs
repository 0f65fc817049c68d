mod draw;
pub mod geometry;
pub mod text;
pub mod variant;

use std::borrow::Cow;

use ab_glyph::FontArc;
use base64::Engine as _;
use chrono::NaiveDate;
use image::codecs::png::PngEncoder;
use image::{imageops, ExtendedColorType, ImageEncoder, RgbaImage};

use crate::compositing::blend;
use crate::{BoothError, BoothResult, CUT_COUNT};
use draw::{CELL_BORDER, FRAME_GRADIENT, GRAY, ORCHID, PANEL, PINK};
pub use geometry::{fit_rect, DrawRect, LayoutGeometry, Rect};
pub use variant::{
    Arrangement, BackgroundRemoval, CellShape, Decorations, FitPolicy, LayoutSpec, LayoutVariant,
    TextSizes,
};

/// A processed photo headed for one collage cell.
#[derive(Debug, Clone)]
pub enum PhotoSource {
    Raster(RgbaImage),
    /// Encoded bytes (PNG, JPEG, ...) decoded while the cell is drawn.
    Encoded(Vec<u8>),
}

impl PhotoSource {
    fn decode(&self) -> BoothResult<Cow<'_, RgbaImage>> {
        let image = match self {
            PhotoSource::Raster(image) => Cow::Borrowed(image),
            PhotoSource::Encoded(bytes) => Cow::Owned(
                image::load_from_memory(bytes)
                    .map_err(|e| BoothError::asset_load("photo", e))?
                    .to_rgba8(),
            ),
        };
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(BoothError::InvalidImage { width, height });
        }
        Ok(image)
    }
}

impl From<RgbaImage> for PhotoSource {
    fn from(image: RgbaImage) -> Self {
        PhotoSource::Raster(image)
    }
}

/// Text and cosmetic switches for a collage.
#[derive(Clone)]
pub struct CollageOptions {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub tagline: Option<String>,
    /// Date printed in the footer; today when unset.
    pub date: Option<NaiveDate>,
    /// Defaults to the bundled face. With `None` every text line is skipped.
    pub font: Option<FontArc>,
    pub sparkles: bool,
}

impl Default for CollageOptions {
    fn default() -> Self {
        Self {
            title: Some("AniShot".into()),
            subtitle: Some("My Four-Cut Moments".into()),
            tagline: Some("A special moment to remember".into()),
            date: None,
            font: text::bundled_font().ok(),
            sparkles: true,
        }
    }
}

impl std::fmt::Debug for CollageOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollageOptions")
            .field("title", &self.title)
            .field("subtitle", &self.subtitle)
            .field("tagline", &self.tagline)
            .field("date", &self.date)
            .field("font", &self.font.is_some())
            .field("sparkles", &self.sparkles)
            .finish()
    }
}

/// The finished collage as PNG bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCollage {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl EncodedCollage {
    pub fn to_data_url(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.png)
        )
    }
}

/// Renders and encodes a collage of exactly four photos.
pub fn build_collage(
    photos: &[PhotoSource],
    variant: LayoutVariant,
    options: &CollageOptions,
) -> BoothResult<EncodedCollage> {
    let canvas = render_collage(photos, variant, options)?;
    let (width, height) = canvas.dimensions();
    let png = encode_png(&canvas)?;
    tracing::info!("Encoded {} collage {}x{} ({} bytes)", variant, width, height, png.len());
    Ok(EncodedCollage { width, height, png })
}

pub fn encode_png(canvas: &RgbaImage) -> BoothResult<Vec<u8>> {
    let _span = tracing::debug_span!("encode_png").entered();
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(
            canvas.as_raw(),
            canvas.width(),
            canvas.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| BoothError::Encode(e.to_string()))?;
    Ok(png)
}

/// Draws the collage without encoding it.
pub fn render_collage(
    photos: &[PhotoSource],
    variant: LayoutVariant,
    options: &CollageOptions,
) -> BoothResult<RgbaImage> {
    if photos.len() != CUT_COUNT {
        return Err(BoothError::InvalidPhotoCount(photos.len()));
    }
    let _span = tracing::debug_span!("render_collage", %variant).entered();

    let spec = variant.spec();
    let geometry = LayoutGeometry::compute(&spec)?;
    let mut canvas = allocate_canvas(spec.width, spec.height)?;

    // Frame and panel
    draw::paint_diagonal_gradient(&mut canvas, &FRAME_GRADIENT);
    let frame = spec.frame_thickness;
    draw::fill_rect(
        &mut canvas,
        Rect {
            x: frame,
            y: frame,
            width: spec.width - 2 * frame,
            height: spec.height - 2 * frame,
        },
        PANEL,
    );

    let center_x = i64::from(spec.width / 2);
    if let Some(font) = &options.font {
        if spec.title_space > 0 {
            let title_baseline = i64::from(frame) + spec.text.title as i64;
            let subtitle_baseline = title_baseline + (spec.text.subtitle * 1.5) as i64;
            if let Some(title) = &options.title {
                text::draw_centered(&mut canvas, font, title, center_x, title_baseline, spec.text.title, ORCHID);
            }
            if let Some(subtitle) = &options.subtitle {
                text::draw_centered(&mut canvas, font, subtitle, center_x, subtitle_baseline, spec.text.subtitle, GRAY);
            }
        }
    }

    for (index, (photo, cell)) in photos.iter().zip(geometry.cells.iter()).enumerate() {
        draw_cell(&mut canvas, &spec, *cell, photo, index, options.font.as_ref());
    }

    if let Some(font) = &options.font {
        let date = options
            .date
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let footer_baseline = i64::from(geometry.grid_bottom()) + (spec.text.footer + 4.0) as i64;
        let stamp = format!("Shot on {}", date.format("%Y. %-m. %-d."));
        text::draw_centered(&mut canvas, font, &stamp, center_x, footer_baseline, spec.text.footer, ORCHID);
        if let Some(tagline) = &options.tagline {
            let tagline_baseline = footer_baseline + (spec.text.tagline + 12.0) as i64;
            text::draw_centered(&mut canvas, font, tagline, center_x, tagline_baseline, spec.text.tagline, GRAY);
        }
    }

    draw_decorations(&mut canvas, &spec, options.sparkles);
    Ok(canvas)
}

fn allocate_canvas(width: u32, height: u32) -> BoothResult<RgbaImage> {
    let fits = (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(4))
        .is_some_and(|bytes| bytes <= isize::MAX as usize);
    if width == 0 || height == 0 || !fits {
        return Err(BoothError::CanvasAllocation { width, height });
    }
    Ok(RgbaImage::new(width, height))
}

fn draw_cell(
    canvas: &mut RgbaImage,
    spec: &LayoutSpec,
    cell: Rect,
    photo: &PhotoSource,
    index: usize,
    font: Option<&FontArc>,
) {
    draw::fill_rect(canvas, cell, PANEL);

    match photo.decode() {
        Ok(image) => {
            let target = fit_rect(image.width(), image.height(), cell, spec.fit);
            let scaled = imageops::resize(
                image.as_ref(),
                target.width,
                target.height,
                imageops::FilterType::Triangle,
            );
            let clip = (i64::from(cell.x), i64::from(cell.y), cell.width, cell.height);
            blend::draw_over_clipped(canvas, &scaled, target.x, target.y, clip, 1.0);
        }
        Err(e) => tracing::warn!("Photo {} could not be drawn, leaving cell blank: {}", index + 1, e),
    }

    draw::stroke_rect(canvas, cell, 2, CELL_BORDER);

    let r = spec.badge_radius;
    if r > 0 {
        let cx = (cell.x + r + 4) as i32;
        let cy = (cell.y + r + 4) as i32;
        draw::fill_circle(canvas, (cx, cy), r as i32, ORCHID);
        if let Some(font) = font {
            let label = (index + 1).to_string();
            let baseline = i64::from(cy) + (spec.text.badge / 3.0).round() as i64;
            text::draw_centered(canvas, font, &label, i64::from(cx), baseline, spec.text.badge, PANEL);
        }
    }
}

fn draw_decorations(canvas: &mut RgbaImage, spec: &LayoutSpec, sparkles: bool) {
    let (w, h) = (spec.width, spec.height);
    let frame = spec.frame_thickness;
    let deco = spec.decorations;

    if deco.inner_stroke && frame >= 4 {
        let half = frame / 2;
        let rect = Rect {
            x: half.saturating_sub(1),
            y: half.saturating_sub(1),
            width: w - 2 * half.saturating_sub(1),
            height: h - 2 * half.saturating_sub(1),
        };
        draw::stroke_rect(canvas, rect, 3, draw::with_alpha(PANEL, 0.7));
    }

    let s = deco.heart_size;
    if s > 0 {
        let inset = deco.heart_inset;
        let color = draw::with_alpha(PINK, 0.8);
        let far_x = w.saturating_sub(s + inset) as f32;
        let far_y = h.saturating_sub(s + inset) as f32;
        let near = inset as f32;
        for (x, y) in [(near, near), (far_x, near), (near, far_y), (far_x, far_y)] {
            draw::fill_heart(canvas, x, y, s as f32, color);
        }
    }

    if sparkles && deco.sparkles > 0 {
        let mut rng = rand::rng();
        draw::scatter_sparkles(canvas, frame, deco.sparkles, &mut rng);
    }
}
