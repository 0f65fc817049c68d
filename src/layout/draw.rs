use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, draw_polygon_mut, Blend,
};
use imageproc::point::Point;
use imageproc::rect::Rect as ProcRect;
use rand::Rng;

use super::geometry::Rect;

pub const PINK: Rgba<u8> = Rgba([0xFF, 0xE0, 0xF7, 0xFF]);
pub const LAVENDER: Rgba<u8> = Rgba([0xE1, 0xBE, 0xE7, 0xFF]);
pub const ORCHID: Rgba<u8> = Rgba([0xBA, 0x68, 0xC8, 0xFF]);
pub const PURPLE: Rgba<u8> = Rgba([0x9C, 0x27, 0xB0, 0xFF]);
pub const GRAY: Rgba<u8> = Rgba([0x66, 0x66, 0x66, 0xFF]);
pub const CELL_BORDER: Rgba<u8> = Rgba([0xE0, 0xE0, 0xE0, 0xFF]);
pub const PANEL: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);

pub const FRAME_GRADIENT: [(f32, Rgba<u8>); 4] =
    [(0.0, PINK), (0.3, LAVENDER), (0.7, ORCHID), (1.0, PURPLE)];

pub fn with_alpha(color: Rgba<u8>, alpha: f32) -> Rgba<u8> {
    let mut c = color;
    c[3] = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    c
}

/// Linear gradient from the top-left corner to the bottom-right corner.
pub fn paint_diagonal_gradient(canvas: &mut RgbaImage, stops: &[(f32, Rgba<u8>)]) {
    let (w, h) = canvas.dimensions();
    let (wf, hf) = (w as f32, h as f32);
    let len_sq = (wf * wf + hf * hf).max(1.0);
    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let t = ((x as f32 + 0.5) * wf + (y as f32 + 0.5) * hf) / len_sq;
        *pixel = sample_stops(stops, t);
    }
}

fn sample_stops(stops: &[(f32, Rgba<u8>)], t: f32) -> Rgba<u8> {
    let t = t.clamp(0.0, 1.0);
    let Some(&(_, first)) = stops.first() else {
        return PANEL;
    };
    let mut prev = (0.0, first);
    for &(offset, color) in stops {
        if t <= offset {
            let span = offset - prev.0;
            let k = if span > 0.0 { (t - prev.0) / span } else { 1.0 };
            return lerp(prev.1, color, k);
        }
        prev = (offset, color);
    }
    prev.1
}

fn lerp(a: Rgba<u8>, b: Rgba<u8>, k: f32) -> Rgba<u8> {
    let mut out = [0u8; 4];
    for i in 0..4 {
        let v = f32::from(a[i]) + (f32::from(b[i]) - f32::from(a[i])) * k;
        out[i] = v.round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

pub fn fill_rect(canvas: &mut RgbaImage, rect: Rect, color: Rgba<u8>) {
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    let r = ProcRect::at(rect.x as i32, rect.y as i32).of_size(rect.width, rect.height);
    draw_filled_rect_mut(canvas, r, color);
}

/// Stroke of `thickness` pixels drawn inside `rect`. Translucent colours
/// blend with what is underneath.
pub fn stroke_rect(canvas: &mut RgbaImage, rect: Rect, thickness: u32, color: Rgba<u8>) {
    let mut blend = Blend(std::mem::take(canvas));
    for i in 0..thickness {
        let (w, h) = (
            rect.width.saturating_sub(2 * i),
            rect.height.saturating_sub(2 * i),
        );
        if w == 0 || h == 0 {
            break;
        }
        let r = ProcRect::at((rect.x + i) as i32, (rect.y + i) as i32).of_size(w, h);
        draw_hollow_rect_mut(&mut blend, r, color);
    }
    *canvas = blend.0;
}

pub fn fill_circle(canvas: &mut RgbaImage, center: (i32, i32), radius: i32, color: Rgba<u8>) {
    let mut blend = Blend(std::mem::take(canvas));
    draw_filled_circle_mut(&mut blend, center, radius, color);
    *canvas = blend.0;
}

/// Heart whose bounding box is `size` x `size` at (`x`, `y`).
pub fn fill_heart(canvas: &mut RgbaImage, x: f32, y: f32, size: f32, color: Rgba<u8>) {
    let s = size;
    let q = s / 4.0;
    let mut path = vec![(x, y + q)];
    let curves = [
        ((x, y), (x + q, y)),
        ((x + s / 2.0, y), (x + s / 2.0, y + q)),
        ((x + s / 2.0, y), (x + 3.0 * q, y)),
        ((x + s, y), (x + s, y + q)),
        ((x + s, y + s / 2.0), (x + 3.0 * q, y + 3.0 * q)),
    ];
    for (control, end) in curves {
        quad_to(&mut path, control, end);
    }
    path.push((x + s / 2.0, y + s));
    path.push((x + q, y + 3.0 * q));
    quad_to(&mut path, (x, y + s / 2.0), (x, y + q));

    let mut points: Vec<Point<i32>> = Vec::with_capacity(path.len());
    for (px, py) in path {
        let p = Point::new(px.round() as i32, py.round() as i32);
        if points.last() != Some(&p) {
            points.push(p);
        }
    }
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    if points.len() < 3 {
        return;
    }

    let mut blend = Blend(std::mem::take(canvas));
    draw_polygon_mut(&mut blend, &points, color);
    *canvas = blend.0;
}

fn quad_to(path: &mut Vec<(f32, f32)>, control: (f32, f32), end: (f32, f32)) {
    const STEPS: u32 = 6;
    let Some(&start) = path.last() else {
        return;
    };
    for i in 1..=STEPS {
        let t = i as f32 / STEPS as f32;
        let u = 1.0 - t;
        path.push((
            u * u * start.0 + 2.0 * u * t * control.0 + t * t * end.0,
            u * u * start.1 + 2.0 * u * t * control.1 + t * t * end.1,
        ));
    }
}

/// Sprinkles up to `count` small translucent dots over the frame border.
pub fn scatter_sparkles(canvas: &mut RgbaImage, frame: u32, count: u32, rng: &mut impl Rng) {
    let (w, h) = canvas.dimensions();
    if frame < 4 || w <= 2 * frame || h <= 2 * frame {
        return;
    }
    for _ in 0..count {
        let radius = rng.random_range(1..=(frame / 6).max(1));
        let depth = rng.random_range(radius..frame - radius) as i32;
        let along = rng.random_range(0.0..1.0f32);
        let (cx, cy) = match rng.random_range(0..4u8) {
            0 => ((along * w as f32) as i32, depth),
            1 => ((along * w as f32) as i32, h as i32 - depth),
            2 => (depth, (along * h as f32) as i32),
            _ => (w as i32 - depth, (along * h as f32) as i32),
        };
        let alpha = rng.random_range(0.4..0.9f32);
        fill_circle(canvas, (cx, cy), radius as i32, with_alpha(PANEL, alpha));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_runs_from_first_to_last_stop() {
        let mut canvas = RgbaImage::new(100, 100);
        paint_diagonal_gradient(&mut canvas, &FRAME_GRADIENT);
        let top_left = canvas.get_pixel(0, 0);
        let bottom_right = canvas.get_pixel(99, 99);
        assert!((i32::from(top_left[1]) - 0xE0).abs() <= 3);
        assert!((i32::from(bottom_right[1]) - 0x27).abs() <= 3);
        assert_eq!(top_left[3], 255);
    }

    #[test]
    fn stroke_stays_inside_rect() {
        let mut canvas = RgbaImage::from_pixel(10, 10, PANEL);
        let rect = Rect {
            x: 2,
            y: 2,
            width: 6,
            height: 6,
        };
        stroke_rect(&mut canvas, rect, 2, Rgba([0, 0, 0, 255]));
        assert_eq!(*canvas.get_pixel(1, 1), PANEL);
        assert_eq!(*canvas.get_pixel(2, 2), Rgba([0, 0, 0, 255]));
        assert_eq!(*canvas.get_pixel(3, 5), Rgba([0, 0, 0, 255]));
        assert_eq!(*canvas.get_pixel(4, 4), PANEL);
    }

    #[test]
    fn heart_fills_its_middle() {
        let mut canvas = RgbaImage::from_pixel(40, 40, PANEL);
        fill_heart(&mut canvas, 4.0, 4.0, 32.0, PURPLE);
        let middle = canvas.get_pixel(20, 20);
        for i in 0..4 {
            assert!((i32::from(middle[i]) - i32::from(PURPLE[i])).abs() <= 1);
        }
        assert_eq!(*canvas.get_pixel(1, 38), PANEL);
    }

    #[test]
    fn sparkles_never_touch_the_panel() {
        let mut canvas = RgbaImage::from_pixel(120, 120, PURPLE);
        let inner = Rect {
            x: 16,
            y: 16,
            width: 88,
            height: 88,
        };
        fill_rect(&mut canvas, inner, PANEL);
        let before = canvas.clone();
        scatter_sparkles(&mut canvas, 16, 200, &mut rand::rng());
        for y in 16..104 {
            for x in 16..104 {
                assert_eq!(canvas.get_pixel(x, y), before.get_pixel(x, y));
            }
        }
    }
}
