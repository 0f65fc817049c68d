use image::{Rgba, RgbaImage};

/// Source-over for straight (non-premultiplied) RGBA8.
pub fn over(dst: Rgba<u8>, src: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);
    let da = mul_div255(u16::from(dst[3]), inv);
    let out_a = u32::from(sa) + u32::from(da);
    if out_a == 0 {
        return Rgba([0, 0, 0, 0]);
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let num = u32::from(src[i]) * u32::from(sa) + u32::from(dst[i]) * u32::from(da);
        out[i] = ((num + out_a / 2) / out_a).min(255) as u8;
    }
    out[3] = out_a.min(255) as u8;
    Rgba(out)
}

/// Draws `src` with its top-left at (`x`, `y`), clipped to `clip` and the
/// canvas bounds. `clip` is `(x, y, width, height)`.
pub fn draw_over_clipped(
    canvas: &mut RgbaImage,
    src: &RgbaImage,
    x: i64,
    y: i64,
    clip: (i64, i64, u32, u32),
    opacity: f32,
) {
    let (cw, ch) = canvas.dimensions();
    let (clip_x, clip_y, clip_w, clip_h) = clip;

    let x0 = x.max(clip_x).max(0);
    let y0 = y.max(clip_y).max(0);
    let x1 = (x + i64::from(src.width()))
        .min(clip_x + i64::from(clip_w))
        .min(i64::from(cw));
    let y1 = (y + i64::from(src.height()))
        .min(clip_y + i64::from(clip_h))
        .min(i64::from(ch));

    for dy in y0..y1 {
        for dx in x0..x1 {
            let s = *src.get_pixel((dx - x) as u32, (dy - y) as u32);
            let d = canvas.get_pixel_mut(dx as u32, dy as u32);
            *d = over(*d, s, opacity);
        }
    }
}

/// Draws `src` at (`x`, `y`) clipped only to the canvas.
pub fn draw_over(canvas: &mut RgbaImage, src: &RgbaImage, x: i64, y: i64, opacity: f32) {
    let (w, h) = canvas.dimensions();
    draw_over_clipped(canvas, src, x, y, (0, 0, w, h), opacity);
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}
