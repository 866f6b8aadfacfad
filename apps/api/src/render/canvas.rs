//! Pixel-level primitives over RGBA buffers: fills, shapes, and Porter-Duff
//! "over" compositing.
//!
//! The canvas is always fully opaque; overlays carry the translucency and are
//! merged with [`alpha_composite`].

use image::{Rgb, Rgba, RgbaImage};

/// Allocates an opaque canvas filled with `color`.
pub fn new_canvas(width: u32, height: u32, color: Rgb<u8>) -> RgbaImage {
    let [r, g, b] = color.0;
    RgbaImage::from_pixel(width, height, Rgba([r, g, b, 255]))
}

/// Allocates a fully transparent overlay matching `canvas` exactly.
pub fn overlay_for(canvas: &RgbaImage) -> RgbaImage {
    RgbaImage::new(canvas.width(), canvas.height())
}

/// Paints scanline `y` across the full width.
pub fn fill_row(canvas: &mut RgbaImage, y: u32, color: Rgba<u8>) {
    if y >= canvas.height() {
        return;
    }
    for x in 0..canvas.width() {
        canvas.put_pixel(x, y, color);
    }
}

/// Fills the disc centred at `(cx, cy)`; pixels outside the buffer are clipped.
pub fn fill_circle(image: &mut RgbaImage, cx: i64, cy: i64, radius: i64, color: Rgba<u8>) {
    if radius < 0 || image.width() == 0 || image.height() == 0 {
        return;
    }
    let max_x = i64::from(image.width()) - 1;
    let max_y = i64::from(image.height()) - 1;
    let x0 = (cx - radius).max(0);
    let x1 = (cx + radius).min(max_x);
    let y0 = (cy - radius).max(0);
    let y1 = (cy + radius).min(max_y);
    let r2 = radius * radius;

    for y in y0..=y1 {
        let dy = y - cy;
        for x in x0..=x1 {
            let dx = x - cx;
            if dx * dx + dy * dy <= r2 {
                image.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

/// Fills the inclusive rectangle `(x0, y0)..=(x1, y1)`, clipped to the buffer.
pub fn fill_rect(image: &mut RgbaImage, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgba<u8>) {
    if image.width() == 0 || image.height() == 0 {
        return;
    }
    let x0 = x0.max(0);
    let y0 = y0.max(0);
    let x1 = x1.min(i64::from(image.width()) - 1);
    let y1 = y1.min(i64::from(image.height()) - 1);

    for y in y0..=y1 {
        for x in x0..=x1 {
            image.put_pixel(x as u32, y as u32, color);
        }
    }
}

/// Composites `overlay` over `base` in place ("source over").
pub fn alpha_composite(base: &mut RgbaImage, overlay: &RgbaImage) {
    debug_assert_eq!(base.dimensions(), overlay.dimensions());

    for (dst, src) in base.pixels_mut().zip(overlay.pixels()) {
        *dst = over(*dst, *src);
    }
}

/// Blends `color` onto the pixel at `(x, y)` with the given coverage (0.0..=1.0).
pub fn blend_pixel(image: &mut RgbaImage, x: i32, y: i32, color: Rgb<u8>, coverage: f32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if x >= image.width() || y >= image.height() {
        return;
    }
    let alpha = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
    if alpha == 0 {
        return;
    }
    let [r, g, b] = color.0;
    let dst = image.get_pixel_mut(x, y);
    *dst = over(*dst, Rgba([r, g, b, alpha]));
}

fn over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = f32::from(src.0[3]) / 255.0;
    if sa <= 0.0 {
        return dst;
    }
    let da = f32::from(dst.0[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |i: usize| {
        let sc = f32::from(src.0[i]);
        let dc = f32::from(dst.0[i]);
        ((sc * sa + dc * da * (1.0 - sa)) / out_a).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(0),
        channel(1),
        channel(2),
        (out_a * 255.0).round() as u8,
    ])
}
