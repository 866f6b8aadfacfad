//! Placeholder image synthesis.
//!
//! Produces a PNG from nothing but a prompt and a size: a vertical gradient,
//! three translucent accent circles, a dark caption panel, and the wrapped
//! prompt text. Used whenever the external model path is unavailable.
//!
//! Layering order matters for the final colours: each accent circle is
//! composited onto the result of the previous one, then the panel, then text.

use std::io::Cursor;

use chrono::Local;
use image::{DynamicImage, ImageFormat, Rgb, Rgba, RgbaImage};
use rand::Rng;
use tracing::debug;

use crate::layout::{resolve_font, wrap_text};
use crate::render::canvas::{
    alpha_composite, fill_circle, fill_rect, fill_row, new_canvas, overlay_for,
};
use crate::render::text::draw_text;
use crate::render::RenderError;

/// Prompts are cut to this many characters before layout.
pub const PROMPT_CHAR_LIMIT: usize = 100;
/// Rendered in place of an empty prompt.
pub const EMPTY_PROMPT_TEXT: &str = "AI Demo";

pub const HEADER_LABEL: &str = "AI PORTFOLIO PROJECT";
pub const FOOTER_LABEL: &str = "Rust • image • AI";

const GRADIENT_START: [u8; 3] = [20, 25, 35];
const GRADIENT_END: [u8; 3] = [60, 45, 85];

const ACCENT_PALETTE: [Rgba<u8>; 3] = [
    Rgba([100, 180, 255, 60]),
    Rgba([255, 100, 150, 40]),
    Rgba([150, 255, 150, 50]),
];
const ACCENT_MIN_RADIUS: i64 = 50;
const ACCENT_MAX_RADIUS: i64 = 120;

const PANEL_FILL: Rgba<u8> = Rgba([10, 15, 25, 180]);

const HEADER_COLOR: Rgb<u8> = Rgb([200, 210, 230]);
const BODY_COLOR: Rgb<u8> = Rgb([240, 245, 255]);
const TIMESTAMP_COLOR: Rgb<u8> = Rgb([160, 170, 190]);
const FOOTER_COLOR: Rgb<u8> = Rgb([100, 180, 255]);

const TEXT_MARGIN: i32 = 30;
const HEADER_Y: i32 = 20;
const PANEL_TEXT_OFFSET: i32 = 40;
const LINE_ADVANCE: i32 = 35;
const FOOTER_OFFSET: i32 = 30;
const FOOTER_LABEL_INSET: i32 = 200;

const BODY_FONT_MAX_PX: u32 = 24;
const CAPTION_FONT_MAX_PX: u32 = 16;

/// One translucent accent circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accent {
    pub cx: i64,
    pub cy: i64,
    pub radius: i64,
    pub color: Rgba<u8>,
}

/// Renders the placeholder for `prompt` and returns PNG bytes.
///
/// Accent placement is random and the footer carries the current local time.
pub fn compose(prompt: &str, width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    compose_with(prompt, width, height, &mut rand::thread_rng(), &timestamp)
}

/// [`compose`] with an explicit random source and timestamp text.
pub fn compose_with<R: Rng + ?Sized>(
    prompt: &str,
    width: u32,
    height: u32,
    rng: &mut R,
    timestamp: &str,
) -> Result<Vec<u8>, RenderError> {
    let canvas = render_canvas(prompt, width, height, rng, timestamp)?;
    encode_png(canvas)
}

/// Builds the composited canvas without encoding it.
pub fn render_canvas<R: Rng + ?Sized>(
    prompt: &str,
    width: u32,
    height: u32,
    rng: &mut R,
    timestamp: &str,
) -> Result<RgbaImage, RenderError> {
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidDimensions { width, height });
    }

    let mut canvas = new_canvas(width, height, Rgb(GRADIENT_START));

    // Background
    for y in 0..height {
        fill_row(&mut canvas, y, gradient_color(y, height));
    }

    // Accents, one overlay each
    for accent in accent_placements(rng, width, height) {
        let mut overlay = overlay_for(&canvas);
        fill_circle(&mut overlay, accent.cx, accent.cy, accent.radius, accent.color);
        alpha_composite(&mut canvas, &overlay);
    }

    // Caption panel
    let text_area_height = height / 3;
    let panel_top = i64::from(height - text_area_height);
    let mut overlay = overlay_for(&canvas);
    fill_rect(
        &mut overlay,
        0,
        panel_top,
        i64::from(width),
        i64::from(height),
        PANEL_FILL,
    );
    alpha_composite(&mut canvas, &overlay);

    // Text
    let body_font = resolve_font((width / 30).min(BODY_FONT_MAX_PX));
    let caption_font = resolve_font((width / 40).min(CAPTION_FONT_MAX_PX));
    debug!(
        builtin = body_font.is_builtin(),
        ?body_font,
        ?caption_font,
        "Resolved placeholder fonts"
    );

    draw_text(
        &mut canvas,
        &body_font,
        TEXT_MARGIN,
        HEADER_Y,
        HEADER_COLOR,
        HEADER_LABEL,
    );

    let text = caption_text(prompt);
    let budget = width.saturating_sub(2 * TEXT_MARGIN as u32) as f32;
    let lines = wrap_text(&text, budget, |s| body_font.measure(s));

    let (w, h) = (width as i32, height as i32);
    let mut y = h - text_area_height as i32 + PANEL_TEXT_OFFSET;
    for line in &lines {
        draw_text(&mut canvas, &body_font, TEXT_MARGIN, y, BODY_COLOR, line);
        y += LINE_ADVANCE;
    }

    draw_text(
        &mut canvas,
        &caption_font,
        TEXT_MARGIN,
        h - FOOTER_OFFSET,
        TIMESTAMP_COLOR,
        timestamp,
    );
    draw_text(
        &mut canvas,
        &caption_font,
        w - FOOTER_LABEL_INSET,
        h - FOOTER_OFFSET,
        FOOTER_COLOR,
        FOOTER_LABEL,
    );

    Ok(canvas)
}

/// The text actually laid out for `prompt`: the first [`PROMPT_CHAR_LIMIT`] characters.
pub fn caption_text(prompt: &str) -> String {
    if prompt.is_empty() {
        return EMPTY_PROMPT_TEXT.to_string();
    }
    prompt.chars().take(PROMPT_CHAR_LIMIT).collect()
}

/// Scanline colour, interpolated linearly from the top to the bottom colour.
pub fn gradient_color(y: u32, height: u32) -> Rgba<u8> {
    let ratio = f64::from(y) / f64::from(height.max(1));
    let lerp = |i: usize| {
        let start = f64::from(GRADIENT_START[i]);
        let end = f64::from(GRADIENT_END[i]);
        (start + (end - start) * ratio) as u8
    };
    Rgba([lerp(0), lerp(1), lerp(2), 255])
}

/// Draws the three accent placements, in palette order.
pub fn accent_placements<R: Rng + ?Sized>(rng: &mut R, width: u32, height: u32) -> [Accent; 3] {
    let (w, h) = (i64::from(width), i64::from(height));
    ACCENT_PALETTE.map(|color| Accent {
        cx: uniform(rng, w / 4, 3 * w / 4),
        cy: uniform(rng, h / 6, h / 3),
        radius: rng.gen_range(ACCENT_MIN_RADIUS..=ACCENT_MAX_RADIUS),
        color,
    })
}

/// Uniform in `[low, high)`; collapses to `low` when the range is empty.
fn uniform<R: Rng + ?Sized>(rng: &mut R, low: i64, high: i64) -> i64 {
    if high > low {
        rng.gen_range(low..high)
    } else {
        low
    }
}

fn encode_png(canvas: RgbaImage) -> Result<Vec<u8>, RenderError> {
    let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();
    let mut buf = Cursor::new(Vec::new());
    rgb.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
