//! Draws a single line of text onto an RGBA canvas.
//!
//! `(x, y)` is the top-left of the text box: the ascender line for TrueType
//! faces, the top of the cell for the bitmap fallback.

use std::convert::Infallible;

use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Point, Size},
    mono_font::MonoTextStyle,
    pixelcolor::{Rgb888, RgbColor},
    text::{Baseline, Text},
    Drawable, Pixel,
};
use image::{Rgb, Rgba, RgbaImage};
use rusttype::point;

use crate::layout::FontHandle;
use crate::render::canvas::blend_pixel;

pub fn draw_text(
    canvas: &mut RgbaImage,
    font: &FontHandle,
    x: i32,
    y: i32,
    color: Rgb<u8>,
    text: &str,
) {
    if text.is_empty() {
        return;
    }

    match font {
        FontHandle::TrueType { font, scale, .. } => {
            let ascent = font.v_metrics(*scale).ascent;
            let origin = point(x as f32, y as f32 + ascent);

            for glyph in font.layout(text, *scale, origin) {
                let Some(bb) = glyph.pixel_bounding_box() else {
                    continue;
                };
                glyph.draw(|gx, gy, coverage| {
                    blend_pixel(
                        canvas,
                        bb.min.x + gx as i32,
                        bb.min.y + gy as i32,
                        color,
                        coverage,
                    );
                });
            }
        }
        FontHandle::Builtin(mono) => {
            let [r, g, b] = color.0;
            let style = MonoTextStyle::new(*mono, Rgb888::new(r, g, b));
            let mut target = CanvasTarget { image: canvas };
            if let Err(never) =
                Text::with_baseline(text, Point::new(x, y), style, Baseline::Top).draw(&mut target)
            {
                match never {}
            }
        }
    }
}

/// Adapts an `RgbaImage` as an embedded-graphics draw target.
struct CanvasTarget<'a> {
    image: &'a mut RgbaImage,
}

impl OriginDimensions for CanvasTarget<'_> {
    fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }
}

impl DrawTarget for CanvasTarget<'_> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, color) in pixels {
            if p.x < 0 || p.y < 0 {
                continue;
            }
            let (px, py) = (p.x as u32, p.y as u32);
            if px >= self.image.width() || py >= self.image.height() {
                continue;
            }
            self.image
                .put_pixel(px, py, Rgba([color.r(), color.g(), color.b(), 255]));
        }
        Ok(())
    }
}
