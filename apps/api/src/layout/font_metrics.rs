//! Font resolution and text measurement for the placeholder renderer.
//!
//! Fonts are looked up from a fixed list of well-known system locations on
//! every call. When none of them can be loaded, a built-in bitmap font is used
//! so rendering never fails for lack of a font file.

use std::fmt;
use std::path::{Path, PathBuf};

use embedded_graphics::mono_font::{ascii::FONT_10X20, MonoFont};
use rusttype::{point, Font, Scale};
use tracing::debug;

// ────────────────────────────────────────────────────────────────────────────
// Candidate font locations
// ────────────────────────────────────────────────────────────────────────────

/// System font files probed in order (Windows, Linux, macOS).
pub const FONT_CANDIDATES: &[&str] = &[
    "C:/Windows/Fonts/arial.ttf",
    "C:/Windows/Fonts/calibri.ttf",
    "C:/Windows/Fonts/segoeui.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    "/Library/Fonts/Arial.ttf",
];

/// Bitmap font used when no candidate file is usable. Fixed 10×20 cell.
pub fn builtin_font() -> &'static MonoFont<'static> {
    &FONT_10X20
}

// ────────────────────────────────────────────────────────────────────────────
// Font handle
// ────────────────────────────────────────────────────────────────────────────

/// A loaded font ready for measuring and drawing.
#[derive(Clone)]
pub enum FontHandle {
    /// A TrueType/OpenType face loaded from disk, scaled to a pixel size.
    TrueType {
        font: Font<'static>,
        scale: Scale,
        path: PathBuf,
    },
    /// The embedded bitmap fallback. Does not honour the requested pixel size.
    Builtin(&'static MonoFont<'static>),
}

impl fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontHandle::TrueType { scale, path, .. } => f
                .debug_struct("TrueType")
                .field("path", path)
                .field("px", &scale.y)
                .finish(),
            FontHandle::Builtin(font) => f
                .debug_tuple("Builtin")
                .field(&font.character_size)
                .finish(),
        }
    }
}

impl FontHandle {
    pub fn is_builtin(&self) -> bool {
        matches!(self, FontHandle::Builtin(_))
    }

    /// Measures the advance width of `text` in pixels.
    ///
    /// For TrueType faces this is the pen position after the last glyph, so
    /// kerning and trailing side bearings are included.
    pub fn measure(&self, text: &str) -> f32 {
        match self {
            FontHandle::TrueType { font, scale, .. } => font
                .layout(text, *scale, point(0.0, 0.0))
                .last()
                .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
                .unwrap_or(0.0),
            FontHandle::Builtin(font) => {
                let count = text.chars().count() as u32;
                if count == 0 {
                    return 0.0;
                }
                let advance = font.character_size.width + font.character_spacing;
                (count * advance - font.character_spacing) as f32
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Resolution
// ────────────────────────────────────────────────────────────────────────────

/// Resolves a font at `pixel_size` from [`FONT_CANDIDATES`].
///
/// Never fails: falls back to [`builtin_font`].
pub fn resolve_font(pixel_size: u32) -> FontHandle {
    resolve_font_from(FONT_CANDIDATES, pixel_size)
}

/// Resolves the first loadable font among `candidates`.
///
/// Missing, unreadable, or unparseable files are skipped.
pub fn resolve_font_from<P: AsRef<Path>>(candidates: &[P], pixel_size: u32) -> FontHandle {
    let px = pixel_size.max(1) as f32;

    for candidate in candidates {
        let path = candidate.as_ref();
        if !path.exists() {
            continue;
        }

        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                debug!("Skipping font {}: {e}", path.display());
                continue;
            }
        };

        match Font::try_from_vec(bytes) {
            Some(font) => {
                return FontHandle::TrueType {
                    font,
                    scale: Scale::uniform(px),
                    path: path.to_path_buf(),
                };
            }
            None => debug!("Skipping font {}: not a parseable font file", path.display()),
        }
    }

    debug!("No system font found, using built-in bitmap font");
    FontHandle::Builtin(builtin_font())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
