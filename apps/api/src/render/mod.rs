// Placeholder rendering: pixel primitives, text drawing, and the compositor.
// Everything here is synchronous and CPU-bound.

pub mod canvas;
pub mod compositor;
pub mod text;

use thiserror::Error;

pub use compositor::compose;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid canvas dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}
