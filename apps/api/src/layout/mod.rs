// Text layout for the placeholder renderer: font resolution, measurement, wrapping.
// Pure CPU work; callers in async context run it inside tokio::task::spawn_blocking.

pub mod font_metrics;
pub mod wrap;

pub use font_metrics::{resolve_font, FontHandle};
pub use wrap::wrap_text;
