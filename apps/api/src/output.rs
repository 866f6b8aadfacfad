//! Local persistence of generated images as `<character>_<YYYYMMDD_HHMMSS>.png`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

/// File name for an image generated for `character` at `at`.
///
/// Characters outside `[A-Za-z0-9_-]` are replaced so the name cannot escape
/// the output directory.
pub fn image_filename(character: &str, at: DateTime<Local>) -> String {
    let mut stem: String = character
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        stem.push_str("image");
    }
    format!("{stem}_{}.png", at.format("%Y%m%d_%H%M%S"))
}

/// Writes `png` into `dir` (created if missing) and returns the full path.
pub async fn save_image(dir: &Path, filename: &str, png: &[u8]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let path = dir.join(filename);
    tokio::fs::write(&path, png)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
