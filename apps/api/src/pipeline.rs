//! One-shot generation for the `generate` subcommand.
//!
//! prompt lookup → image generation → local save → optional upload.
//! [`run_generate`] reports a failed generation or local write as an error;
//! a missing prompt or a failed upload is logged and the run still completes.
//! [`run_from_config`] logs every failure and never fails the command.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Local;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::generation::facade::{GenerationRequest, Generator, ImageSource};
use crate::nocodb::NocoDbClient;
use crate::output::{image_filename, save_image};
use crate::prompts::PromptStore;

#[derive(Debug)]
pub struct PipelineOutcome {
    pub saved_to: PathBuf,
    pub source: ImageSource,
    /// Storage API response when the upload succeeded.
    pub uploaded: Option<Value>,
}

/// Builds every collaborator from `config` and runs one generation.
pub async fn run_from_config(
    config: &Config,
    character: &str,
    out_dir: Option<PathBuf>,
) -> Result<()> {
    let generator = Generator::from_config(config);
    let prompts = PromptStore::from_config(config);
    let storage = match config.nocodb() {
        Some(settings) => match NocoDbClient::new(&settings) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("NocoDB client unavailable, skipping upload: {e}");
                None
            }
        },
        None => None,
    };
    let out_dir = out_dir.unwrap_or_else(|| config.output_dir.clone());

    let limits = RunLimits {
        max_dimension: config.max_image_dimension,
    };

    let run = run_generate(
        &generator,
        &prompts,
        storage.as_ref(),
        character,
        &out_dir,
        limits,
    );
    match run.await {
        Ok(Some(outcome)) => info!(
            "Done: {} ({:?}, uploaded: {})",
            outcome.saved_to.display(),
            outcome.source,
            outcome.uploaded.is_some()
        ),
        Ok(None) => info!("Nothing generated for '{character}'"),
        Err(e) => error!("Generation run for '{character}' failed: {e:#}"),
    }
    Ok(())
}

/// Bounds applied to prompt records before anything is allocated.
#[derive(Debug, Clone, Copy)]
pub struct RunLimits {
    /// Upper bound per side, same as the HTTP boundary.
    pub max_dimension: u32,
}

/// Generates one image for `character` and saves it under `out_dir`.
///
/// Returns `Ok(None)` when no prompt source has anything to offer. A record
/// whose size exceeds `limits` is rejected before rendering.
pub async fn run_generate(
    generator: &Generator,
    prompts: &PromptStore,
    storage: Option<&NocoDbClient>,
    character: &str,
    out_dir: &Path,
    limits: RunLimits,
) -> Result<Option<PipelineOutcome>> {
    let Some(record) = prompts.get_prompt(character).await else {
        warn!("No prompt found for character '{character}'");
        return Ok(None);
    };
    info!(
        "Using prompt for '{}': {} ({}x{})",
        record.character, record.prompt, record.width, record.height
    );

    let max = limits.max_dimension;
    if record.width > max || record.height > max {
        bail!(
            "Prompt record size {}x{} exceeds the {max}px limit per side",
            record.width,
            record.height
        );
    }

    let image = generator
        .generate(&GenerationRequest::from(&record))
        .await
        .context("Image generation failed")?;

    let filename = image_filename(character, Local::now());
    let saved_to = save_image(out_dir, &filename, &image.png).await?;
    info!("Saved image to {}", saved_to.display());

    let uploaded = match storage {
        Some(client) => match client.upload_bytes(&filename, image.png.to_vec()).await {
            Ok(response) => {
                info!("Uploaded {filename} to NocoDB storage");
                Some(response)
            }
            Err(e) => {
                warn!("Upload failed, image kept locally: {e}");
                None
            }
        },
        None => None,
    };

    Ok(Some(PipelineOutcome {
        saved_to,
        source: image.source,
        uploaded,
    }))
}
