use std::path::PathBuf;

use anyhow::{Context, Result};

pub const DEFAULT_IMAGE_MODEL: &str = "runwayml/stable-diffusion-v1-5";
pub const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co";

/// Application configuration loaded once at startup from environment variables.
///
/// Every external integration is optional: a missing credential disables the
/// feature and the fallback path is used instead.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Credential for the hosted diffusion model. Absent → placeholder images only.
    pub huggingface_token: Option<String>,
    pub image_model: String,
    pub inference_url: String,
    pub nocodb_base_url: Option<String>,
    pub nocodb_api_token: Option<String>,
    /// Table holding prompt records. Only needed for remote prompt lookup.
    pub nocodb_table_id: Option<String>,
    pub prompts_path: PathBuf,
    pub output_dir: PathBuf,
    pub static_dir: PathBuf,
    /// Upper bound per side for images requested over HTTP.
    pub max_image_dimension: u32,
}

/// Connection details for the NocoDB record store and storage API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NocoDbSettings {
    pub base_url: String,
    pub api_token: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            port: get("PORT")
                .unwrap_or_else(|| "5000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            huggingface_token: get("HUGGINGFACE_TOKEN"),
            image_model: get("IMAGE_MODEL").unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            inference_url: get("HF_INFERENCE_URL")
                .unwrap_or_else(|| DEFAULT_INFERENCE_URL.to_string()),
            nocodb_base_url: get("NOCODB_BASE_URL").map(|u| u.trim_end_matches('/').to_string()),
            nocodb_api_token: get("NOCODB_API_TOKEN"),
            nocodb_table_id: get("NOCODB_TABLE_ID"),
            prompts_path: get("PROMPTS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/prompts.json")),
            output_dir: get("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("out")),
            static_dir: get("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public")),
            max_image_dimension: get("MAX_IMAGE_DIMENSION")
                .map(|v| v.parse::<u32>())
                .transpose()
                .context("MAX_IMAGE_DIMENSION must be a positive integer")?
                .unwrap_or(2048),
        })
    }

    /// NocoDB settings, if both the base URL and token are configured.
    pub fn nocodb(&self) -> Option<NocoDbSettings> {
        match (&self.nocodb_base_url, &self.nocodb_api_token) {
            (Some(base_url), Some(api_token)) => Some(NocoDbSettings {
                base_url: base_url.clone(),
                api_token: api_token.clone(),
            }),
            _ => None,
        }
    }
}
