//! Axum route handlers for the image generation API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::generation::facade::GenerationRequest;
use crate::state::AppState;

pub const DEFAULT_PROMPT: &str = "A beautiful AI-generated image";
pub const DEFAULT_DIMENSION: u32 = 768;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Width/height as sent by clients: JSON number or numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Dimension {
    Int(i64),
    Float(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
pub struct GenerateImageRequest {
    pub prompt: Option<String>,
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
}

#[derive(Debug, Serialize)]
pub struct GenerateImageResponse {
    pub success: bool,
    /// `data:image/png;base64,...`
    pub image: String,
    pub prompt: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/generate
///
/// Generates an image for the prompt and returns it inline as a PNG data URL.
/// Falls back to the placeholder renderer when the hosted model is unavailable.
pub async fn handle_generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateImageRequest>, JsonRejection>,
) -> Result<Json<GenerateImageResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let max = state.config.max_image_dimension;
    let prompt = request.prompt.unwrap_or_else(|| DEFAULT_PROMPT.to_string());
    let width = resolve_dimension("width", request.width, max)?;
    let height = resolve_dimension("height", request.height, max)?;

    info!("Generating image: {prompt} ({width}x{height})");

    let image = state
        .generator
        .generate(&GenerationRequest::new(prompt.clone(), width, height))
        .await?;

    info!("Image generated ({:?}, {} bytes)", image.source, image.png.len());

    Ok(Json(GenerateImageResponse {
        success: true,
        image: format!("data:image/png;base64,{}", STANDARD.encode(&image.png)),
        prompt,
    }))
}

/// Validates one dimension: defaults when absent, positive, at most `max`.
fn resolve_dimension(name: &str, value: Option<Dimension>, max: u32) -> Result<u32, AppError> {
    let raw = match value {
        None => return Ok(DEFAULT_DIMENSION),
        Some(Dimension::Int(n)) => n,
        Some(Dimension::Float(f)) if f.is_finite() => f.trunc() as i64,
        Some(Dimension::Float(_)) => {
            return Err(AppError::Validation(format!("{name} must be a number")));
        }
        Some(Dimension::Text(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| AppError::Validation(format!("{name} must be an integer, got '{s}'")))?,
    };

    if raw <= 0 {
        return Err(AppError::Validation(format!(
            "{name} must be a positive integer"
        )));
    }
    if raw > i64::from(max) {
        return Err(AppError::Validation(format!("{name} must be at most {max}")));
    }
    Ok(raw as u32)
}
