use axum::{
    extract::{Path, State},
    Json,
};

use crate::errors::AppError;
use crate::generation::handlers::DEFAULT_PROMPT;
use crate::prompts::PromptRecord;
use crate::state::AppState;

/// GET /api/prompts/:character
pub async fn handle_get_prompt(
    State(state): State<AppState>,
    Path(character): Path<String>,
) -> Result<Json<PromptRecord>, AppError> {
    state
        .prompts
        .get_prompt(&character)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No prompt available for '{character}'")))
}

/// GET /api/prompts/random
///
/// Any character. A record without prompt text gets the default prompt.
pub async fn handle_random_prompt(
    State(state): State<AppState>,
) -> Result<Json<PromptRecord>, AppError> {
    let mut record = state
        .prompts
        .random_prompt()
        .await
        .ok_or_else(|| AppError::NotFound("No prompts available".to_string()))?;

    if record.prompt.trim().is_empty() {
        record.prompt = DEFAULT_PROMPT.to_string();
    }
    Ok(Json(record))
}
