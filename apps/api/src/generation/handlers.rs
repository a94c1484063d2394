//! Axum route handlers for the Generation API.

use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::generation::form::CoverLetterForm;
use crate::generation::generator::{generate_cover_letter, GenerationContext, GenerationOutcome};
use crate::state::AppState;

/// POST /api/v1/cover-letters
///
/// Validates the form, checks the entitlement and the throttle, calls the
/// LLM, and on success charges quota and saves the letter to history.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(form): Json<CoverLetterForm>,
) -> Result<Json<GenerationOutcome>, AppError> {
    let ctx = GenerationContext {
        gate: &state.gate,
        throttle: &state.throttle,
        history: &state.history,
        llm: state.llm.as_ref(),
        lock: &state.generation_lock,
    };

    let outcome = generate_cover_letter(ctx, form).await?;
    Ok(Json(outcome))
}
