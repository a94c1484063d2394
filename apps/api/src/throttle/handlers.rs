//! Axum route handlers for the request throttle.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RateLimitResponse {
    pub remaining: u32,
    pub max_requests: u32,
    pub window_minutes: i64,
    pub reset_at: DateTime<Utc>,
}

/// GET /api/v1/rate-limit
///
/// Read-only view; does not roll the window over in storage.
pub async fn handle_get_rate_limit(State(state): State<AppState>) -> Json<RateLimitResponse> {
    let config = state.throttle.config();
    Json(RateLimitResponse {
        remaining: state.throttle.remaining_requests(),
        max_requests: config.max_requests,
        window_minutes: config.window.num_minutes(),
        reset_at: state.throttle.reset_time(),
    })
}

/// DELETE /api/v1/rate-limit
///
/// Debugging affordance: clears the current window.
pub async fn handle_reset_rate_limit(
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state.throttle.reset()?;
    Ok(StatusCode::NO_CONTENT)
}
