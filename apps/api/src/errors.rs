use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::generation::form::FieldErrors;
use crate::llm_client::LlmError;
use crate::storage::StorageError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// None of these are fatal; every one leaves the client free to retry.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Please correct the highlighted fields")]
    InvalidForm(FieldErrors),

    #[error("Payment required")]
    PaymentRequired,

    #[error("Rate limit exceeded. Please try again in {}.", minutes_phrase(.reset_in_minutes))]
    ThrottleExceeded { reset_in_minutes: i64 },

    #[error("Generation failed: {0}")]
    Generation(#[from] LlmError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

fn minutes_phrase(minutes: &i64) -> String {
    if *minutes == 1 {
        "1 minute".to_string()
    } else {
        format!("{minutes} minutes")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut details = serde_json::Map::new();

        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::InvalidForm(fields) => {
                details.insert("fields".to_string(), json!(fields));
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", self.to_string())
            }
            AppError::PaymentRequired => (
                StatusCode::PAYMENT_REQUIRED,
                "PAYMENT_REQUIRED",
                "An active payment is required to generate cover letters".to_string(),
            ),
            AppError::ThrottleExceeded { reset_in_minutes } => {
                details.insert("reset_in".to_string(), json!(reset_in_minutes));
                (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", self.to_string())
            }
            AppError::Generation(e) => {
                tracing::error!("Generation error: {e}");
                (StatusCode::BAD_GATEWAY, "GENERATION_ERROR", e.user_message())
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
        };

        let mut error = serde_json::Map::new();
        error.insert("code".to_string(), json!(code));
        error.insert("message".to_string(), json!(message));
        error.extend(details);

        (status, Json(json!({ "error": error }))).into_response()
    }
}
