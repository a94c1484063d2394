//! Axum route handlers for generation history.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::AppError;
use crate::history::HistoryEntry;
use crate::state::AppState;

const DOWNLOAD_FILENAME: &str = "cover-letter.txt";

#[derive(Debug, Serialize)]
pub struct HistoryEntryResponse {
    pub id: String,
    pub cover_letter: String,
    pub job_title: String,
    pub company_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<HistoryEntry> for HistoryEntryResponse {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            id: entry.id,
            cover_letter: entry.cover_letter,
            job_title: entry.job_title,
            company_name: entry.company_name,
            created_at: entry.created_at,
        }
    }
}

fn find(state: &AppState, id: &str) -> Result<HistoryEntry, AppError> {
    state
        .history
        .find_by_id(id)
        .ok_or_else(|| AppError::NotFound(format!("History entry {id} not found")))
}

/// GET /api/v1/history
pub async fn handle_list_history(
    State(state): State<AppState>,
) -> Json<Vec<HistoryEntryResponse>> {
    Json(state.history.list().into_iter().map(Into::into).collect())
}

/// DELETE /api/v1/history
pub async fn handle_clear_history(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.history.clear()?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/history/:id
pub async fn handle_get_history_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HistoryEntryResponse>, AppError> {
    Ok(Json(find(&state, &id)?.into()))
}

/// DELETE /api/v1/history/:id
pub async fn handle_delete_history_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.history.delete_by_id(&id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("History entry {id} not found")))
    }
}

/// GET /api/v1/history/:id/download
///
/// Plain-text export of a saved letter.
pub async fn handle_download_history_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let entry = find(&state, &id)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{DOWNLOAD_FILENAME}\""),
            ),
        ],
        entry.cover_letter,
    ))
}
