//! Axum route handlers for the payment entitlement.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct EntitlementResponse {
    pub is_paid: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub price: f64,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentRequest {
    #[serde(default)]
    pub transaction_id: String,
}

fn response(
    state: &AppState,
    is_paid: bool,
    expires_at: Option<DateTime<Utc>>,
) -> EntitlementResponse {
    EntitlementResponse {
        is_paid,
        expires_at,
        price: state.config.payment_price,
        currency: state.config.payment_currency.clone(),
    }
}

/// GET /api/v1/entitlement
pub async fn handle_get_entitlement(State(state): State<AppState>) -> Json<EntitlementResponse> {
    let status = state.gate.status();
    Json(response(&state, status.valid, status.expires_at))
}

/// POST /api/v1/entitlement
///
/// Records a client-reported checkout. The transaction id is required but
/// not verified with the payment processor.
pub async fn handle_confirm_payment(
    State(state): State<AppState>,
    Json(request): Json<ConfirmPaymentRequest>,
) -> Result<Json<EntitlementResponse>, AppError> {
    let transaction_id = request.transaction_id.trim();
    if transaction_id.is_empty() {
        return Err(AppError::Validation(
            "Please enter your transaction ID".to_string(),
        ));
    }

    let grant = state.gate.grant()?;
    info!("Payment confirmed with transaction {transaction_id}");
    Ok(Json(response(&state, true, Some(grant.expires_at))))
}

/// DELETE /api/v1/entitlement
pub async fn handle_revoke_entitlement(
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state.gate.revoke()?;
    Ok(StatusCode::NO_CONTENT)
}
