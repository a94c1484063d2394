pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::entitlement::handlers as entitlement;
use crate::generation::handlers as generation;
use crate::history::handlers as history;
use crate::state::AppState;
use crate::throttle::handlers as throttle;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Payment entitlement
        .route(
            "/api/v1/entitlement",
            get(entitlement::handle_get_entitlement)
                .post(entitlement::handle_confirm_payment)
                .delete(entitlement::handle_revoke_entitlement),
        )
        // Request throttle
        .route(
            "/api/v1/rate-limit",
            get(throttle::handle_get_rate_limit).delete(throttle::handle_reset_rate_limit),
        )
        // Generation
        .route("/api/v1/cover-letters", post(generation::handle_generate))
        // History
        .route(
            "/api/v1/history",
            get(history::handle_list_history).delete(history::handle_clear_history),
        )
        .route(
            "/api/v1/history/:id",
            get(history::handle_get_history_entry).delete(history::handle_delete_history_entry),
        )
        .route(
            "/api/v1/history/:id/download",
            get(history::handle_download_history_entry),
        )
        .with_state(state)
}
