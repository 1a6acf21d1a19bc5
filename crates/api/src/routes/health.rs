//! Health check endpoint.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::routes::time_diagnostics;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// GET /health. Liveness plus schedule diagnostics. Always 200, even with
/// incomplete provider configuration: `recipient_configured` tells the
/// operator what a send would hit.
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let (now, next_fire) = time_diagnostics(&state.config.schedule);
    Json(json!({
        "status": "ok",
        "service": "herald-api",
        "version": env!("CARGO_PKG_VERSION"),
        "provider": state.service.provider(),
        "recipient_configured": state.service.recipient_configured(),
        "schedule": state.config.schedule.local_label(),
        "now": now,
        "next_fire": next_fire,
    }))
}
