//! Service overview and schedule diagnostics.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::routes::time_diagnostics;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(overview))
        .route("/schedule", get(schedule_info))
}

/// GET /. Service overview with an index of the available endpoints.
async fn overview(State(state): State<AppState>) -> Json<serde_json::Value> {
    let (_, next_fire) = time_diagnostics(&state.config.schedule);
    Json(json!({
        "service": "herald",
        "status": "running",
        "provider": state.service.provider(),
        "schedule": state.config.schedule.local_label(),
        "next_fire": next_fire,
        "endpoints": {
            "health": "/health",
            "schedule": "/schedule",
            "send_test": "/send-test",
            "send_custom": "/send-custom?mensaje=TEXT",
            "messages": "/mensajes",
        },
    }))
}

/// GET /schedule. The configured wall-clock target and the computed next
/// fire, for verifying timezone behavior in a deployment.
async fn schedule_info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let schedule = &state.config.schedule;
    let (now, next_fire) = time_diagnostics(schedule);
    Json(json!({
        "target_hour": schedule.hour,
        "target_minute": schedule.minute,
        "timezone": schedule.timezone.name(),
        "schedule": schedule.local_label(),
        "now": now,
        "next_fire": next_fire,
    }))
}
