//! Message catalog route.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/mensajes", get(list_messages))
}

/// GET /mensajes. Every message the daily random pick can choose from,
/// including the operator-supplied extra when configured.
async fn list_messages(State(state): State<AppState>) -> Json<serde_json::Value> {
    let catalog = state.service.catalog();
    Json(json!({
        "total": catalog.len(),
        "mensajes": catalog.entries(),
    }))
}
