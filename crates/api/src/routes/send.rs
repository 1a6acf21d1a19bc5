//! Manual send routes.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use herald_common::error::ApiError;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/send-test", get(send_test))
        .route("/send-custom", get(send_custom))
}

#[derive(Debug, Deserialize)]
struct CustomMessageParams {
    mensaje: Option<String>,
}

/// GET /send-test. Fire one reminder with a catalog-selected body.
async fn send_test(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let receipt = state.service.fire(None).await?;
    Ok(Json(json!({ "success": true, "receipt": receipt })))
}

/// GET /send-custom?mensaje=TEXT. Fire one reminder with the given body,
/// bypassing catalog selection.
async fn send_custom(
    State(state): State<AppState>,
    Query(params): Query<CustomMessageParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mensaje = params.mensaje.filter(|m| !m.is_empty()).ok_or_else(|| {
        ApiError::Validation("missing required query parameter 'mensaje'".to_string())
    })?;

    let receipt = state.service.fire(Some(&mensaje)).await?;
    Ok(Json(json!({ "success": true, "receipt": receipt })))
}
