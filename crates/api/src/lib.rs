//! Axum HTTP facade: health, schedule diagnostics, and manual send routes.

pub mod routes;
pub mod state;
