//! Shared application state for the Axum facade.

use std::sync::Arc;

use herald_common::config::AppConfig;
use herald_engine::service::ReminderService;

/// Application state shared across all route handlers via Axum `State`.
/// The service is the same instance the daily trigger fires, so the
/// single-flight guard spans scheduled and manual sends.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ReminderService>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(service: Arc<ReminderService>, config: AppConfig) -> Self {
        Self { service, config }
    }
}
