pub mod health;
pub mod messages;
pub mod schedule;
pub mod send;

use axum::Router;
use chrono::Utc;
use serde_json::json;

use herald_common::types::ScheduleConfig;
use herald_scheduler::next_fire_time;

use crate::state::AppState;

/// Build the complete facade router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(schedule::router())
        .merge(health::router())
        .merge(send::router())
        .merge(messages::router())
        .with_state(state)
}

/// Current time and computed next fire, each rendered in UTC and in the
/// schedule's zone. Shared by the health and schedule diagnostics routes.
pub(crate) fn time_diagnostics(schedule: &ScheduleConfig) -> (serde_json::Value, serde_json::Value) {
    let now = Utc::now();
    let next = next_fire_time(now, schedule);
    let tz = schedule.timezone;
    let in_hours = ((next - now).num_minutes() as f64 / 60.0 * 10.0).round() / 10.0;

    let now_json = json!({
        "utc": now.to_rfc3339(),
        "local": now.with_timezone(&tz).to_rfc3339(),
    });
    let next_json = json!({
        "utc": next.to_rfc3339(),
        "local": next.with_timezone(&tz).to_rfc3339(),
        "in_hours": in_hours,
    });
    (now_json, next_json)
}
