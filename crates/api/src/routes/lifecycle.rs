use axum::{Json, extract::State};
use chrono::Utc;

use crate::state::AppState;

/// External trigger for the coarse cadence. Runs the full tick to
/// completion before responding; per-kind failures are logged inside
/// the tick and never surface here.
pub async fn run_daily(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.lifecycle.run_daily_tick(Utc::now()).await;
    Json(serde_json::json!({ "cadence": "daily", "status": "completed" }))
}

/// External trigger for the fine cadence.
pub async fn run_hourly(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.lifecycle.run_hourly_tick(Utc::now()).await;
    Json(serde_json::json!({ "cadence": "hourly", "status": "completed" }))
}
