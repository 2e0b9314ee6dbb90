//! Cumulative routing counters.

use axum::Json;
use axum::extract::State;
use ar_router::MetricsSnapshot;

use crate::state::AppState;

/// `GET /api/v1/stats`: counters since process start.
pub async fn stats(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.controller.metrics())
}
