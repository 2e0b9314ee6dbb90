//! Request routing endpoint.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use ar_protocol::RoutingResult;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Request body for routing a query.
#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    /// Free-text request.
    #[serde(default)]
    pub query: String,
}

/// A routing result plus request-level timing.
#[derive(Debug, Serialize)]
pub struct RouteResponse {
    #[serde(flatten)]
    pub result: RoutingResult,
    pub num_calls: usize,
    /// Handler wall time, including queueing for the local model.
    pub wall_time_ms: u64,
}

/// `POST /api/v1/route`: route a free-text request to tool calls.
pub async fn route_query(
    State(state): State<AppState>,
    body: Result<Json<RouteRequest>, JsonRejection>,
) -> ApiResult<Json<RouteResponse>> {
    let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let query = req.query.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("Empty query".into()));
    }

    let started = Instant::now();
    let result = state.controller.route(query).await;
    let wall_time_ms = started.elapsed().as_millis() as u64;

    tracing::info!(
        request_id = %result.request_id,
        num_calls = result.calls.len(),
        wall_time_ms,
        "query routed"
    );

    Ok(Json(RouteResponse {
        num_calls: result.calls.len(),
        wall_time_ms,
        result,
    }))
}
