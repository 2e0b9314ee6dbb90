//! Tool listing endpoint.

use axum::Json;
use axum::extract::State;
use ar_router::registry::ToolInfo;

use crate::state::AppState;

/// `GET /api/v1/tools`: registered tools with their JSON schemas.
pub async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolInfo>> {
    Json(state.controller.registry().list_tools())
}
