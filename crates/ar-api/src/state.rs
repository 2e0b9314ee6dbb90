//! Shared application state for the Axum server.

use std::sync::Arc;

use ar_router::RoutingController;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<RoutingController>,
}

impl AppState {
    pub fn new(controller: RoutingController) -> Self {
        Self {
            controller: Arc::new(controller),
        }
    }

    /// Pattern tier only, no models. For tests and local development.
    pub fn pattern_only() -> anyhow::Result<Self> {
        Ok(Self::new(RoutingController::builder().build()?))
    }
}
