//! Shared test harness for E2E integration tests.
//!
//! Wires a real `RoutingController` to scripted local and cloud models,
//! and exposes the HTTP router over the same controller.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use ar_api::routes::build_router;
use ar_api::state::AppState;
use ar_protocol::{RoutedCall, RoutingResult, ValidatedCall};
use ar_router::RoutingController;
use ar_router::config::RoutingConfig;
use ar_router::inference::mock::{MockCloudModel, MockLocalModel};

/// Cloud timeout used by every harness.
pub const CLOUD_TIMEOUT: Duration = Duration::from_millis(100);

pub struct TestHarness {
    pub controller: Arc<RoutingController>,
    pub router: Router,
    pub local: Arc<MockLocalModel>,
    pub cloud: Arc<MockCloudModel>,
}

impl TestHarness {
    /// Harness with the given models behind the local and cloud tiers.
    pub fn new(local: MockLocalModel, cloud: MockCloudModel) -> Self {
        Self::with_config(RoutingConfig::default(), local, cloud)
    }

    pub fn with_config(config: RoutingConfig, local: MockLocalModel, cloud: MockCloudModel) -> Self {
        let local = Arc::new(local);
        let cloud = Arc::new(cloud);
        let controller = RoutingController::builder()
            .config(config)
            .local_model(local.clone())
            .cloud_model(cloud.clone(), CLOUD_TIMEOUT)
            .build()
            .unwrap();
        let state = AppState::new(controller);
        let router = build_router(state.clone());

        Self {
            controller: state.controller,
            router,
            local,
            cloud,
        }
    }

    /// Models that never produce a call.
    pub fn silent() -> Self {
        Self::new(MockLocalModel::new(), MockCloudModel::new())
    }

    pub async fn route(&self, request: &str) -> RoutingResult {
        self.controller.route(request).await
    }

    /// POST /api/v1/route with `{"query": …}`.
    pub async fn post_route(&self, query: &str) -> (StatusCode, serde_json::Value) {
        let body = serde_json::json!({ "query": query });
        let response = self
            .router
            .clone()
            .oneshot(
                Request::post("/api/v1/route")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = self
            .router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }
}

/// Resolved calls of a result, in order.
pub fn resolved(result: &RoutingResult) -> Vec<&ValidatedCall> {
    result.calls.iter().filter_map(RoutedCall::as_resolved).collect()
}

/// Build an `ArgMap` from a JSON object literal.
pub fn args(value: serde_json::Value) -> ar_protocol::ArgMap {
    value.as_object().cloned().unwrap()
}
