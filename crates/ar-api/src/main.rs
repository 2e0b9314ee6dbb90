//! Atomic router API: HTTP front end for the routing controller.

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use ar_api::config::ApiConfig;
use ar_api::routes;
use ar_api::state::AppState;
use ar_router::RoutingController;
use ar_router::config::RouterConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "ar-api starting");

    let config = ApiConfig::from_env();

    let router_config = RouterConfig::load(config.router_config.as_deref())?;
    if config.router_config.is_none() {
        tracing::warn!("ATOMIC_ROUTER_CONFIG not set, using router defaults");
    }
    let controller = RoutingController::from_config(&router_config).await?;
    tracing::info!(tool_count = controller.registry().len(), "routing controller ready");

    let app = routes::build_router(AppState::new(controller));

    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
