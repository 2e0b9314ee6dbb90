//! `atomic-router`: route requests read from stdin, one per line.
//!
//! Prints one JSON `RoutingResult` per non-empty input line. Logs go to
//! stderr so stdout carries only results.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use ar_router::RoutingController;
use ar_router::config::RouterConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "atomic-router starting");

    // ── Load config ─────────────────────────────────────────────
    let config_path = std::env::args().nth(1);
    let config = RouterConfig::load(config_path.as_deref())?;
    tracing::info!(
        config = config_path.as_deref().unwrap_or("<defaults>"),
        tiers = ?config.routing.tiers,
        "config loaded"
    );

    let controller = RoutingController::from_config(&config).await?;
    tracing::info!(tool_count = controller.registry().len(), "tool registry initialized");

    // ── Route stdin ─────────────────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        let request = line.trim();
        if request.is_empty() {
            continue;
        }
        let result = controller.route(request).await;
        let mut out = serde_json::to_string(&result)?;
        out.push('\n');
        stdout.write_all(out.as_bytes()).await?;
        stdout.flush().await?;
    }

    tracing::info!(metrics = ?controller.metrics(), "atomic-router finished");
    Ok(())
}
