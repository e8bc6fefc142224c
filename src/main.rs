//! newsreel — Binary Entrypoint
//! Boots the Axum HTTP server, wiring the pipeline, routes, and metrics.

use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newsreel::api::{self, AppState};
use newsreel::config::Config;
use newsreel::metrics::Metrics;
use newsreel::pipeline::Pipeline;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("newsreel=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = Config::from_env()?;
    tracing::info!(
        news_enabled = cfg.proxy.is_some(),
        discussion_enabled = cfg.discussion.is_some(),
        "capabilities resolved"
    );

    let metrics = Metrics::init();
    let pipeline = Arc::new(Pipeline::from_config(&cfg));
    let app = api::create_router(AppState { pipeline }).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr).await?;
    tracing::info!(addr = %cfg.bind_addr, "newsreel listening");
    axum::serve(listener, app).await?;
    Ok(())
}
