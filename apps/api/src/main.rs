mod config;
mod errors;
mod render;
mod routes;
mod search;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::search::backend::HttpJobSearcher;
use crate::search::jobs::SearchRegistry;
use crate::state::AppState;

/// Extra time the HTTP client allows beyond the search deadline, so the
/// dispatcher's own timeout is the one that fires.
const CLIENT_TIMEOUT_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting GetHire v{}", env!("CARGO_PKG_VERSION"));
    config.log_startup();

    // Initialize search backend client
    let searcher = HttpJobSearcher::new(
        config.search_backend_url.clone(),
        config.search_timeout + CLIENT_TIMEOUT_GRACE,
    )?;
    info!(
        "Search backend client initialized ({}, model: {})",
        config.search_backend_url, config.gemini_model
    );

    let searches = SearchRegistry::new(
        Arc::new(searcher),
        config.gemini_model.clone(),
        config.search_timeout,
        config.search_retention,
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        searches,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the UI is served from a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
