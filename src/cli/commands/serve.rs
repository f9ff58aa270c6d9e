//! Serve command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::search::SearchPipeline;
use crate::server::{create_router, AppState};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    api_key_hash: Option<String>,
    settings: Settings,
) -> Result<()> {
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let api_key_hash = api_key_hash.or_else(|| settings.server.api_key_hash.clone());

    let pipeline = SearchPipeline::from_settings(&settings)?;
    let state = Arc::new(AppState::new(pipeline, api_key_hash));

    if state.api_key_hash.is_none() {
        warn!("No API key hash configured; search endpoints are unauthenticated");
        Output::warning("API_KEY_HASH is not set. Search endpoints accept any caller.");
    }

    let app = create_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Listening");

    Output::header("tubesearch API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Search", "POST /search");
    Output::kv("Search (ranked)", "POST /search/multiple");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
