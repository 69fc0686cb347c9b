//! Correction Service - Main Entry Point
//!
//! Sentence-level grammar correction, autocomplete, and writing suggestions
//! backed by an OpenAI-compatible completion API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use corrector::api::{self, handlers::AppState};
use corrector::engine::CorrectionEngine;
use corrector::types::EngineConfig;
use corrector::HttpCompletionClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "corrector=info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = EngineConfig::from_env();

    info!("Starting Correction Service v{}", env!("CARGO_PKG_VERSION"));
    info!("Model: {}", config.model);
    if config.api_key.is_none() {
        warn!("COMPLETION_API_KEY is not set; correction requests will fail");
    }

    // Initialize components
    let client = Arc::new(HttpCompletionClient::new(
        &config.api_base_url,
        config.api_key.clone(),
    ));
    let engine = Arc::new(CorrectionEngine::new(client, config));

    let state = Arc::new(AppState { engine });

    // Build HTTP routes
    let app = api::router(state)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start server
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3021);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
