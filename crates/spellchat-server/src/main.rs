//! SpellChat Tool Invocation Server
//!
//! Axum-based server exposing the spell tools over the discovery/invocation
//! protocol: descriptors stream out over `/mcp/sse`, calls come in over
//! `/mcp/invoke`. The spell store lives for the process lifetime and reseeds
//! on every start.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spellbook::SpellStore;

use crate::handlers::{build_registry, discover_tools, health_check, invoke_tool};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    // Store is memory-resident: seeded now, discarded on shutdown.
    let store = Arc::new(SpellStore::new());
    tracing::info!(seeded = store.len(), "spell store initialized");

    let registry = Arc::new(build_registry(store)?);
    tracing::info!("Registered {} tools:", registry.len());
    for name in registry.names() {
        tracing::info!("  • {}", name);
    }

    let state = AppState { registry };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/mcp/sse", get(discover_tools))
        .route("/mcp/invoke", post(invoke_tool))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:7071".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("spellchat-server running on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health      - Health check");
    tracing::info!("  GET  /mcp/sse     - Tool discovery stream");
    tracing::info!("  POST /mcp/invoke  - Tool invocation");

    axum::serve(listener, app).await?;

    Ok(())
}
