//! HTTP API gateway for MultiFlow.
//!
//! Exposes key status, pipeline runs (JSON and SSE) and direct queries over
//! the same adapters the CLI uses.
//!
//! Built on Axum for high performance async HTTP.

pub mod api;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    response::Json,
    routing::{get, post},
};
use multiflow_config::AppConfig;
use multiflow_core::provider::Transport;
use multiflow_pipeline::PipelineOrchestrator;
use multiflow_providers::{DirectQueryRouter, HttpTransport, build_adapters};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Request bodies above this size are rejected.
const BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub config: Arc<AppConfig>,
    pub orchestrator: PipelineOrchestrator,
    pub direct: DirectQueryRouter,
}

impl GatewayState {
    /// Wire adapters, orchestrator and direct router over `transport`.
    pub fn new(config: AppConfig, transport: Arc<dyn Transport>) -> Self {
        let config = Arc::new(config);
        let adapters = build_adapters(&config, transport);
        Self {
            orchestrator: PipelineOrchestrator::new(adapters.clone(), config.messages.clone()),
            direct: DirectQueryRouter::new(adapters, config.clone()),
            config,
        }
    }
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - Permissive CORS (the API is meant to sit behind a local web UI)
/// - Request body size limit (2 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/status", get(api::status_handler))
        .route("/api/ask", post(api::ask_handler))
        .route("/api/ask/stream", post(api::ask_stream_handler))
        .route("/api/direct", post(api::direct_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let transport: Arc<dyn Transport> =
        Arc::new(HttpTransport::from_secs(config.http.timeout_secs));

    let keys = config.key_status();
    let state = Arc::new(GatewayState::new(config, transport));
    let app = build_router(state);

    info!(addr = %addr, ?keys, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
