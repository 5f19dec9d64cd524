//! HTTP surface of LinguaFlow.
//!
//! | Route                          | Auth | Purpose                                |
//! |--------------------------------|------|----------------------------------------|
//! | `GET  /health`                 | no   | liveness                               |
//! | `POST /api/generate`           | yes  | one [`GenerationRequest`] → `{result}` |
//! | `POST /api/context`            | yes  | document → `{context}`                 |
//! | `POST /api/verify`             | yes  | passphrase check → `{valid}`           |
//! | `GET/PUT /api/workflow`        | yes  | read / edit the hosted session         |
//! | `POST /api/workflow/{action}`  | yes  | `advance`, `polish`, `reset`           |
//!
//! [`GenerationRequest`]: linguaflow_common::GenerationRequest

pub mod api;
pub mod auth;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{Router, extract::DefaultBodyLimit, middleware, routing::get};
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

pub use api::{AppState, SharedState};

use crate::config::LinguaConfig;
use crate::context::ContextInferenceService;
use crate::generation::{GeminiBackend, GenerationClient, ModelBackend};
use crate::workflow::{FileSessionStore, WorkflowController};

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            body_limit_bytes: 10 * 1024 * 1024,
        }
    }
}

impl From<&LinguaConfig> for ServerConfig {
    fn from(config: &LinguaConfig) -> Self {
        Self {
            host: config.host(),
            port: config.port(),
            body_limit_bytes: config.toml.server.body_limit_bytes,
        }
    }
}

/// Build the full application router: `/health` plus the authenticated
/// `/api` tree.
pub fn build_router(state: SharedState, body_limit_bytes: usize) -> Router {
    let protected = api::api_router().layer(middleware::from_fn_with_state(
        state.clone(),
        auth::require_passphrase,
    ));

    Router::new()
        .route("/health", get(api::health_check))
        .nest("/api", protected)
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Wire the Gemini backend, generation client, context service and the
/// persisted workflow session into shared server state.
pub fn build_state(config: &LinguaConfig) -> Result<SharedState> {
    let gemini = config
        .gemini_config()
        .context("The server needs a generation backend")?;
    let backend: Arc<dyn ModelBackend> =
        Arc::new(GeminiBackend::new(gemini).context("Failed to create Gemini client")?);
    let generator = Arc::new(GenerationClient::new(Arc::clone(&backend)));
    let store = Arc::new(FileSessionStore::new(config.session_file()));

    let passphrase = config.passphrase();
    if passphrase.is_none() {
        warn!("PASSPHRASE is not set; authentication is disabled");
    }

    Ok(Arc::new(AppState {
        generator: generator.clone(),
        context: ContextInferenceService::new(backend),
        workflow: Mutex::new(WorkflowController::restore(generator, store)),
        passphrase,
    }))
}

/// Start the server and run until Ctrl+C.
pub async fn start_server(config: ServerConfig, state: SharedState) -> Result<()> {
    let app = build_router(state, config.body_limit_bytes);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    info!("LinguaFlow listening on http://{}", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down...");
}
