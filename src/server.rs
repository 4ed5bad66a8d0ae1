//! HTTP Server
//!
//! This module implements the Prometheus exporter HTTP server.
//!
//! # Architecture
//!
//! - **HTTP Server**: Axum-based server exposing `/metrics`, `/health`, and `/` endpoints
//! - **Scrape on demand**: every `/metrics` request lists and parses the status
//!   files itself; there is no background collection loop and no cache
//! - **State Management**: the captured [`StatusDir`] is shared read-only through an `Arc`
//!
//! # Endpoints
//!
//! - `GET /` - HTML landing page with links to metrics and health
//! - `GET /metrics` - Prometheus metrics in text format
//! - `GET /health` - Liveness check, always 200
//!
//! # Error Handling
//!
//! Unreadable or malformed status files are logged and left out of the
//! response; the scrape itself still answers 200. Directory listing and file
//! reads run on the blocking pool so a slow disk never stalls other requests.

use crate::bees::StatusDir;
use crate::collectors;
use crate::config::ServerConfig;
use crate::error::ExporterError;
use crate::metrics;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    dir: Arc<StatusDir>,
}

impl AppState {
    pub fn new(dir: StatusDir) -> Self {
        Self { dir: Arc::new(dir) }
    }
}

/// Binds the listening socket and serves until the process exits.
///
/// Must run after the confinement policy is in place, which only allows
/// binding the configured port.
pub async fn start(server: &ServerConfig, state: AppState) -> anyhow::Result<()> {
    let addr = server.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ExporterError::ListenBindFailed { addr, source })?;

    info!("Metrics server listening on {}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    axum::serve(listener, router(state)).await?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Runs one scrape and renders it as exposition text.
pub async fn scrape(dir: Arc<StatusDir>) -> anyhow::Result<String> {
    let snapshots = tokio::task::spawn_blocking(move || collectors::collect(&dir)).await?;
    metrics::render(&collectors::samples(&snapshots))
}

async fn root_handler() -> impl IntoResponse {
    Html(
        r#"<html>
<head><title>Bees Exporter</title></head>
<body>
<h1>Bees Prometheus Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
<p><a href="/health">Health</a></p>
</body>
</html>"#,
    )
}

pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match scrape(state.dir.clone()).await {
        Ok(body) => ([(header::CONTENT_TYPE, metrics::content_type())], body).into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error rendering metrics: {}", e),
            )
                .into_response()
        }
    }
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
