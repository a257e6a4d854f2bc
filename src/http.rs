//! HTTP server for Prometheus scraping and liveness checks.
//!
//! Runs on a separate tokio task and serves:
//! - `GET /metrics`: Prometheus text format
//! - `GET /healthz`: `{"status":"ok","stickies":N}`

use crate::store::StickyStore;
use axum::extract::State;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;

async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

async fn health_handler(State(store): State<Arc<StickyStore>>) -> Json<Value> {
    Json(json!({ "status": "ok", "stickies": store.len() }))
}

fn router(store: Arc<StickyStore>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(health_handler))
        .with_state(store)
}

/// Run the HTTP server on `0.0.0.0:port`.
///
/// This is a long-running task that should be spawned in the background.
/// Bind failures are logged and end the task; the daemon keeps running.
pub async fn run_http_server(port: u16, store: Arc<StickyStore>) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind HTTP server");
            return;
        }
    };
    tracing::info!(%addr, "HTTP server listening");

    if let Err(e) = axum::serve(listener, router(store)).await {
        tracing::error!(error = %e, "HTTP server error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_reports_sticky_count() {
        let store = Arc::new(StickyStore::in_memory());
        let Json(body) = health_handler(State(store)).await;
        assert_eq!(body, json!({ "status": "ok", "stickies": 0 }));
    }
}
