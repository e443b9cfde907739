//! Webhook HTTP surface.
//!
//! Every pipeline outcome, including failures, is answered with `200 OK` and a
//! [`PipelineResult`] body so the listing platform never retries a delivery.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::domain::model::{PipelineResult, WebhookEvent};
use crate::domain::ports::EventHandler;
use crate::utils::error::Result;

/// State shared with the route handlers.
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<dyn EventHandler>,
}

impl AppState {
    pub fn new(handler: Arc<dyn EventHandler>) -> Self {
        Self { handler }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .route("/test/:estate_id", get(handle_test_event))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until ctrl-c.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("🌍 Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

// body 自行解析，格式錯誤仍回 200
async fn handle_webhook(State(state): State<AppState>, body: Bytes) -> Json<PipelineResult> {
    let event: WebhookEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("📨 Rejected webhook payload: {}", e);
            return Json(PipelineResult::failure(format!(
                "Invalid webhook payload: {}",
                e
            )));
        }
    };

    tracing::info!("📨 Webhook {} for listing {}", event.event, event.estate_id);
    Json(state.handler.handle(&event).await)
}

/// Manual trigger: behaves like an `estate-added` delivery for `estate_id`.
async fn handle_test_event(
    State(state): State<AppState>,
    Path(estate_id): Path<String>,
) -> Json<PipelineResult> {
    tracing::info!("🧪 Test trigger for listing {}", estate_id);
    let event = WebhookEvent::estate_added(estate_id);
    Json(state.handler.handle(&event).await)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
