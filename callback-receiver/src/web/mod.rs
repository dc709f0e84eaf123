//! Web server module for receiving dispatcher callbacks.
//!
//! This module provides a thin web server that:
//! - Receives signed callbacks from the dispatcher
//! - Verifies the signature against the raw body and the public URL
//! - Forwards accepted callbacks to RabbitMQ when configured
//!
//! Payloads are never inspected before verification succeeds.

pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{callback_webhook, health, AppState, HealthResponse, WebhookResponse};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/callbacks/*path", post(callback_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
