//! Web server module for handling inbound SendGrid webhooks.
//!
//! This module provides a thin web server that:
//! - Receives SendGrid event webhooks
//! - Verifies the ECDSA signature when a key is configured
//! - Enqueues the parsed events to RabbitMQ

pub mod handlers;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{
    authenticate, health, sendgrid_webhook, AppState, Authentication, HealthResponse,
    WebhookRejection, WebhookResponse, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};

/// Build the HTTP router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/webhooks/sendgrid", post(sendgrid_webhook))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
