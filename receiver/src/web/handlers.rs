//! Webhook endpoint handlers.
//!
//! The SendGrid handler only:
//! 1. Authenticates the delivery (when a verification key is configured)
//! 2. Parses the event array
//! 3. Enqueues one message per event and returns
//!
//! Updating the email log happens downstream of the queue.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::events::parse_events;
use crate::queue::{EmailEventMessage, Publisher};
use crate::signature::{load_verifier, SignatureVerifier, VerifyError};
use crate::Config;

/// Header carrying the base64 ECDSA signature.
pub const SIGNATURE_HEADER: &str = "X-Twilio-Email-Event-Webhook-Signature";

/// Header carrying the decimal UNIX timestamp that was signed.
pub const TIMESTAMP_HEADER: &str = "X-Twilio-Email-Event-Webhook-Timestamp";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// `None` when verification is disabled.
    pub verifier: Option<Arc<SignatureVerifier>>,
    pub publisher: Publisher,
}

impl AppState {
    pub fn new(config: Config, publisher: Publisher) -> Self {
        let verifier = load_verifier(config.sendgrid_public_key.as_deref()).map(Arc::new);
        Self {
            config: Arc::new(config),
            verifier,
            publisher,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// SendGrid Event Webhook
// =============================================================================

/// How a delivery was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authentication {
    /// Signature and timestamp checked against the configured key.
    Verified,
    /// No key configured; the delivery was not checked.
    Unverified,
}

/// Why a delivery was refused. Logged in full, never sent to the caller.
#[derive(Debug, Error)]
pub enum WebhookRejection {
    #[error("missing signature headers")]
    MissingHeaders,

    #[error(transparent)]
    InvalidSignature(#[from] VerifyError),
}

impl WebhookRejection {
    /// Signature rejections are already logged by the verifier.
    pub fn logged_by_verifier(&self) -> bool {
        matches!(self, Self::InvalidSignature(_))
    }
}

/// Decide whether a delivery may be processed.
///
/// Without a verifier every delivery passes as [`Authentication::Unverified`];
/// callers must treat that as a distinct, insecure outcome.
pub fn authenticate(
    verifier: Option<&SignatureVerifier>,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Authentication, WebhookRejection> {
    let Some(verifier) = verifier else {
        return Ok(Authentication::Unverified);
    };

    let signature = header_str(headers, SIGNATURE_HEADER);
    let timestamp = header_str(headers, TIMESTAMP_HEADER);

    if signature.is_empty() || timestamp.is_empty() {
        return Err(WebhookRejection::MissingHeaders);
    }

    verifier.verify(body, signature, timestamp)?;
    Ok(Authentication::Verified)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_count: Option<usize>,
}

impl WebhookResponse {
    fn status(status: &'static str) -> Json<Self> {
        Json(Self {
            status,
            event_count: None,
        })
    }
}

/// SendGrid event webhook endpoint.
///
/// The body is taken as raw bytes because the signature covers it exactly
/// as sent.
pub async fn sendgrid_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    info!(
        body_length = body.len(),
        has_signature = headers.contains_key(SIGNATURE_HEADER),
        has_timestamp = headers.contains_key(TIMESTAMP_HEADER),
        "sendgrid_webhook_received"
    );

    let verified = match authenticate(state.verifier.as_deref(), &headers, &body) {
        Ok(Authentication::Verified) => true,
        Ok(Authentication::Unverified) => {
            warn!(verification = "disabled", "sendgrid_webhook_unverified");
            false
        }
        Err(e) => {
            if !e.logged_by_verifier() {
                warn!(error = %e, "sendgrid_webhook_unauthorized");
            }
            return (StatusCode::UNAUTHORIZED, WebhookResponse::status("unauthorized"));
        }
    };

    let events = match parse_events(&body) {
        Ok(events) => events,
        Err(e) => {
            warn!(error = %e, "sendgrid_webhook_invalid_payload");
            return (StatusCode::BAD_REQUEST, WebhookResponse::status("invalid_payload"));
        }
    };

    let messages: Vec<EmailEventMessage> = events
        .into_iter()
        .map(|event| EmailEventMessage::new(event, verified))
        .collect();

    if let Err(e) = state.publisher.publish_events(&messages).await {
        error!(error = %e, event_count = messages.len(), "sendgrid_publish_failed");
        return (StatusCode::INTERNAL_SERVER_ERROR, WebhookResponse::status("error"));
    }

    info!(event_count = messages.len(), verified, "sendgrid_events_enqueued");

    (
        StatusCode::OK,
        Json(WebhookResponse {
            status: "enqueued",
            event_count: Some(messages.len()),
        }),
    )
}
