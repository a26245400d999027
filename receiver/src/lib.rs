//! Mailhook - authenticated receiver for SendGrid event webhooks.
//!
//! The `mailhook-web` binary accepts SendGrid event deliveries, checks their
//! ECDSA P-256 signature and timestamp, and enqueues the events for the
//! email log updater.
//!
//! ## Architecture
//!
//! ```text
//! SendGrid → Web Server → signature::SignatureVerifier → sendgrid_email_events → Email log updater
//! ```

pub mod config;
pub mod events;
pub mod queue;
pub mod signature;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use events::{EmailStatus, Milestone, SendGridEvent};
pub use queue::{EmailEventMessage, Publisher, EMAIL_EVENTS_QUEUE};
pub use signature::{load_verifier, SignatureVerifier, VerifyError};
pub use web::AppState;
