//! Queue module for RabbitMQ operations.
//!
//! This module provides:
//! - Message types for verified SendGrid events
//! - Async publisher for enqueueing them
//!
//! ## Architecture
//!
//! ```text
//! SendGrid → Web Server (verify) → sendgrid_email_events queue → Email log updater
//! ```

pub mod publisher;
pub mod types;

pub use publisher::Publisher;
pub use types::{EmailEventMessage, EMAIL_EVENTS_QUEUE};
