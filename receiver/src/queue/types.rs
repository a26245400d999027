//! Queue message types.
//!
//! Verified SendGrid events are handed off to the `sendgrid_email_events`
//! queue, one message per event, for the email log updater.

use serde::Serialize;

use crate::events::{EmailStatus, Milestone, SendGridEvent};

/// Queue name for verified SendGrid events.
pub const EMAIL_EVENTS_QUEUE: &str = "sendgrid_email_events";

/// A single event ready for the email log.
#[derive(Debug, Clone, Serialize)]
pub struct EmailEventMessage {
    /// Status the log entry moves to
    pub status: EmailStatus,
    /// Log timestamp column this event sets, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<Milestone>,
    /// Template name, taken from the first category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Whether the delivery carried a verified signature
    pub verified: bool,
    /// The event as SendGrid sent it
    pub event: SendGridEvent,
}

impl EmailEventMessage {
    pub fn new(event: SendGridEvent, verified: bool) -> Self {
        Self {
            status: EmailStatus::from_event(&event.event),
            milestone: Milestone::from_event(&event.event),
            template: event.category.first().cloned(),
            verified,
            event,
        }
    }

    /// Message ID for broker-side tracking and de-duplication.
    pub fn message_id(&self) -> String {
        if !self.event.sg_event_id.is_empty() {
            self.event.sg_event_id.clone()
        } else if !self.event.sg_message_id.is_empty() {
            self.event.sg_message_id.clone()
        } else {
            format!("sendgrid-{}", self.event.email)
        }
    }
}
