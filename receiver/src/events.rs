//! SendGrid event webhook records.
//!
//! SendGrid posts a JSON array of events. Each event is mapped to the email
//! log status it implies and to the log timestamp it sets.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// One entry of a SendGrid event webhook delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendGridEvent {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub timestamp: i64,
    /// Missing event types decode as empty so one odd entry cannot fail a batch.
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub sg_message_id: String,
    #[serde(default)]
    pub sg_event_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<String>,
    /// Bounce classification (bounce, blocked).
    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub bounce_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    /// SMTP status code for bounces.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ip: String,
    #[serde(default, rename = "useragent", skip_serializing_if = "String::is_empty")]
    pub user_agent: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub response: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub attempt: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub custom_args: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asm_group_id: Option<i64>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub marketing_campaign_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub marketing_campaign_name: String,
}

/// Parse a delivery body into its events.
pub fn parse_events(body: &[u8]) -> serde_json::Result<Vec<SendGridEvent>> {
    serde_json::from_slice(body)
}

/// Email log status implied by an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailStatus {
    Delivered,
    Bounce,
    Dropped,
    Open,
    Click,
    SpamReport,
    Unsubscribe,
    Deferred,
    /// Event types without a dedicated status keep their own name.
    Other(String),
}

impl EmailStatus {
    pub fn from_event(event: &str) -> Self {
        match event {
            "processed" | "delivered" => Self::Delivered,
            "bounce" => Self::Bounce,
            "dropped" => Self::Dropped,
            "open" => Self::Open,
            "click" => Self::Click,
            "spamreport" => Self::SpamReport,
            "unsubscribe" | "group_unsubscribe" | "group_resubscribe" => Self::Unsubscribe,
            "deferred" => Self::Deferred,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Delivered => "delivered",
            Self::Bounce => "bounce",
            Self::Dropped => "dropped",
            Self::Open => "open",
            Self::Click => "click",
            Self::SpamReport => "spam_report",
            Self::Unsubscribe => "unsubscribe",
            Self::Deferred => "deferred",
            Self::Other(name) => name,
        }
    }
}

impl Serialize for EmailStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Email log timestamp column an event sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    SentAt,
    DeliveredAt,
    BouncedAt,
    OpenedAt,
    ClickedAt,
    SpamReportedAt,
    UnsubscribedAt,
}

impl Milestone {
    pub fn from_event(event: &str) -> Option<Self> {
        match event {
            "processed" => Some(Self::SentAt),
            "delivered" => Some(Self::DeliveredAt),
            "bounce" | "dropped" => Some(Self::BouncedAt),
            "open" => Some(Self::OpenedAt),
            "click" => Some(Self::ClickedAt),
            "spamreport" => Some(Self::SpamReportedAt),
            "unsubscribe" | "group_unsubscribe" => Some(Self::UnsubscribedAt),
            _ => None,
        }
    }
}
