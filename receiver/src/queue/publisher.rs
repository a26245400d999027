//! Async RabbitMQ publisher for enqueueing verified events.
//!
//! This module provides a connection-pooled publisher that can be shared
//! across multiple async tasks for high-throughput message publishing.

use std::sync::Arc;

use anyhow::{Context, Result};
use lapin::{
    options::{BasicPublishOptions, QueueDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties,
};
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::types::{EmailEventMessage, EMAIL_EVENTS_QUEUE};

/// Async RabbitMQ publisher with connection management.
///
/// The publisher maintains a persistent connection and channel to RabbitMQ,
/// automatically reconnecting on failure.
#[derive(Clone)]
pub struct Publisher {
    inner: Arc<PublisherInner>,
}

struct PublisherInner {
    url: String,
    connection: RwLock<Option<Connection>>,
    channel: RwLock<Option<Channel>>,
}

impl Publisher {
    /// Create a new publisher with the given RabbitMQ URL.
    pub fn new(url: String) -> Self {
        Self {
            inner: Arc::new(PublisherInner {
                url,
                connection: RwLock::new(None),
                channel: RwLock::new(None),
            }),
        }
    }

    /// Ensure we have a valid connection and channel.
    async fn ensure_connected(&self) -> Result<Channel> {
        {
            let channel = self.inner.channel.read().await;
            if let Some(ch) = channel.as_ref() {
                if ch.status().connected() {
                    return Ok(ch.clone());
                }
            }
        }

        let mut connection = self.inner.connection.write().await;
        let mut channel = self.inner.channel.write().await;

        // Another task may have reconnected while we waited for the locks
        if let Some(ch) = channel.as_ref() {
            if ch.status().connected() {
                return Ok(ch.clone());
            }
        }

        info!("rabbitmq_publisher_connecting");

        let conn = Connection::connect(&self.inner.url, ConnectionProperties::default())
            .await
            .context("Failed to connect to RabbitMQ")?;

        let ch = conn
            .create_channel()
            .await
            .context("Failed to create channel")?;

        ch.queue_declare(
            EMAIL_EVENTS_QUEUE,
            QueueDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .context("Failed to declare email events queue")?;

        info!(queue = EMAIL_EVENTS_QUEUE, "rabbitmq_publisher_connected");

        *connection = Some(conn);
        *channel = Some(ch.clone());

        Ok(ch)
    }

    /// Publish each event as its own persistent message.
    ///
    /// Not atomic: if a publish fails, earlier events of the batch are already
    /// queued and SendGrid will redeliver the whole batch after the error
    /// response. Consumers de-duplicate on the AMQP `message_id`, which is the
    /// `sg_event_id` (see [`EmailEventMessage::message_id`]).
    pub async fn publish_events(&self, messages: &[EmailEventMessage]) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }

        let channel = self.ensure_connected().await?;

        for message in messages {
            let body = serde_json::to_vec(message).context("Failed to serialize event")?;
            let message_id = message.message_id();

            channel
                .basic_publish(
                    "",
                    EMAIL_EVENTS_QUEUE,
                    BasicPublishOptions::default(),
                    &body,
                    BasicProperties::default()
                        .with_delivery_mode(2) // Persistent
                        .with_content_type("application/json".into())
                        .with_message_id(message_id.clone().into()),
                )
                .await
                .context("Failed to publish to email events queue")?
                .await
                .context("Failed to confirm publish")?;

            info!(
                queue = EMAIL_EVENTS_QUEUE,
                message_id = %message_id,
                event_type = %message.event.event,
                body_length = body.len(),
                "rabbitmq_event_published"
            );
        }

        Ok(())
    }

    /// Close the connection gracefully.
    pub async fn close(&self) {
        let mut connection = self.inner.connection.write().await;
        let mut channel = self.inner.channel.write().await;

        if let Some(ch) = channel.take() {
            if let Err(e) = ch.close(200, "Normal shutdown").await {
                warn!(error = %e, "rabbitmq_channel_close_error");
            }
        }

        if let Some(conn) = connection.take() {
            if let Err(e) = conn.close(200, "Normal shutdown").await {
                warn!(error = %e, "rabbitmq_connection_close_error");
            }
        }

        info!("rabbitmq_publisher_closed");
    }
}
