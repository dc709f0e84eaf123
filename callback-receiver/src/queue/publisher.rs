//! RabbitMQ forwarding of verified callbacks.
//!
//! One connection and one confirm-mode channel are shared by all handler
//! tasks. The link is opened on first use and reopened after it drops; a
//! callback only counts as forwarded once the broker acks it.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use lapin::{
    options::{BasicPublishOptions, ConfirmSelectOptions, QueueDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::types::{VerifiedCallback, VERIFIED_QUEUE};

/// Publishes verified callbacks to `verified_callbacks`.
#[derive(Clone)]
pub struct Publisher {
    url: Arc<str>,
    link: Arc<Mutex<Option<Link>>>,
}

struct Link {
    connection: Connection,
    channel: Channel,
}

impl Link {
    async fn open(url: &str) -> Result<Self> {
        let connection = Connection::connect(url, ConnectionProperties::default())
            .await
            .context("Failed to connect to RabbitMQ")?;
        let channel = connection
            .create_channel()
            .await
            .context("Failed to create channel")?;

        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .context("Failed to enable publisher confirms")?;

        let durable = QueueDeclareOptions {
            durable: true,
            ..Default::default()
        };
        channel
            .queue_declare(VERIFIED_QUEUE, durable, FieldTable::default())
            .await
            .context("Failed to declare verified queue")?;

        info!(queue = VERIFIED_QUEUE, "rabbitmq_link_opened");
        Ok(Self {
            connection,
            channel,
        })
    }

    fn is_usable(&self) -> bool {
        self.channel.status().connected()
    }
}

impl Publisher {
    /// Create a publisher. Nothing connects until the first publish.
    pub fn new(url: String) -> Self {
        Self {
            url: url.into(),
            link: Arc::new(Mutex::new(None)),
        }
    }

    async fn channel(&self) -> Result<Channel> {
        let mut link = self.link.lock().await;

        match link.as_ref() {
            Some(open) if open.is_usable() => Ok(open.channel.clone()),
            _ => {
                let fresh = Link::open(&self.url).await?;
                let channel = fresh.channel.clone();
                *link = Some(fresh);
                Ok(channel)
            }
        }
    }

    /// Forward one verified callback and wait for the broker's ack.
    pub async fn publish_verified(&self, callback: &VerifiedCallback) -> Result<()> {
        let channel = self.channel().await?;
        let payload = serde_json::to_vec(callback).context("Failed to serialize callback")?;
        let message_id = callback.tracking_id();

        let properties = BasicProperties::default()
            .with_delivery_mode(2)
            .with_content_type("application/json".into())
            .with_message_id(message_id.as_str().into());

        let confirmation = channel
            .basic_publish(
                "",
                VERIFIED_QUEUE,
                BasicPublishOptions::default(),
                &payload,
                properties,
            )
            .await
            .context("Failed to publish to verified queue")?
            .await
            .context("Failed to receive publisher confirm")?;

        if confirmation.is_nack() {
            bail!("broker rejected callback {}", message_id);
        }

        info!(
            queue = VERIFIED_QUEUE,
            message_id = %message_id,
            payload_length = payload.len(),
            "callback_forwarded"
        );

        Ok(())
    }

    /// Close the link if one is open.
    pub async fn close(&self) {
        let Some(link) = self.link.lock().await.take() else {
            return;
        };

        if let Err(e) = link.channel.close(200, "shutdown").await {
            warn!(error = %e, "rabbitmq_channel_close_error");
        }
        if let Err(e) = link.connection.close(200, "shutdown").await {
            warn!(error = %e, "rabbitmq_connection_close_error");
        }

        info!("rabbitmq_link_closed");
    }
}
