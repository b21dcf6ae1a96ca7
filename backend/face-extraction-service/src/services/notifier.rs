//! Notification of newly created face crops
//!
//! One message per source object, carrying the derived keys in face order.

use crate::config::{MessageFormat, QueueConfig, StorageConfig};
use crate::error::{ExtractionError, Result};
use crate::models::SourceObjectRef;
use crate::services::storage::load_sdk_config;
use async_trait::async_trait;
use aws_sdk_sqs::Client;
use std::sync::Arc;
use tracing::{debug, info};

/// Narrow queue capability; the queue identity is fixed at construction
#[async_trait]
pub trait NotificationQueue: Send + Sync {
    async fn publish(&self, body: String) -> Result<()>;
}

/// SQS-compatible queue client
pub struct SqsQueue {
    client: Client,
    queue_url: String,
}

impl SqsQueue {
    pub fn new(client: Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }

    /// Build from configuration, reusing the storage credentials and region
    pub async fn from_config(queue: &QueueConfig, storage: &StorageConfig) -> Self {
        let sdk_config = load_sdk_config(
            &storage.region,
            storage.access_key_id.as_deref(),
            storage.secret_access_key.as_deref(),
            queue.endpoint.as_deref(),
            "face_extraction_sqs",
        )
        .await;

        info!(queue_url = %queue.url, "Queue client initialized");
        Self::new(Client::new(&sdk_config), queue.url.clone())
    }
}

#[async_trait]
impl NotificationQueue for SqsQueue {
    async fn publish(&self, body: String) -> Result<()> {
        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| ExtractionError::StoreWrite(format!("Failed to publish notification: {e}")))?;

        Ok(())
    }
}

/// Publishes derived keys for one source object
#[derive(Clone)]
pub struct NotificationSender {
    queue: Arc<dyn NotificationQueue>,
    format: MessageFormat,
}

impl NotificationSender {
    pub fn new(queue: Arc<dyn NotificationQueue>, format: MessageFormat) -> Self {
        Self { queue, format }
    }

    /// Publish `derived_keys`; returns whether a message was sent.
    ///
    /// A source with no detected faces produces no message.
    pub async fn notify(&self, source: &SourceObjectRef, derived_keys: &[String]) -> Result<bool> {
        if derived_keys.is_empty() {
            debug!(bucket = %source.bucket, key = %source.key, "No faces, skipping notification");
            return Ok(false);
        }

        let body = render_body(derived_keys, self.format)?;
        self.queue.publish(body).await?;

        info!(
            bucket = %source.bucket,
            key = %source.key,
            faces = derived_keys.len(),
            "Notification published"
        );
        Ok(true)
    }
}

/// Render the queue message body
pub fn render_body(keys: &[String], format: MessageFormat) -> Result<String> {
    match format {
        MessageFormat::List => Ok(render_key_list(keys)),
        MessageFormat::Json => serde_json::to_string(keys)
            .map_err(|e| ExtractionError::StoreWrite(format!("Failed to encode message: {e}"))),
    }
}

/// `['a_face_0.jpg', 'a_face_1.jpg']`
fn render_key_list(keys: &[String]) -> String {
    let items: Vec<String> = keys.iter().map(|k| quote(k)).collect();
    format!("[{}]", items.join(", "))
}

/// Single-quote a key; switch to double quotes when the key holds a single
/// quote but no double quote, escaping otherwise.
fn quote(key: &str) -> String {
    let delim = if key.contains('\'') && !key.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(key.len() + 2);
    out.push(delim);
    for ch in key.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}
