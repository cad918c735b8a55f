//! Pub/Sub port - in-process event fan-out between producers and subscribers.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Well-known topic names.
pub mod topics {
    pub const USER_LOGIN: &str = "user_login";
    pub const USER_ACTIVITY: &str = "user_activity";
}

/// A published event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub topic: String,
    /// Arbitrary key/value payload, usually a JSON object.
    pub payload: serde_json::Value,
    pub published_at: DateTime<Utc>,
}

impl Message {
    pub fn new(topic: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            topic: topic.into(),
            payload,
            published_at: Utc::now(),
        }
    }

    /// String field of an object payload.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(|v| v.as_str())
    }
}

/// Accepts messages for later delivery. Fire-and-forget: never fails.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: serde_json::Value);
}

/// Receives messages for the topics it was registered under.
#[async_trait]
pub trait Subscriber: Send + Sync {
    fn name(&self) -> &str;

    async fn receive(&self, message: &Message) -> Result<(), SubscriberError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Named publishing endpoint.
#[derive(Clone)]
pub struct Producer {
    name: String,
    publisher: Arc<dyn Publisher>,
}

impl Producer {
    pub fn new(name: impl Into<String>, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            name: name.into(),
            publisher,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn publish(&self, topic: &str, payload: serde_json::Value) {
        tracing::debug!(producer = %self.name, topic = %topic, "Publishing message");
        self.publisher.publish(topic, payload).await;
    }
}
