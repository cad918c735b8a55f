//! Stock subscribers wired to the broker at startup.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use storefront_core::domain::{AuditLog, AuditStatus};
use storefront_core::ports::{AuditLogRepository, Cache, Message, Subscriber, SubscriberError};
use storefront_core::services::{mask_email, user_cache_key};

/// Writes every received message to the log.
pub struct LoggingSubscriber {
    name: String,
}

impl LoggingSubscriber {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Subscriber for LoggingSubscriber {
    fn name(&self) -> &str {
        &self.name
    }

    async fn receive(&self, message: &Message) -> Result<(), SubscriberError> {
        tracing::info!(
            subscriber = %self.name,
            topic = %message.topic,
            published_at = %message.published_at,
            "Received message"
        );
        Ok(())
    }
}

fn email_of(message: &Message) -> Result<&str, SubscriberError> {
    message
        .field("email")
        .ok_or_else(|| SubscriberError::Delivery("message has no email field".to_string()))
}

/// Evicts the cached user named by the message's `email` field.
pub struct CacheInvalidationSubscriber {
    cache: Arc<dyn Cache>,
}

impl CacheInvalidationSubscriber {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl Subscriber for CacheInvalidationSubscriber {
    fn name(&self) -> &str {
        "cache-invalidation"
    }

    async fn receive(&self, message: &Message) -> Result<(), SubscriberError> {
        let email = email_of(message)?;
        self.cache
            .delete(&user_cache_key(email))
            .await
            .map_err(|e| SubscriberError::Delivery(e.to_string()))?;
        tracing::debug!(user = %mask_email(email), "Cached user evicted");
        Ok(())
    }
}

/// Records the delivery of an event in the audit trail.
pub struct AuditSubscriber {
    audit: Arc<dyn AuditLogRepository>,
}

impl AuditSubscriber {
    pub fn new(audit: Arc<dyn AuditLogRepository>) -> Self {
        Self { audit }
    }
}

#[async_trait]
impl Subscriber for AuditSubscriber {
    fn name(&self) -> &str {
        "audit"
    }

    async fn receive(&self, message: &Message) -> Result<(), SubscriberError> {
        let email = email_of(message)?;
        let status = match message.field("status") {
            Some("failed") => AuditStatus::Failed,
            _ => AuditStatus::Success,
        };
        let detail = message.field("message").unwrap_or("event received");

        self.audit
            .append(AuditLog::new(
                email,
                format!("{}_event", message.topic),
                detail,
                status,
            ))
            .await
            .map_err(|e| SubscriberError::Delivery(e.to_string()))
    }
}

/// Counts login events by status.
#[derive(Default)]
pub struct LoginMetricsSubscriber {
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl LoginMetricsSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Subscriber for LoginMetricsSubscriber {
    fn name(&self) -> &str {
        "login-metrics"
    }

    async fn receive(&self, message: &Message) -> Result<(), SubscriberError> {
        let counter = match message.field("status") {
            Some("failed") => &self.failed,
            _ => &self.succeeded,
        };
        let total = counter.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(topic = %message.topic, total, "Login counted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use crate::database::InMemoryAuditLogRepository;
    use serde_json::json;

    fn login_message(email: &str) -> Message {
        Message::new(
            "user_login",
            json!({ "email": email, "message": "User logged in successfully", "status": "success" }),
        )
    }

    #[tokio::test]
    async fn test_cache_invalidation_evicts_user_key() {
        let cache = Arc::new(InMemoryCache::new());
        cache.set(&user_cache_key("a@x.com"), "{}", None).await.unwrap();
        cache.set(&user_cache_key("b@x.com"), "{}", None).await.unwrap();

        let subscriber = CacheInvalidationSubscriber::new(cache.clone());
        subscriber.receive(&login_message("a@x.com")).await.unwrap();

        assert!(!cache.exists(&user_cache_key("a@x.com")).await);
        assert!(cache.exists(&user_cache_key("b@x.com")).await);
    }

    #[tokio::test]
    async fn test_message_without_email_is_an_error() {
        let subscriber = CacheInvalidationSubscriber::new(Arc::new(InMemoryCache::new()));
        let message = Message::new("user_login", json!({ "status": "success" }));

        assert!(subscriber.receive(&message).await.is_err());
    }

    #[tokio::test]
    async fn test_audit_subscriber_appends_event() {
        let audit = Arc::new(InMemoryAuditLogRepository::new());
        let subscriber = AuditSubscriber::new(audit.clone());

        subscriber.receive(&login_message("a@x.com")).await.unwrap();

        let logs = audit.find_by_email("a@x.com").await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, "user_login_event");
        assert_eq!(logs[0].status, AuditStatus::Success);
    }

    #[tokio::test]
    async fn test_login_metrics_counts_by_status() {
        let metrics = LoginMetricsSubscriber::new();
        metrics.receive(&login_message("a@x.com")).await.unwrap();
        metrics.receive(&login_message("b@x.com")).await.unwrap();
        metrics
            .receive(&Message::new("user_login", json!({ "status": "failed" })))
            .await
            .unwrap();

        assert_eq!(metrics.succeeded(), 2);
        assert_eq!(metrics.failed(), 1);
    }
}
