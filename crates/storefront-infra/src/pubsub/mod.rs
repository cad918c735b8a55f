//! In-process pub/sub: the broker and the stock subscribers.

use std::time::Duration;

mod broker;
mod subscribers;

pub use broker::{DrainReport, InMemoryBroker};
pub use subscribers::{
    AuditSubscriber, CacheInvalidationSubscriber, LoggingSubscriber, LoginMetricsSubscriber,
};

/// Broker drain configuration.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Delay between two drain cycles.
    pub drain_interval: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            drain_interval: Duration::from_secs(5),
        }
    }
}

impl BrokerConfig {
    pub fn from_env() -> Self {
        Self {
            drain_interval: std::env::var("BROKER_DRAIN_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or_else(|| Self::default().drain_interval),
        }
    }
}
