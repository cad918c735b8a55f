//! In-process broker.
//!
//! Publishing only appends to a FIFO queue. A periodic drain takes the whole
//! queue in one go and fans each message out to the topic's subscribers.
//! Works within a single process only; queued messages are lost on restart.

use std::collections::{HashMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::{Mutex, RwLock};

use storefront_core::ports::{Message, Publisher, Subscriber};

/// Outcome of one drain cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Messages taken off the queue.
    pub messages: usize,
    /// Subscriber calls made.
    pub deliveries: usize,
    /// Calls that returned an error or panicked.
    pub failures: usize,
    /// Messages whose topic had no subscribers.
    pub dropped: usize,
}

/// Topic registry plus unbounded message queue.
///
/// The queue lock is held only to push or to take the whole queue; it is
/// never held while a subscriber runs.
pub struct InMemoryBroker {
    subscribers: RwLock<HashMap<String, Vec<Arc<dyn Subscriber>>>>,
    queue: Mutex<VecDeque<Message>>,
    // Serializes drain cycles so overlapping ticks cannot reorder messages.
    draining: Mutex<()>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            queue: Mutex::new(VecDeque::new()),
            draining: Mutex::new(()),
        }
    }

    /// Register `subscriber` under `topic`.
    ///
    /// Registering the same subscriber twice yields two deliveries per message.
    pub async fn subscribe(&self, topic: &str, subscriber: Arc<dyn Subscriber>) {
        tracing::info!(topic = %topic, subscriber = %subscriber.name(), "Subscribed to topic");
        self.subscribers
            .write()
            .await
            .entry(topic.to_string())
            .or_default()
            .push(subscriber);
    }

    pub async fn enqueue(&self, message: Message) {
        let depth = {
            let mut queue = self.queue.lock().await;
            queue.push_back(message);
            queue.len()
        };
        tracing::trace!(depth, "Message queued");
    }

    /// Messages waiting for the next drain.
    pub async fn pending(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.subscribers
            .read()
            .await
            .get(topic)
            .map_or(0, Vec::len)
    }

    /// Deliver everything queued so far, in FIFO order.
    ///
    /// Messages published while the drain runs wait for the next cycle.
    /// A subscriber that fails or panics is logged and skipped; the rest of
    /// the pass continues.
    pub async fn drain(&self) -> DrainReport {
        let _cycle = self.draining.lock().await;
        let batch = std::mem::take(&mut *self.queue.lock().await);
        if batch.is_empty() {
            return DrainReport::default();
        }

        let mut report = DrainReport {
            messages: batch.len(),
            ..DrainReport::default()
        };

        for message in batch {
            let targets = self.subscribers.read().await.get(&message.topic).cloned();
            let targets = match targets {
                Some(targets) if !targets.is_empty() => targets,
                _ => {
                    tracing::debug!(topic = %message.topic, "No subscribers for topic, dropping message");
                    report.dropped += 1;
                    continue;
                }
            };

            for subscriber in targets {
                report.deliveries += 1;
                match AssertUnwindSafe(subscriber.receive(&message))
                    .catch_unwind()
                    .await
                {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        report.failures += 1;
                        tracing::warn!(
                            topic = %message.topic,
                            subscriber = %subscriber.name(),
                            error = %e,
                            "Subscriber failed to handle message"
                        );
                    }
                    Err(_) => {
                        report.failures += 1;
                        tracing::error!(
                            topic = %message.topic,
                            subscriber = %subscriber.name(),
                            "Subscriber panicked while handling message"
                        );
                    }
                }
            }
        }

        tracing::debug!(
            messages = report.messages,
            deliveries = report.deliveries,
            failures = report.failures,
            dropped = report.dropped,
            "Drain cycle finished"
        );
        report
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Publisher for InMemoryBroker {
    async fn publish(&self, topic: &str, payload: serde_json::Value) {
        self.enqueue(Message::new(topic, payload)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use storefront_core::ports::{Producer, SubscriberError};

    #[derive(Default)]
    struct Recorder {
        name: String,
        seen: std::sync::Mutex<Vec<serde_json::Value>>,
    }

    impl Recorder {
        fn named(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                ..Self::default()
            })
        }

        fn seen(&self) -> Vec<serde_json::Value> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Subscriber for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        async fn receive(&self, message: &Message) -> Result<(), SubscriberError> {
            self.seen.lock().unwrap().push(message.payload.clone());
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Subscriber for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn receive(&self, _message: &Message) -> Result<(), SubscriberError> {
            Err(SubscriberError::Delivery("boom".to_string()))
        }
    }

    struct Panicking;

    #[async_trait]
    impl Subscriber for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn receive(&self, _message: &Message) -> Result<(), SubscriberError> {
            panic!("subscriber bug");
        }
    }

    #[tokio::test]
    async fn test_fan_out_preserves_publish_order() {
        let broker = Arc::new(InMemoryBroker::new());
        let subscribers: Vec<_> = (0..3).map(|i| Recorder::named(&format!("s{i}"))).collect();
        for s in &subscribers {
            broker.subscribe("orders", s.clone()).await;
        }

        let producer = Producer::new("test", broker.clone());
        for n in 0..5 {
            producer.publish("orders", json!({ "n": n })).await;
        }

        // Nothing is delivered before a drain.
        assert!(subscribers.iter().all(|s| s.seen().is_empty()));
        assert_eq!(broker.pending().await, 5);

        let report = broker.drain().await;
        assert_eq!(report.messages, 5);
        assert_eq!(report.deliveries, 15);
        assert_eq!(report.failures, 0);

        let expected: Vec<_> = (0..5).map(|n| json!({ "n": n })).collect();
        for s in &subscribers {
            assert_eq!(s.seen(), expected);
        }
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let broker = InMemoryBroker::new();
        let logins = Recorder::named("logins");
        let orders = Recorder::named("orders");
        broker.subscribe("user_login", logins.clone()).await;
        broker.subscribe("orders", orders.clone()).await;

        broker.publish("user_login", json!({ "email": "a@x.com" })).await;
        broker.drain().await;

        assert_eq!(logins.seen().len(), 1);
        assert!(orders.seen().is_empty());
    }

    #[tokio::test]
    async fn test_message_without_subscribers_is_dropped() {
        let broker = InMemoryBroker::new();
        broker.publish("nobody_listens", json!({})).await;

        let report = broker.drain().await;
        assert_eq!(report.dropped, 1);
        assert_eq!(report.deliveries, 0);
        assert_eq!(broker.pending().await, 0);

        // Subscribing later does not resurrect the message.
        let late = Recorder::named("late");
        broker.subscribe("nobody_listens", late.clone()).await;
        assert_eq!(broker.drain().await, DrainReport::default());
        assert!(late.seen().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_subscription_delivers_twice() {
        let broker = InMemoryBroker::new();
        let recorder = Recorder::named("dup");
        broker.subscribe("t", recorder.clone()).await;
        broker.subscribe("t", recorder.clone()).await;
        assert_eq!(broker.subscriber_count("t").await, 2);

        broker.publish("t", json!(1)).await;
        broker.drain().await;

        assert_eq!(recorder.seen(), vec![json!(1), json!(1)]);
    }

    #[tokio::test]
    async fn test_failing_subscribers_do_not_block_later_ones() {
        let broker = InMemoryBroker::new();
        let after = Recorder::named("after");
        broker.subscribe("t", Arc::new(Failing)).await;
        broker.subscribe("t", Arc::new(Panicking)).await;
        broker.subscribe("t", after.clone()).await;

        broker.publish("t", json!("first")).await;
        broker.publish("t", json!("second")).await;
        let report = broker.drain().await;

        assert_eq!(report.deliveries, 6);
        assert_eq!(report.failures, 4);
        assert_eq!(after.seen(), vec![json!("first"), json!("second")]);
    }

    #[tokio::test]
    async fn test_concurrent_publishers() {
        let broker = Arc::new(InMemoryBroker::new());
        let recorder = Recorder::named("all");
        broker.subscribe("t", recorder.clone()).await;

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let broker = broker.clone();
                tokio::spawn(async move {
                    for n in 0..25 {
                        broker.publish("t", json!({ "worker": worker, "n": n })).await;
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let report = broker.drain().await;
        assert_eq!(report.messages, 200);
        assert_eq!(recorder.seen().len(), 200);

        // Per-publisher order survives interleaving.
        for worker in 0..8 {
            let ns: Vec<_> = recorder
                .seen()
                .iter()
                .filter(|v| v["worker"] == worker)
                .map(|v| v["n"].as_i64().unwrap())
                .collect();
            assert_eq!(ns, (0..25).collect::<Vec<i64>>());
        }
    }
}
