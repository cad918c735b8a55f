//! Job scheduler using tokio-cron-scheduler.

use std::future::Future;
use std::time::Duration;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var("SCHEDULER_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        }
    }
}

/// Job scheduler wrapper.
pub struct Scheduler {
    inner: JobScheduler,
    config: SchedulerConfig,
}

impl Scheduler {
    pub async fn new(config: SchedulerConfig) -> Result<Self, JobSchedulerError> {
        let inner = JobScheduler::new().await?;
        Ok(Self { inner, config })
    }

    /// Run `task` every `interval`, starting one interval after `start`.
    ///
    /// # Example
    /// ```ignore
    /// scheduler.add_repeated("broker-drain", Duration::from_secs(5), move || {
    ///     let broker = broker.clone();
    ///     async move { broker.drain().await; }
    /// }).await?;
    /// ```
    pub async fn add_repeated<F, Fut>(
        &self,
        name: &str,
        interval: Duration,
        task: F,
    ) -> Result<uuid::Uuid, JobSchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let job = Job::new_repeated_async(interval, move |_uuid, _lock| {
            let task = task.clone();
            Box::pin(async move {
                task().await;
            })
        })?;

        let id = self.inner.add(job).await?;
        tracing::info!(
            job = %name,
            interval_ms = interval.as_millis() as u64,
            job_id = %id,
            "Repeating job registered"
        );
        Ok(id)
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub async fn start(&self) -> Result<(), JobSchedulerError> {
        if !self.config.enabled {
            tracing::warn!("Scheduler disabled; queued messages are only delivered at shutdown");
            return Ok(());
        }

        self.inner.start().await?;
        tracing::info!("Scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), JobSchedulerError> {
        self.inner.shutdown().await?;
        tracing::info!("Scheduler stopped");
        Ok(())
    }
}
