//! Application state - shared across all handlers.

use std::sync::Arc;

use storefront_core::ports::{
    AuditLogRepository, Cache, InvoiceRepository, ItemRepository, Producer,
    RefreshTokenRepository, UserRepository, topics,
};
use storefront_core::services::{AccountService, Authorizer, CatalogService, TokenManager};
use storefront_infra::pubsub::{
    AuditSubscriber, CacheInvalidationSubscriber, LoggingSubscriber, LoginMetricsSubscriber,
};
use storefront_infra::{
    Argon2PasswordService, InMemoryAuditLogRepository, InMemoryBroker, InMemoryCache,
    InMemoryInvoiceRepository, InMemoryItemRepository, InMemoryRefreshTokenRepository,
    InMemoryUserRepository, JwtTokenService,
};

#[cfg(feature = "postgres")]
use storefront_infra::database::{
    DatabaseConnections, PostgresAuditLogRepository, PostgresInvoiceRepository,
    PostgresItemRepository, PostgresRefreshTokenRepository, PostgresUserRepository,
};

use crate::config::AppConfig;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("database setup failed: {0}")]
    Database(String),
    #[error("cache setup failed: {0}")]
    Cache(String),
}

/// One handle per collection.
struct Stores {
    users: Arc<dyn UserRepository>,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
    audit: Arc<dyn AuditLogRepository>,
    items: Arc<dyn ItemRepository>,
    invoices: Arc<dyn InvoiceRepository>,
}

impl Stores {
    fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            refresh_tokens: Arc::new(InMemoryRefreshTokenRepository::new()),
            audit: Arc::new(InMemoryAuditLogRepository::new()),
            items: Arc::new(InMemoryItemRepository::new()),
            invoices: Arc::new(InMemoryInvoiceRepository::new()),
        }
    }

    #[cfg(feature = "postgres")]
    fn postgres(db: &DatabaseConnections) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(db.main.clone())),
            refresh_tokens: Arc::new(PostgresRefreshTokenRepository::new(db.main.clone())),
            audit: Arc::new(PostgresAuditLogRepository::new(db.main.clone())),
            items: Arc::new(PostgresItemRepository::new(db.main.clone())),
            invoices: Arc::new(PostgresInvoiceRepository::new(db.main.clone())),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub catalog: Arc<CatalogService>,
    pub broker: Arc<InMemoryBroker>,
    pub login_metrics: Arc<LoginMetricsSubscriber>,
    #[cfg(feature = "postgres")]
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Wire stores, cache, broker and services.
    pub async fn new(config: &AppConfig) -> Result<Self, StartupError> {
        #[cfg(feature = "postgres")]
        let (db, stores) = match &config.database {
            Some(db_config) => match DatabaseConnections::init(db_config).await {
                Ok(connections) => {
                    connections
                        .ensure_schema()
                        .await
                        .map_err(|e| StartupError::Database(e.to_string()))?;
                    let stores = Stores::postgres(&connections);
                    (Some(Arc::new(connections)), stores)
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                    (None, Stores::in_memory())
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                (None, Stores::in_memory())
            }
        };

        #[cfg(not(feature = "postgres"))]
        let stores = {
            if config.database.is_some() {
                tracing::warn!("DATABASE_URL ignored: built without the postgres feature");
            }
            Stores::in_memory()
        };

        let cache = build_cache(config).await?;

        let broker = Arc::new(InMemoryBroker::new());
        let login_metrics = Arc::new(LoginMetricsSubscriber::new());
        register_subscribers(
            &broker,
            cache.clone(),
            stores.audit.clone(),
            login_metrics.clone(),
        )
        .await;

        let tokens = Arc::new(TokenManager::new(
            Arc::new(JwtTokenService::new(config.jwt.clone())),
            stores.refresh_tokens,
        ));
        let authorizer = Arc::new(Authorizer::new(
            stores.users.clone(),
            cache,
            config.cache.user_ttl,
        ));

        let accounts = Arc::new(AccountService::new(
            stores.users.clone(),
            stores.audit,
            Arc::new(Argon2PasswordService::new()),
            tokens,
            authorizer.clone(),
            Producer::new("accounts", broker.clone()),
        ));
        let catalog = Arc::new(CatalogService::new(
            stores.items,
            stores.invoices,
            stores.users,
            authorizer,
        ));

        tracing::info!("Application state initialized");

        Ok(Self {
            accounts,
            catalog,
            broker,
            login_metrics,
            #[cfg(feature = "postgres")]
            db,
        })
    }
}

#[cfg(feature = "redis")]
async fn build_cache(config: &AppConfig) -> Result<Arc<dyn Cache>, StartupError> {
    use storefront_infra::RedisCache;

    match RedisCache::new(config.redis.clone()).await {
        Ok(cache) => Ok(Arc::new(cache)),
        Err(e) if config.redis.fallback_to_memory => {
            tracing::warn!(error = %e, "Redis unavailable, using in-memory cache");
            Ok(Arc::new(InMemoryCache::new()))
        }
        Err(e) => Err(StartupError::Cache(e.to_string())),
    }
}

#[cfg(not(feature = "redis"))]
async fn build_cache(_config: &AppConfig) -> Result<Arc<dyn Cache>, StartupError> {
    Ok(Arc::new(InMemoryCache::new()))
}

async fn register_subscribers(
    broker: &InMemoryBroker,
    cache: Arc<dyn Cache>,
    audit: Arc<dyn AuditLogRepository>,
    login_metrics: Arc<LoginMetricsSubscriber>,
) {
    broker
        .subscribe(topics::USER_LOGIN, Arc::new(LoggingSubscriber::new("login-log")))
        .await;
    broker.subscribe(topics::USER_LOGIN, login_metrics).await;
    broker
        .subscribe(topics::USER_LOGIN, Arc::new(AuditSubscriber::new(audit)))
        .await;

    broker
        .subscribe(topics::USER_ACTIVITY, Arc::new(LoggingSubscriber::new("activity-log")))
        .await;
    broker
        .subscribe(
            topics::USER_ACTIVITY,
            Arc::new(CacheInvalidationSubscriber::new(cache)),
        )
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use storefront_core::domain::AuditStatus;
    use storefront_core::ports::Publisher;

    #[actix_web::test]
    async fn test_login_events_reach_metrics_and_audit() {
        let broker = InMemoryBroker::new();
        let audit = Arc::new(InMemoryAuditLogRepository::new());
        let metrics = Arc::new(LoginMetricsSubscriber::new());
        register_subscribers(
            &broker,
            Arc::new(InMemoryCache::new()),
            audit.clone(),
            metrics.clone(),
        )
        .await;
        assert_eq!(broker.subscriber_count(topics::USER_LOGIN).await, 3);

        broker
            .publish(
                topics::USER_LOGIN,
                json!({ "email": "a@x.com", "message": "User logged in successfully", "status": "success" }),
            )
            .await;
        let report = broker.drain().await;

        assert_eq!(report.failures, 0);
        assert_eq!(metrics.succeeded(), 1);
        let logs = audit.find_by_email("a@x.com").await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, "user_login_event");
        assert_eq!(logs[0].status, AuditStatus::Success);
    }
}
