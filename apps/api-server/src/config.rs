//! Application configuration loaded from environment variables.

use std::env;

use storefront_infra::JwtConfig;
use storefront_infra::cache::CacheConfig;
use storefront_infra::database::DatabaseConfig;
use storefront_infra::pubsub::BrokerConfig;

#[cfg(feature = "redis")]
use storefront_infra::RedisConfig;

use crate::background::SchedulerConfig;
use crate::telemetry::TelemetryConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid JWT configuration: {0}")]
    Jwt(#[from] storefront_core::ports::AuthError),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs on in-memory stores.
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    pub cache: CacheConfig,
    #[cfg(feature = "redis")]
    pub redis: RedisConfig,
    pub broker: BrokerConfig,
    pub scheduler: SchedulerConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database = env::var("DATABASE_URL").ok().map(|main_url| {
            let defaults = DatabaseConfig::new(main_url);
            DatabaseConfig {
                main_max_connections: env_parse("DB_MAX_CONNECTIONS")
                    .unwrap_or(defaults.main_max_connections),
                main_min_connections: env_parse("DB_MIN_CONNECTIONS")
                    .unwrap_or(defaults.main_min_connections),
                ..defaults
            }
        });

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env_parse("PORT").unwrap_or(8080),
            database,
            jwt: JwtConfig::from_env()?,
            cache: CacheConfig::from_env(),
            #[cfg(feature = "redis")]
            redis: RedisConfig::from_env(),
            broker: BrokerConfig::from_env(),
            scheduler: SchedulerConfig::from_env(),
            telemetry: TelemetryConfig::from_env(),
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}
