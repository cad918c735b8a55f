//! # Storefront Infrastructure
//!
//! Concrete implementations of the ports defined in `storefront-core`:
//! token signing, password hashing, caches, the in-process broker and the
//! stores.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory only
//! - `postgres` - PostgreSQL stores via SeaORM
//! - `auth` - JWT + Argon2 authentication
//! - `redis` - Redis cache

pub mod cache;
pub mod database;
pub mod pubsub;

#[cfg(feature = "auth")]
pub mod auth;

// Re-exports - In-Memory
pub use cache::InMemoryCache;
pub use database::{
    InMemoryAuditLogRepository, InMemoryInvoiceRepository, InMemoryItemRepository,
    InMemoryRefreshTokenRepository, InMemoryUserRepository,
};
pub use pubsub::{BrokerConfig, DrainReport, InMemoryBroker};

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};

// Re-exports - External services
#[cfg(feature = "redis")]
pub use cache::{RedisCache, RedisConfig};
#[cfg(feature = "postgres")]
pub use database::DatabaseConnections;
