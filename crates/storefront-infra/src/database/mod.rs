//! Stores: PostgreSQL via SeaORM, plus in-memory doubles.

mod connections;
mod memory;

#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
pub mod postgres_repo;

#[cfg(feature = "postgres")]
pub mod entity;

pub use connections::DatabaseConfig;
pub use memory::{
    InMemoryAuditLogRepository, InMemoryInvoiceRepository, InMemoryItemRepository,
    InMemoryRefreshTokenRepository, InMemoryUserRepository,
};

#[cfg(feature = "postgres")]
pub use connections::DatabaseConnections;
#[cfg(feature = "postgres")]
pub use postgres_repo::{
    PostgresAuditLogRepository, PostgresInvoiceRepository, PostgresItemRepository,
    PostgresRefreshTokenRepository, PostgresUserRepository,
};

#[cfg(feature = "postgres")]
#[cfg(test)]
mod tests;
