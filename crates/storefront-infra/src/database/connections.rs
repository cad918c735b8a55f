use std::time::Duration;

#[cfg(feature = "postgres")]
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DbConn, DbErr, Schema};

/// Configuration for the main database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub main_url: String,
    pub main_max_connections: u32,
    pub main_min_connections: u32,
    pub connect_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(main_url: impl Into<String>) -> Self {
        Self {
            main_url: main_url.into(),
            main_max_connections: 100,
            main_min_connections: 10,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Connection pool for the storefront database.
///
/// # Example
/// ```ignore
/// let db = DatabaseConnections::init(&config).await?;
/// db.ensure_schema().await?;
/// let users = PostgresUserRepository::new(db.main.clone());
/// ```
#[cfg(feature = "postgres")]
pub struct DatabaseConnections {
    pub main: DbConn,
}

#[cfg(feature = "postgres")]
impl DatabaseConnections {
    pub async fn init(config: &DatabaseConfig) -> Result<Self, DbErr> {
        tracing::info!("Initializing database connection...");

        let main_opts = ConnectOptions::new(&config.main_url)
            .max_connections(config.main_max_connections)
            .min_connections(config.main_min_connections)
            .connect_timeout(config.connect_timeout)
            .idle_timeout(Duration::from_secs(300))
            .sqlx_logging(false)
            .to_owned();

        let main = Database::connect(main_opts).await?;
        tracing::info!(
            "Main database connected (pool: {})",
            config.main_max_connections
        );

        Ok(Self { main })
    }

    /// Create any missing tables from the entity definitions.
    pub async fn ensure_schema(&self) -> Result<(), DbErr> {
        use super::entity::{audit_log, invoice, item, refresh_token, user};

        let backend = self.main.get_database_backend();
        let schema = Schema::new(backend);
        let tables = [
            schema.create_table_from_entity(user::Entity),
            schema.create_table_from_entity(refresh_token::Entity),
            schema.create_table_from_entity(audit_log::Entity),
            schema.create_table_from_entity(item::Entity),
            schema.create_table_from_entity(invoice::Entity),
        ];

        for mut table in tables {
            table.if_not_exists();
            self.main.execute(backend.build(&table)).await?;
        }

        tracing::info!(tables = 5, "Database schema ready");
        Ok(())
    }

    /// Round-trip a trivial query; used by the readiness probe.
    pub async fn ping(&self) -> Result<(), DbErr> {
        self.main.ping().await
    }
}
