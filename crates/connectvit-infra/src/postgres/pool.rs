//! PostgreSQL connection pool.

use std::time::Duration;

use connectvit_types::config::DatabaseConfig;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::error::GatewayError;

/// Shared pool; PostgreSQL handles concurrent writers itself.
#[derive(Clone)]
pub struct PgDatabasePool {
    pub pool: PgPool,
}

impl PgDatabasePool {
    pub async fn new(database_url: &str) -> Result<Self, GatewayError> {
        Self::with_config(database_url, &DatabaseConfig::default()).await
    }

    /// Connect and run pending migrations.
    pub async fn with_config(
        database_url: &str,
        config: &DatabaseConfig,
    ) -> Result<Self, GatewayError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .acquire_timeout(Duration::from_millis(config.acquire_timeout_ms))
            .connect(database_url)
            .await?;

        sqlx::migrate!("../../migrations/postgres").run(&pool).await?;

        tracing::debug!("postgres pool ready");
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
