use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use crate::config::DatabaseConfig;

/// Owns the shared Postgres pool.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Opens the pool and runs a liveness probe. Any failure here is fatal.
    pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(cfg.max_open_connections)
            .min_connections(cfg.max_idle_connections)
            .max_lifetime(cfg.connection_max_lifetime)
            .acquire_timeout(cfg.acquire_timeout)
            .connect(&cfg.url)
            .await
            .context("connect to database")?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .context("ping database")?;

        info!(
            max_open = cfg.max_open_connections,
            max_idle = cfg.max_idle_connections,
            max_lifetime_secs = cfg.connection_max_lifetime.as_secs(),
            "database connected"
        );
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }

    pub fn handle(&self) -> PgPool {
        self.pool.clone()
    }

    pub async fn shutdown(self) {
        self.pool.close().await;
        info!("database pool closed");
    }
}
