pub mod models;
mod error;
mod repositories;

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;

use crate::config::DatabaseConfig;

pub use error::DatabaseError;
pub use repositories::{MemoryProgressStore, PgProgressStore, ProgressStore};

/// Initialize the database connection pool
pub async fn init_pool(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections.unwrap_or(10))
        .min_connections(config.min_connections.unwrap_or(1))
        .connect(&config.url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Postgres when a database is configured, the in-memory store otherwise.
pub async fn init_store(config: Option<&DatabaseConfig>) -> Result<Arc<dyn ProgressStore>, DatabaseError> {
    match config {
        Some(config) => {
            let pool = init_pool(config).await?;
            tracing::info!("Using Postgres progress store");
            Ok(Arc::new(PgProgressStore::new(pool)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, progress is kept in memory only");
            Ok(Arc::new(MemoryProgressStore::new()))
        }
    }
}
