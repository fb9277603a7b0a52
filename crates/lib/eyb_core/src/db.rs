//! PostgreSQL access: pool wrapper, storage errors, embedded migrations.

use sqlx::PgPool;
use thiserror::Error;

/// Storage errors shared by the application and job repositories.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    /// A row that violates a domain invariant (e.g. an unknown state string).
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Postgres-backed implementation of the repository traits.
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Run all embedded migrations (`eyb_core/migrations/`) against the pool.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
