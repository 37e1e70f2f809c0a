//! PostgreSQL access for integration tests.
//!
//! Tests that need a real database read `TEST_DATABASE_URL`. When it is unset
//! `TestDatabase::from_env` returns `None` and the caller skips. Each test
//! gets its own pool, since a pool cannot outlive the runtime of the test
//! that created it. Tests isolate their rows by using unique ids.

use std::time::Duration;

use anyhow::{Context, Result};
use payhook_core::storage::{schema, Storage};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::debug;

const DATABASE_URL_VAR: &str = "TEST_DATABASE_URL";

/// Handle to the test database.
#[derive(Debug, Clone)]
pub struct TestDatabase {
    pool: PgPool,
}

impl TestDatabase {
    /// Connects to `TEST_DATABASE_URL` and ensures the schema exists.
    ///
    /// Returns `Ok(None)` when the variable is unset.
    pub async fn from_env() -> Result<Option<Self>> {
        let Ok(url) = std::env::var(DATABASE_URL_VAR) else {
            return Ok(None);
        };

        let pool = PgPoolOptions::new()
            .max_connections(20)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&url)
            .await
            .context("Failed to connect to test database")?;
        schema::ensure_schema(&pool).await.context("Failed to create schema")?;
        debug!("Test database ready");

        Ok(Some(Self { pool }))
    }

    /// Access to the underlying database pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// PostgreSQL-backed storage over this pool.
    pub fn storage(&self) -> Storage {
        Storage::new(self.pool.clone())
    }
}
