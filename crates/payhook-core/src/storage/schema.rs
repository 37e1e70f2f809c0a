//! Schema bootstrap for the `payment_events` table.

use sqlx::PgPool;

use crate::error::Result;

/// Advisory lock key serializing concurrent bootstraps.
const SCHEMA_LOCK_KEY: i64 = 0x7061_7968_6f6f_6b;

/// Creates the `payment_events` table and its indexes when missing.
///
/// Safe to run on every startup, including from several processes at once:
/// the DDL runs in one transaction holding an advisory lock.
///
/// # Errors
///
/// Returns error if any DDL statement fails.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(SCHEMA_LOCK_KEY)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS payment_events (
            id BIGSERIAL PRIMARY KEY,
            event_id TEXT NOT NULL,
            payment_id TEXT NOT NULL,
            event_type TEXT NOT NULL,
            full_payload JSONB NOT NULL,
            received_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT payment_events_event_id_key UNIQUE (event_id)
        )
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_payment_events_payment
        ON payment_events(payment_id, received_at)
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
