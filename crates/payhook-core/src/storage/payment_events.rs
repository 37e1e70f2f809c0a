//! Repository for payment event database operations.
//!
//! The `UNIQUE (event_id)` constraint on `payment_events` is the idempotency
//! mechanism. Inserts are single statements, so a rejected duplicate leaves
//! no partial state behind.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::debug;

use crate::{
    error::{CoreError, Result},
    models::{NewPaymentEvent, PaymentEvent, PaymentId},
    storage::InsertOutcome,
};

/// Repository for payment event database operations.
pub struct Repository {
    pool: Arc<PgPool>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Returns a reference to the database pool.
    pub fn pool(&self) -> Arc<PgPool> {
        self.pool.clone()
    }

    /// Inserts a new payment event.
    ///
    /// A unique violation on `event_id` is reported as
    /// `InsertOutcome::Duplicate`; the database has already discarded the
    /// attempted row.
    ///
    /// # Errors
    ///
    /// Returns error for any failure other than the uniqueness violation.
    pub async fn insert(&self, event: &NewPaymentEvent) -> Result<InsertOutcome> {
        let inserted = sqlx::query_as::<_, PaymentEvent>(
            r#"
            INSERT INTO payment_events (event_id, payment_id, event_type, full_payload)
            VALUES ($1, $2, $3, $4)
            RETURNING id, event_id, payment_id, event_type, full_payload, received_at
            "#,
        )
        .bind(&event.event_id)
        .bind(&event.payment_id)
        .bind(&event.event_type)
        .bind(&event.full_payload)
        .fetch_one(&*self.pool)
        .await
        .map_err(CoreError::from);

        match inserted {
            Ok(row) => Ok(InsertOutcome::Inserted(row)),
            Err(CoreError::DuplicateKey(constraint)) => {
                debug!(event_id = %event.event_id, constraint = %constraint, "Duplicate event rejected by constraint");
                Ok(InsertOutcome::Duplicate)
            },
            Err(e) => Err(e),
        }
    }

    /// Returns all events for a payment ordered by receipt time.
    ///
    /// Ties on `received_at` fall back to insertion order.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn find_by_payment_id(&self, payment_id: &PaymentId) -> Result<Vec<PaymentEvent>> {
        let events = sqlx::query_as::<_, PaymentEvent>(
            r#"
            SELECT id, event_id, payment_id, event_type, full_payload, received_at
            FROM payment_events
            WHERE payment_id = $1
            ORDER BY received_at ASC, id ASC
            "#,
        )
        .bind(payment_id)
        .fetch_all(&*self.pool)
        .await?;

        Ok(events)
    }
}
