//! Persistence layer for payment events.
//!
//! `EventStore` is the seam the HTTP handlers depend on. Production wires in
//! `Storage` over PostgreSQL; tests and local runs can use
//! `memory::InMemoryEventStore`, which gives the same uniqueness guarantee.
//!
//! Idempotency is enforced by the store itself: an insert either commits a
//! new row or reports `InsertOutcome::Duplicate`. Callers never check for an
//! existing row before inserting.

use std::{future::Future, pin::Pin, sync::Arc};

use sqlx::PgPool;

pub mod memory;
pub mod payment_events;
pub mod schema;

use crate::{
    error::Result,
    models::{NewPaymentEvent, PaymentEvent, PaymentId},
};

/// Result of an insert attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// The event was stored. Carries the row as committed.
    Inserted(PaymentEvent),
    /// An event with the same `event_id` already exists; nothing was written.
    Duplicate,
}

impl InsertOutcome {
    /// Returns true when the insert committed a new row.
    pub const fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

/// Storage operations required by the webhook handlers.
///
/// Implementations must make insert atomic with respect to the `event_id`
/// uniqueness check: concurrent inserts of one id commit exactly one row and
/// every other caller observes `InsertOutcome::Duplicate`.
pub trait EventStore: Send + Sync + 'static {
    /// Inserts a new event, or reports a duplicate `event_id`.
    fn insert(
        &self,
        event: NewPaymentEvent,
    ) -> Pin<Box<dyn Future<Output = Result<InsertOutcome>> + Send + '_>>;

    /// Returns all events for a payment, earliest `received_at` first.
    fn find_by_payment_id<'a>(
        &'a self,
        payment_id: &'a PaymentId,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PaymentEvent>>> + Send + 'a>>;

    /// Verifies the backing store is reachable.
    fn health_check(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// PostgreSQL-backed storage.
///
/// Entry point for all database operations; wraps the shared pool and the
/// payment event repository.
#[derive(Clone)]
pub struct Storage {
    /// Repository for payment event operations.
    pub payment_events: Arc<payment_events::Repository>,
}

impl Storage {
    /// Creates a new storage instance with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { payment_events: Arc::new(payment_events::Repository::new(Arc::new(pool))) }
    }

    /// Executes a trivial query to verify database connectivity.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` if the connection is unhealthy.
    pub async fn health_check(&self) -> Result<()> {
        let _: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&*self.payment_events.pool()).await?;

        Ok(())
    }
}

impl EventStore for Storage {
    fn insert(
        &self,
        event: NewPaymentEvent,
    ) -> Pin<Box<dyn Future<Output = Result<InsertOutcome>> + Send + '_>> {
        Box::pin(async move { self.payment_events.insert(&event).await })
    }

    fn find_by_payment_id<'a>(
        &'a self,
        payment_id: &'a PaymentId,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PaymentEvent>>> + Send + 'a>> {
        Box::pin(async move { self.payment_events.find_by_payment_id(payment_id).await })
    }

    fn health_check(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(Storage::health_check(self))
    }
}
