//! In-memory event store.
//!
//! Deterministic storage for tests and local development. The uniqueness
//! check and the insert happen under a single write guard, which gives the
//! same outcome as the PostgreSQL unique constraint under concurrent
//! delivery.

use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc};

use tokio::sync::RwLock;

use super::{EventStore, InsertOutcome};
use crate::{
    error::{CoreError, Result},
    models::{EventId, NewPaymentEvent, PaymentEvent, PaymentId},
    time::{Clock, RealClock},
};

#[derive(Default)]
struct State {
    by_event_id: HashMap<EventId, PaymentEvent>,
    next_id: i64,
    failure: Option<String>,
}

/// In-memory `EventStore` implementation.
///
/// `received_at` comes from the injected clock, so a `TestClock` makes
/// history ordering fully deterministic.
#[derive(Clone)]
pub struct InMemoryEventStore {
    state: Arc<RwLock<State>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryEventStore {
    /// Creates an empty store stamped by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(RealClock::new()))
    }

    /// Creates an empty store stamped by the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { state: Arc::new(RwLock::new(State::default())), clock }
    }

    /// Makes every subsequent operation fail with a database error.
    ///
    /// Used to exercise storage fault handling.
    pub async fn fail_with(&self, message: impl Into<String>) {
        self.state.write().await.failure = Some(message.into());
    }

    /// Clears an injected failure.
    pub async fn recover(&self) {
        self.state.write().await.failure = None;
    }

    /// Returns the number of stored events.
    pub async fn len(&self) -> usize {
        self.state.read().await.by_event_id.len()
    }

    /// Returns true when no events are stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Looks up a stored event by its id.
    pub async fn get(&self, event_id: &EventId) -> Option<PaymentEvent> {
        self.state.read().await.by_event_id.get(event_id).cloned()
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EventStore for InMemoryEventStore {
    fn insert(
        &self,
        event: NewPaymentEvent,
    ) -> Pin<Box<dyn Future<Output = Result<InsertOutcome>> + Send + '_>> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            if let Some(message) = &state.failure {
                return Err(CoreError::Database(message.clone()));
            }

            if state.by_event_id.contains_key(&event.event_id) {
                return Ok(InsertOutcome::Duplicate);
            }

            state.next_id += 1;
            let stored = PaymentEvent {
                id: state.next_id,
                event_id: event.event_id,
                payment_id: event.payment_id,
                event_type: event.event_type,
                full_payload: event.full_payload,
                received_at: self.clock.now_utc(),
            };
            state.by_event_id.insert(stored.event_id.clone(), stored.clone());

            Ok(InsertOutcome::Inserted(stored))
        })
    }

    fn find_by_payment_id<'a>(
        &'a self,
        payment_id: &'a PaymentId,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PaymentEvent>>> + Send + 'a>> {
        Box::pin(async move {
            let state = self.state.read().await;
            if let Some(message) = &state.failure {
                return Err(CoreError::Database(message.clone()));
            }

            let mut events: Vec<PaymentEvent> = state
                .by_event_id
                .values()
                .filter(|event| &event.payment_id == payment_id)
                .cloned()
                .collect();
            events.sort_by(|a, b| a.received_at.cmp(&b.received_at).then(a.id.cmp(&b.id)));

            Ok(events)
        })
    }

    fn health_check(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            match &self.state.read().await.failure {
                Some(message) => Err(CoreError::Database(message.clone())),
                None => Ok(()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::time::TestClock;

    fn new_event(event_id: &str, payment_id: &str, event_type: &str) -> NewPaymentEvent {
        NewPaymentEvent {
            event_id: EventId::from(event_id),
            payment_id: PaymentId::from(payment_id),
            event_type: event_type.to_string(),
            full_payload: json!({"id": event_id}),
        }
    }

    #[tokio::test]
    async fn second_insert_of_same_event_is_duplicate() {
        let store = InMemoryEventStore::new();

        let first = store.insert(new_event("evt_1", "pay_1", "payment.authorized")).await.unwrap();
        let second = store.insert(new_event("evt_1", "pay_1", "payment.captured")).await.unwrap();

        assert!(first.is_inserted());
        assert_eq!(second, InsertOutcome::Duplicate);
        assert_eq!(store.len().await, 1);

        let kept = store.get(&EventId::from("evt_1")).await.unwrap();
        assert_eq!(kept.event_type, "payment.authorized");
    }

    #[tokio::test]
    async fn history_is_ordered_by_receipt_time() {
        let clock = TestClock::new();
        let store = InMemoryEventStore::with_clock(Arc::new(clock.clone()));

        store.insert(new_event("evt_a", "pay_1", "payment.authorized")).await.unwrap();
        clock.advance(Duration::from_secs(1));
        store.insert(new_event("evt_b", "pay_2", "payment.authorized")).await.unwrap();
        clock.advance(Duration::from_secs(1));
        store.insert(new_event("evt_c", "pay_1", "payment.captured")).await.unwrap();

        let history = store.find_by_payment_id(&PaymentId::from("pay_1")).await.unwrap();
        let types: Vec<_> = history.iter().map(|e| e.event_type.as_str()).collect();

        assert_eq!(types, ["payment.authorized", "payment.captured"]);
        assert!(history[0].received_at < history[1].received_at);
    }

    #[tokio::test]
    async fn equal_timestamps_keep_insertion_order() {
        let clock = TestClock::new();
        let store = InMemoryEventStore::with_clock(Arc::new(clock));

        for (i, kind) in ["payment.authorized", "payment.captured", "refund.created"].iter().enumerate()
        {
            store.insert(new_event(&format!("evt_{i}"), "pay_1", kind)).await.unwrap();
        }

        let history = store.find_by_payment_id(&PaymentId::from("pay_1")).await.unwrap();
        let types: Vec<_> = history.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(types, ["payment.authorized", "payment.captured", "refund.created"]);
    }

    #[tokio::test]
    async fn unknown_payment_yields_empty_history() {
        let store = InMemoryEventStore::new();
        let history = store.find_by_payment_id(&PaymentId::from("pay_missing")).await.unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn injected_failure_surfaces_as_database_error() {
        let store = InMemoryEventStore::new();
        store.fail_with("disk on fire").await;

        let err = store.insert(new_event("evt_1", "pay_1", "payment.authorized")).await.unwrap_err();
        assert!(matches!(err, CoreError::Database(_)));
        assert!(store.health_check().await.is_err());

        store.recover().await;
        assert!(store.health_check().await.is_ok());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn concurrent_duplicates_commit_exactly_once() {
        let store = InMemoryEventStore::new();

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store.insert(new_event("evt_race", "pay_1", "payment.authorized")).await
                })
            })
            .collect();

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_inserted() {
                inserted += 1;
            }
        }

        assert_eq!(inserted, 1);
        assert_eq!(store.len().await, 1);
    }
}
