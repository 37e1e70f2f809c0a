//! Payment event entity and strongly-typed identifiers.
//!
//! Identifiers are provider-assigned strings. Wrapping them keeps an event id
//! from being passed where a payment id is expected, while still mapping
//! directly onto `TEXT` columns.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provider-assigned webhook event identifier; the idempotency key.
///
/// # Example
///
/// ```
/// use payhook_core::models::EventId;
/// let id = EventId::from("evt_1");
/// assert_eq!(id.as_str(), "evt_1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct EventId(pub String);

impl EventId {
    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Provider-assigned payment identifier. Many events share one payment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct PaymentId(pub String);

impl PaymentId {
    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PaymentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PaymentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A persisted webhook notification.
///
/// Created once per distinct `event_id` and never mutated afterwards.
/// `received_at` is assigned by the store, not taken from the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentEvent {
    /// Surrogate key, monotonically assigned by the store.
    pub id: i64,

    /// Idempotency key supplied by the provider.
    pub event_id: EventId,

    /// Payment the event belongs to.
    pub payment_id: PaymentId,

    /// Event type, e.g. `payment.authorized`.
    pub event_type: String,

    /// Complete parsed webhook body, kept for audit and replay.
    pub full_payload: serde_json::Value,

    /// Receipt time assigned at persistence.
    pub received_at: DateTime<Utc>,
}

/// Candidate record produced by the ingestion path.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPaymentEvent {
    /// Idempotency key supplied by the provider.
    pub event_id: EventId,
    /// Payment the event belongs to.
    pub payment_id: PaymentId,
    /// Event type.
    pub event_type: String,
    /// Complete parsed webhook body.
    pub full_payload: serde_json::Value,
}

/// One entry of a payment's event history as returned by the read API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Event type.
    pub event_type: String,
    /// Receipt time, serialized as RFC 3339 in UTC.
    pub received_at: DateTime<Utc>,
}

impl From<&PaymentEvent> for TimelineEntry {
    fn from(event: &PaymentEvent) -> Self {
        Self { event_type: event.event_type.clone(), received_at: event.received_at }
    }
}

impl From<PaymentEvent> for TimelineEntry {
    fn from(event: PaymentEvent) -> Self {
        Self { event_type: event.event_type, received_at: event.received_at }
    }
}
