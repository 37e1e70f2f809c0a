//! Webhook payload builders.
//!
//! Payloads mirror the provider envelope: top-level `event`, `id` and
//! `created_at`, with the payment entity nested under
//! `payload.payment.entity`.

use serde_json::{json, Value};
use uuid::Uuid;

/// Builder for provider webhook payloads.
#[derive(Debug, Clone)]
pub struct WebhookBuilder {
    event_id: String,
    payment_id: String,
    event_type: String,
    status: String,
    amount: u64,
    currency: String,
    created_at: i64,
}

impl WebhookBuilder {
    /// Creates a builder with a fresh event id and payment id.
    pub fn new() -> Self {
        Self {
            event_id: format!("evt_{}", Uuid::new_v4().simple()),
            payment_id: format!("pay_{}", Uuid::new_v4().simple()),
            event_type: "payment.authorized".to_string(),
            status: "authorized".to_string(),
            amount: 5000,
            currency: "INR".to_string(),
            created_at: 1_751_889_865,
        }
    }

    /// Sets the provider event id.
    #[must_use]
    pub fn event_id(mut self, id: impl Into<String>) -> Self {
        self.event_id = id.into();
        self
    }

    /// Sets the payment id.
    #[must_use]
    pub fn payment_id(mut self, id: impl Into<String>) -> Self {
        self.payment_id = id.into();
        self
    }

    /// Sets the event type. The entity status follows the suffix after the
    /// last dot, e.g. `payment.captured` gives `captured`.
    #[must_use]
    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self.status = self.event_type.rsplit('.').next().unwrap_or_default().to_string();
        self
    }

    /// Sets the payment amount in minor units.
    #[must_use]
    pub fn amount(mut self, amount: u64) -> Self {
        self.amount = amount;
        self
    }

    /// Sets the provider `created_at` epoch seconds.
    #[must_use]
    pub fn created_at(mut self, created_at: i64) -> Self {
        self.created_at = created_at;
        self
    }

    /// Builds the JSON payload.
    pub fn build(self) -> Value {
        json!({
            "event": self.event_type,
            "payload": {
                "payment": {
                    "entity": {
                        "id": self.payment_id,
                        "status": self.status,
                        "amount": self.amount,
                        "currency": self.currency,
                    }
                }
            },
            "created_at": self.created_at,
            "id": self.event_id,
        })
    }
}

impl Default for WebhookBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Shorthand for a payload with the given identifiers.
pub fn payment_webhook(event_id: &str, payment_id: &str, event_type: &str) -> Value {
    WebhookBuilder::new().event_id(event_id).payment_id(payment_id).event_type(event_type).build()
}

/// The two-event sample used by the replay harness: an authorization and a
/// capture of `pay_014`.
pub fn sample_sequence() -> [Value; 2] {
    [
        WebhookBuilder::new()
            .event_id("evt_auth_014")
            .payment_id("pay_014")
            .event_type("payment.authorized")
            .created_at(1_751_889_865)
            .build(),
        WebhookBuilder::new()
            .event_id("evt_cap_014")
            .payment_id("pay_014")
            .event_type("payment.captured")
            .created_at(1_751_889_900)
            .build(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_nests_payment_id() {
        let payload = payment_webhook("evt_1", "pay_1", "payment.captured");

        assert_eq!(payload["id"], "evt_1");
        assert_eq!(payload["event"], "payment.captured");
        assert_eq!(payload["payload"]["payment"]["entity"]["id"], "pay_1");
        assert_eq!(payload["payload"]["payment"]["entity"]["status"], "captured");
    }

    #[test]
    fn fresh_builders_do_not_collide() {
        let a = WebhookBuilder::new().build();
        let b = WebhookBuilder::new().build();
        assert_ne!(a["id"], b["id"]);
    }
}
