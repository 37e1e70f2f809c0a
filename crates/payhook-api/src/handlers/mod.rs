//! HTTP request handlers for the Payhook API.
//!
//! - `webhook`: signed payment webhook ingestion
//! - `events`: per-payment event history
//! - `health`: health, readiness and liveness probes
//!
//! Failing handlers return `ApiError`, which renders as `{"detail": ...}`
//! with the matching status code.

pub mod events;
pub mod health;
pub mod webhook;

pub use events::list_payment_events;
pub use health::{health_check, liveness_check, readiness_check};
pub use webhook::{receive_payment_webhook, AckStatus, WebhookAck};
