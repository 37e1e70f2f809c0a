//! Core domain models and storage for payment webhook events.
//!
//! Provides the `PaymentEvent` entity, strongly-typed identifiers, the
//! storage error taxonomy and the `EventStore` persistence seam. The API crate
//! depends on these types and never touches SQL directly.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod models;
pub mod storage;
pub mod time;

pub use error::{CoreError, Result};
pub use models::{EventId, NewPaymentEvent, PaymentEvent, PaymentId, TimelineEntry};
pub use storage::{EventStore, InsertOutcome};
pub use time::{Clock, RealClock, TestClock};
