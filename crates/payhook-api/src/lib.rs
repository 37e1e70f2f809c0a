//! Payhook HTTP API.
//!
//! Receives signed payment-provider webhooks, stores each distinct event once
//! and serves the per-payment event history.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod payload;
pub mod server;

pub use config::Config;
pub use crypto::{SignatureVerifier, SigningSecret};
pub use error::ApiError;
pub use server::{create_router, start_server, AppState};
