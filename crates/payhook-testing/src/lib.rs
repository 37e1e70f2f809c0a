//! Test infrastructure for Payhook.
//!
//! `TestEnv` wires the real router to an in-memory event store and a
//! controllable clock, then drives it in-process with `tower::ServiceExt`.
//! No sockets are opened.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use bytes::Bytes;
use payhook_api::{create_router, AppState, SignatureVerifier, SigningSecret};
use payhook_core::{storage::memory::InMemoryEventStore, EventStore};
use serde_json::Value;
use tower::ServiceExt;

pub mod database;
pub mod fixtures;

pub use database::TestDatabase;
pub use fixtures::{payment_webhook, sample_sequence, WebhookBuilder};
pub use payhook_core::TestClock;

/// Secret every `TestEnv` signs with.
pub const TEST_SECRET: &str = "test_secret";

/// Header every `TestEnv` expects the signature in.
pub const SIGNATURE_HEADER: &str = "X-Razorpay-Signature";

/// In-process application under test.
pub struct TestEnv {
    /// Deterministic clock stamping `received_at`.
    pub clock: TestClock,
    /// Store behind the router when built with `new`.
    pub store: InMemoryEventStore,
    verifier: SignatureVerifier,
    router: Router,
}

/// Status, headers and parsed JSON body of a response.
#[derive(Debug)]
pub struct TestResponse {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// JSON body, or `Value::Null` when the body is empty.
    pub body: Value,
}

impl TestEnv {
    /// Builds an environment over a fresh in-memory store.
    pub fn new() -> Self {
        let clock = TestClock::new();
        let store = InMemoryEventStore::with_clock(Arc::new(clock.clone()));
        Self::build(clock, store.clone(), Arc::new(store), |state| state)
    }

    /// Builds an environment over the given store. `self.store` is a detached
    /// in-memory store in that case.
    pub fn with_store(store: Arc<dyn EventStore>) -> Self {
        let clock = TestClock::new();
        Self::build(clock, InMemoryEventStore::new(), store, |state| state)
    }

    /// Builds an environment over a fresh in-memory store with a body limit.
    pub fn with_max_body_bytes(limit: usize) -> Self {
        let clock = TestClock::new();
        let store = InMemoryEventStore::with_clock(Arc::new(clock.clone()));
        Self::build(clock, store.clone(), Arc::new(store), |state| {
            state.with_max_body_bytes(limit)
        })
    }

    /// Builds an environment over the given store with a short request
    /// timeout, for exercising stalled storage.
    pub fn with_request_timeout(store: Arc<dyn EventStore>, timeout: Duration) -> Self {
        let clock = TestClock::new();
        Self::build(clock, InMemoryEventStore::new(), store, |state| {
            state.with_request_timeout(timeout)
        })
    }

    fn build(
        clock: TestClock,
        memory: InMemoryEventStore,
        backend: Arc<dyn EventStore>,
        customize: impl FnOnce(AppState) -> AppState,
    ) -> Self {
        let verifier = test_verifier();
        let state = AppState::new(backend, verifier.clone()).with_clock(Arc::new(clock.clone()));
        let router = create_router(customize(state));

        Self { clock, store: memory, verifier, router }
    }

    /// A clone of the router, for callers driving it directly.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Signs `body` with the test secret.
    pub fn sign(&self, body: &[u8]) -> String {
        self.verifier.sign(body)
    }

    /// A correctly signed `POST /webhook/payments` request.
    pub fn signed_webhook(&self, body: impl Into<Bytes>) -> Request<Body> {
        let body = body.into();
        let signature = self.sign(&body);
        webhook_request(body, Some(&signature))
    }

    /// Serializes `payload` compactly, signs it and posts it.
    pub async fn post_webhook(&self, payload: &Value) -> Result<TestResponse> {
        self.send(self.signed_webhook(payload.to_string())).await
    }

    /// Fetches the history of one payment.
    pub async fn history(&self, payment_id: &str) -> Result<TestResponse> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(format!("/payments/{payment_id}/events"))
            .body(Body::empty())
            .context("Failed to build history request")?;
        self.send(request).await
    }

    /// Drives one request through the router.
    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self.router.clone().oneshot(request).await?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .context("Failed to read response body")?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).context("Response body is not JSON")?
        };

        Ok(TestResponse { status, headers, body })
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a verifier keyed with `TEST_SECRET`.
pub fn test_verifier() -> SignatureVerifier {
    SignatureVerifier::new(SigningSecret::new(TEST_SECRET))
        .unwrap_or_else(|e| panic!("test secret rejected: {e}"))
}

/// A `POST /webhook/payments` request with an optional raw signature value.
pub fn webhook_request(body: impl Into<Bytes>, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/webhook/payments")
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }

    builder
        .body(Body::from(body.into()))
        .unwrap_or_else(|e| panic!("invalid webhook request: {e}"))
}
