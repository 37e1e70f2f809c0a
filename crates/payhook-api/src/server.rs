//! HTTP server configuration and request routing.
//!
//! Requests flow through middleware in order:
//! 1. Request ID generation
//! 2. Request/response logging
//! 3. Timeout enforcement (503 once the request timeout elapses)
//! 4. Handler execution
//!
//! # Graceful Shutdown
//!
//! On CTRL+C or SIGTERM the server stops accepting connections and waits for
//! in-flight requests before returning.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{
    extract::Request,
    http::{HeaderName, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use payhook_core::{Clock, EventStore, RealClock};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{config::Config, crypto::SignatureVerifier, handlers};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Event persistence.
    pub store: Arc<dyn EventStore>,
    /// Webhook signature verifier.
    pub verifier: Arc<SignatureVerifier>,
    /// Header carrying the webhook signature.
    pub signature_header: HeaderName,
    /// Largest accepted webhook body in bytes.
    pub max_body_bytes: usize,
    /// Clock used by health reporting.
    pub clock: Arc<dyn Clock>,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl AppState {
    /// Builds state from validated configuration and a store.
    ///
    /// # Errors
    ///
    /// Fails when the secret or the signature header name is unusable.
    pub fn from_config(config: &Config, store: Arc<dyn EventStore>) -> Result<Self> {
        let verifier = SignatureVerifier::new(config.webhook_secret.clone())
            .context("Failed to build signature verifier")?;

        Ok(Self {
            store,
            verifier: Arc::new(verifier),
            signature_header: config.signature_header_name()?,
            max_body_bytes: config.max_body_bytes,
            clock: Arc::new(RealClock::new()),
            request_timeout: config.request_timeout(),
        })
    }

    /// Builds state with defaults for everything except store and verifier.
    pub fn new(store: Arc<dyn EventStore>, verifier: SignatureVerifier) -> Self {
        Self {
            store,
            verifier: Arc::new(verifier),
            signature_header: HeaderName::from_static("x-razorpay-signature"),
            max_body_bytes: 1024 * 1024,
            clock: Arc::new(RealClock::new()),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the per-request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Replaces the body size limit.
    #[must_use]
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }
}

/// Creates the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use payhook_api::{create_router, AppState, SignatureVerifier, SigningSecret};
/// use payhook_core::storage::memory::InMemoryEventStore;
///
/// let verifier = SignatureVerifier::new(SigningSecret::new("test_secret")).unwrap();
/// let app = create_router(AppState::new(Arc::new(InMemoryEventStore::new()), verifier));
/// ```
pub fn create_router(state: AppState) -> Router {
    let health_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/live", get(handlers::liveness_check));

    let api_routes = Router::new()
        .route("/webhook/payments", post(handlers::receive_payment_webhook))
        .route("/payments/{payment_id}/events", get(handlers::list_payment_events));

    let timeout = state.request_timeout;

    Router::new()
        .merge(health_routes)
        .merge(api_routes)
        .layer(TimeoutLayer::with_status_code(StatusCode::SERVICE_UNAVAILABLE, timeout))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(inject_request_id))
        .with_state(state)
}

/// Middleware to inject request ID into all responses.
///
/// Adds X-Request-Id header for tracing requests across services.
async fn inject_request_id(req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();

    let mut req = req;
    req.extensions_mut().insert(request_id.clone());

    let mut response = next.run(req).await;

    if let Ok(header_value) = request_id.parse() {
        response.headers_mut().insert("X-Request-Id", header_value);
    }

    response
}

/// Starts the HTTP server with graceful shutdown support.
///
/// # Errors
///
/// Returns `std::io::Error` if the address cannot be bound or the server
/// fails while serving.
pub async fn start_server(state: AppState, addr: SocketAddr) -> Result<(), std::io::Error> {
    let app = create_router(state);

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("HTTP server listening on {}", actual_addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("HTTP server stopped gracefully");
    Ok(())
}

/// Waits for shutdown signal (CTRL+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received CTRL+C, starting graceful shutdown");
        },
        () = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    warn!("Waiting for in-flight requests to complete");
}
