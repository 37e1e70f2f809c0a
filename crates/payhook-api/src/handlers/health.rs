//! Health check handlers for service monitoring.
//!
//! Provides liveness, readiness, and health endpoints. Health and readiness
//! probe the event store; liveness only proves the process answers.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use payhook_core::{Clock, EventStore};
use serde::Serialize;
use tracing::{debug, error, instrument};

use crate::server::AppState;

/// Reported when the storage check fails. The underlying error is only logged.
pub const STORAGE_DOWN_MESSAGE: &str = "Storage unavailable";

/// Health check response structure.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service health status
    pub status: HealthStatus,
    /// Timestamp when health check was performed
    pub timestamp: DateTime<Utc>,
    /// Individual component health checks
    pub checks: HealthChecks,
    /// Service version information
    pub version: String,
}

/// Overall health status enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All systems operational
    Healthy,
    /// Critical systems failing
    Unhealthy,
}

/// Individual component health check results.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    /// Event store connectivity
    pub storage: ComponentHealth,
}

/// Health status for individual components.
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    /// Component status
    pub status: ComponentStatus,
    /// Optional error message if unhealthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Response time in milliseconds
    pub response_time_ms: u64,
}

/// Component-level health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    /// Component is healthy
    Up,
    /// Component is experiencing issues
    Down,
}

/// Health service that encapsulates the clock dependency for testable health
/// checks.
pub struct HealthService {
    clock: Arc<dyn Clock>,
}

impl HealthService {
    /// Creates a new health service with the given clock.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Probes the event store and builds the report.
    pub async fn health_check(&self, store: &dyn EventStore) -> HealthResponse {
        debug!("Performing health check");

        let timestamp = self.clock.now_utc();
        let start_time = self.clock.now();

        let storage = match store.health_check().await {
            Ok(()) => ComponentHealth {
                status: ComponentStatus::Up,
                message: None,
                response_time_ms: 0,
            },
            Err(e) => {
                error!(error = %e, "Storage health check failed");
                ComponentHealth {
                    status: ComponentStatus::Down,
                    message: Some(STORAGE_DOWN_MESSAGE.to_string()),
                    response_time_ms: 0,
                }
            },
        };
        let elapsed = self.clock.now().saturating_duration_since(start_time);

        let status = match storage.status {
            ComponentStatus::Up => HealthStatus::Healthy,
            ComponentStatus::Down => HealthStatus::Unhealthy,
        };

        HealthResponse {
            status,
            timestamp,
            checks: HealthChecks {
                storage: ComponentHealth {
                    response_time_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                    ..storage
                },
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Health check endpoint handler.
#[instrument(name = "health_check", skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Response {
    let health_service = HealthService::new(state.clock.clone());
    let response = health_service.health_check(state.store.as_ref()).await;

    let status_code = match response.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    debug!(
        status = ?response.status,
        storage_status = ?response.checks.storage.status,
        "Health check completed"
    );

    (status_code, Json(response)).into_response()
}

/// Readiness check endpoint.
///
/// Ready means the event store answers, so this shares the health check.
#[instrument(name = "readiness_check", skip(state))]
pub async fn readiness_check(State(state): State<AppState>) -> Response {
    health_check(State(state)).await
}

/// Liveness check endpoint.
///
/// Does not touch the event store.
#[instrument(name = "liveness_check", skip(state))]
pub async fn liveness_check(State(state): State<AppState>) -> Response {
    debug!("Performing liveness check");

    let response = serde_json::json!({
        "status": "alive",
        "timestamp": state.clock.now_utc(),
        "service": "payhook-api"
    });

    (StatusCode::OK, Json(response)).into_response()
}

#[cfg(test)]
mod tests {
    use payhook_core::{storage::memory::InMemoryEventStore, TestClock};

    use super::*;

    #[tokio::test]
    async fn healthy_store_reports_up() {
        let clock = Arc::new(TestClock::new());
        let store = InMemoryEventStore::with_clock(clock.clone());

        let response = HealthService::new(clock).health_check(&store).await;

        assert_eq!(response.status, HealthStatus::Healthy);
        assert_eq!(response.checks.storage.status, ComponentStatus::Up);
        assert!(response.checks.storage.message.is_none());
    }

    #[tokio::test]
    async fn failing_store_reports_down() {
        let clock = Arc::new(TestClock::new());
        let store = InMemoryEventStore::with_clock(clock.clone());
        store.fail_with("connection refused").await;

        let response = HealthService::new(clock).health_check(&store).await;

        assert_eq!(response.status, HealthStatus::Unhealthy);
        assert_eq!(response.checks.storage.status, ComponentStatus::Down);
        let message = response.checks.storage.message.unwrap();
        assert_eq!(message, STORAGE_DOWN_MESSAGE);
        assert!(!message.contains("connection refused"));
    }
}
