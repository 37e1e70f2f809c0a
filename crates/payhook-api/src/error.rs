//! HTTP error taxonomy for the webhook API.
//!
//! Client-caused failures (unreadable body, authentication, payload
//! validation) map to 4xx with a human-readable `detail`. Storage faults map
//! to 500 and never reveal internals in the response body. Duplicate
//! deliveries are not errors at all and never reach this type.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use payhook_core::CoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::payload::FieldError;

/// Error body: `{"detail": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable reason.
    pub detail: String,
}

/// Errors surfaced by the API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body could not be read (transport failure or over the
    /// configured size limit).
    #[error("Unable to read request body")]
    BodyUnreadable,

    /// The signature header is absent or empty.
    #[error("Missing Signature Header")]
    MissingSignature,

    /// The signature does not match the body.
    #[error("Invalid Signature")]
    InvalidSignature,

    /// The body is not valid JSON.
    #[error("Invalid JSON")]
    InvalidJson,

    /// A required field is missing or invalid.
    #[error("Malformed Payload: {0}")]
    MalformedPayload(#[from] FieldError),

    /// The store failed for a reason other than a duplicate event id.
    #[error("Storage failure: {0}")]
    Storage(#[from] CoreError),
}

impl ApiError {
    /// Returns the stable error code used in logs.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidSignature => "E1001",
            Self::MissingSignature => "E1002",
            Self::BodyUnreadable => "E1003",
            Self::InvalidJson => "E1004",
            Self::MalformedPayload(_) => "E1005",
            Self::Storage(_) => "E3001",
        }
    }

    /// Returns the HTTP status for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BodyUnreadable | Self::InvalidJson | Self::MalformedPayload(_) => {
                StatusCode::BAD_REQUEST
            },
            Self::MissingSignature | Self::InvalidSignature => StatusCode::FORBIDDEN,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match self {
            Self::Storage(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error_code = self.code(), error = %self, "Request failed");
        } else {
            warn!(error_code = self.code(), reason = %self, "Request rejected");
        }

        (status, Json(ErrorBody { detail: self.detail() })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(ApiError::BodyUnreadable.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidJson.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::MalformedPayload(FieldError::Missing("id".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::MissingSignature.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::InvalidSignature.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn storage_errors_map_to_500_without_leaking() {
        let err = ApiError::from(CoreError::Database("password authentication failed".into()));

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.detail(), "Internal server error");
    }

    #[test]
    fn malformed_payload_detail_names_field() {
        let err = ApiError::from(FieldError::Missing("payload.payment.entity.id".into()));
        assert_eq!(
            err.detail(),
            "Malformed Payload: missing required field 'payload.payment.entity.id'"
        );
    }

    #[test]
    fn error_codes_are_distinct() {
        let codes = [
            ApiError::InvalidSignature.code(),
            ApiError::MissingSignature.code(),
            ApiError::BodyUnreadable.code(),
            ApiError::InvalidJson.code(),
            ApiError::MalformedPayload(FieldError::Empty("id".into())).code(),
            ApiError::Storage(CoreError::Database("x".into())).code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }
}
