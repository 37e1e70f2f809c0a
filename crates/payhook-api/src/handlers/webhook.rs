//! Payment webhook receiver.
//!
//! Authenticates the raw body against the shared secret, extracts the event
//! envelope, and stores it once per provider event id. Redeliveries are
//! acknowledged with `ignored` so the provider stops retrying.

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{HeaderMap, HeaderName},
    Json,
};
use payhook_core::InsertOutcome;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::{error::ApiError, payload::EnvelopeFields, server::AppState};

/// Outcome reported to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    /// A new event was stored.
    Success,
    /// The event id was already stored; nothing changed.
    Ignored,
}

/// Body of a 200 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAck {
    /// `success` or `ignored`.
    pub status: AckStatus,
    /// Human-readable summary.
    pub message: String,
}

impl WebhookAck {
    fn processed() -> Self {
        Self { status: AckStatus::Success, message: "Event processed".to_string() }
    }

    fn already_processed() -> Self {
        Self { status: AckStatus::Ignored, message: "Event already processed".to_string() }
    }
}

/// Handles `POST /webhook/payments`.
///
/// Checks run in a fixed order and the first failure wins: body read,
/// signature presence, signature match, JSON syntax, required fields. Nothing
/// is written unless all of them pass.
///
/// # Errors
///
/// - 400: body unreadable or too large, invalid JSON, malformed payload
/// - 403: missing or invalid signature
/// - 500: storage failure
#[instrument(
    name = "receive_payment_webhook",
    skip_all,
    fields(
        event_id = tracing::field::Empty,
        payment_id = tracing::field::Empty,
        event_type = tracing::field::Empty,
    )
)]
pub async fn receive_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<WebhookAck>, ApiError> {
    let raw = to_bytes(body, state.max_body_bytes).await.map_err(|e| {
        warn!(error = %e, limit = state.max_body_bytes, "Failed to read webhook body");
        ApiError::BodyUnreadable
    })?;
    debug!(body_len = raw.len(), "Webhook body received");

    let signature = signature_from(&headers, &state.signature_header)?;
    if !state.verifier.verify(&raw, signature) {
        return Err(ApiError::InvalidSignature);
    }

    let payload: Value = serde_json::from_slice(&raw).map_err(|_| ApiError::InvalidJson)?;
    let fields = EnvelopeFields::extract(&payload)?;

    let span = tracing::Span::current();
    span.record("event_id", fields.event_id.as_str());
    span.record("payment_id", fields.payment_id.as_str());
    span.record("event_type", fields.event_type.as_str());

    match state.store.insert(fields.into_new_event(payload)).await? {
        InsertOutcome::Inserted(event) => {
            info!(id = event.id, received_at = %event.received_at, "Payment event stored");
            Ok(Json(WebhookAck::processed()))
        },
        InsertOutcome::Duplicate => {
            info!("Duplicate payment event ignored");
            Ok(Json(WebhookAck::already_processed()))
        },
    }
}

/// Reads the signature header.
///
/// An absent or empty header is "missing". A value that is not visible ASCII
/// cannot be a hex digest and is treated as invalid.
fn signature_from<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Result<&'a str, ApiError> {
    let value = headers.get(name).ok_or(ApiError::MissingSignature)?;
    if value.is_empty() {
        return Err(ApiError::MissingSignature);
    }

    value.to_str().map_err(|_| ApiError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn header() -> HeaderName {
        HeaderName::from_static("x-razorpay-signature")
    }

    #[test]
    fn absent_header_is_missing() {
        let headers = HeaderMap::new();
        assert!(matches!(signature_from(&headers, &header()), Err(ApiError::MissingSignature)));
    }

    #[test]
    fn empty_header_is_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(header(), HeaderValue::from_static(""));
        assert!(matches!(signature_from(&headers, &header()), Err(ApiError::MissingSignature)));
    }

    #[test]
    fn opaque_header_is_invalid() {
        let mut headers = HeaderMap::new();
        headers.insert(header(), HeaderValue::from_bytes(&[0xfa, 0xfb]).unwrap());
        assert!(matches!(signature_from(&headers, &header()), Err(ApiError::InvalidSignature)));
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Razorpay-Signature", HeaderValue::from_static("abc"));
        assert_eq!(signature_from(&headers, &header()).unwrap(), "abc");
    }

    #[test]
    fn ack_serializes_lowercase_status() {
        let json = serde_json::to_value(WebhookAck::already_processed()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "ignored", "message": "Event already processed"})
        );
    }
}
