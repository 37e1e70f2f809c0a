//! Field extraction from provider webhook envelopes.
//!
//! The provider nests the payment identifier at
//! `payload.payment.entity.id`. Lookups walk the parsed JSON tolerantly: a
//! missing level, or a level that is not an object, yields "absent" rather
//! than an error.
//!
//! PostgreSQL `TEXT` and `JSONB` cannot hold U+0000, so a body carrying it
//! anywhere is rejected here as malformed instead of failing at insert.

use payhook_core::models::{EventId, NewPaymentEvent, PaymentId};
use serde_json::Value;
use thiserror::Error;

/// Path of the event type.
pub const EVENT_TYPE_PATH: &[&str] = &["event"];
/// Path of the provider event identifier.
pub const EVENT_ID_PATH: &[&str] = &["id"];
/// Path of the payment identifier inside the provider envelope.
pub const PAYMENT_ID_PATH: &[&str] = &["payload", "payment", "entity", "id"];

/// Walks `path` through nested objects.
///
/// Returns `None` as soon as a segment is missing or the current value is
/// not an object.
///
/// # Example
///
/// ```
/// use payhook_api::payload::lookup;
/// use serde_json::json;
///
/// let value = json!({"payload": {"payment": null}});
/// assert_eq!(lookup(&value, &["payload", "payment"]), Some(&json!(null)));
/// assert_eq!(lookup(&value, &["payload", "payment", "entity", "id"]), None);
/// ```
pub fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, segment| current.as_object()?.get(*segment))
}

/// Why a required field could not be extracted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The path does not resolve, or resolves to `null`.
    #[error("missing required field '{0}'")]
    Missing(String),
    /// The value is present but is not a string.
    #[error("field '{0}' must be a string")]
    NotString(String),
    /// The value is an empty string.
    #[error("field '{0}' must not be empty")]
    Empty(String),
    /// A string or object key somewhere in the body contains U+0000.
    #[error("field '{0}' contains a NUL character")]
    ContainsNul(String),
}

/// Resolves `path` to a non-empty string.
///
/// # Errors
///
/// Returns a `FieldError` naming the dotted path when the value is absent,
/// not a string, or empty.
pub fn required_str<'a>(value: &'a Value, path: &[&str]) -> Result<&'a str, FieldError> {
    let name = || path.join(".");

    match lookup(value, path) {
        None | Some(Value::Null) => Err(FieldError::Missing(name())),
        Some(Value::String(s)) if s.is_empty() => Err(FieldError::Empty(name())),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(FieldError::NotString(name())),
    }
}

/// Finds the first string value or object key containing U+0000.
///
/// Returns its location as a dotted path with `[i]` array indices. The empty
/// string means the root value itself.
pub fn find_nul(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => s.contains('\0').then(String::new),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, item)| find_nul(item).map(|rest| format!("[{i}]{}", nested(&rest)))),
        Value::Object(map) => map.iter().find_map(|(key, item)| {
            if key.contains('\0') {
                return Some(key.escape_default().to_string());
            }
            find_nul(item).map(|rest| format!("{key}{}", nested(&rest)))
        }),
        _ => None,
    }
}

fn nested(rest: &str) -> String {
    if rest.is_empty() || rest.starts_with('[') {
        rest.to_string()
    } else {
        format!(".{rest}")
    }
}

/// The three fields the ingestion path requires from every webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeFields {
    /// Top-level `event`.
    pub event_type: String,
    /// Top-level `id`.
    pub event_id: EventId,
    /// `payload.payment.entity.id`.
    pub payment_id: PaymentId,
}

impl EnvelopeFields {
    /// Extracts the required fields from a parsed webhook body.
    ///
    /// # Errors
    ///
    /// Returns the first field that is missing or invalid, checked in the
    /// order event type, event id, payment id. A body whose required fields
    /// are all present is then rejected if any string in it holds U+0000.
    pub fn extract(body: &Value) -> Result<Self, FieldError> {
        let event_type = required_str(body, EVENT_TYPE_PATH)?;
        let event_id = required_str(body, EVENT_ID_PATH)?;
        let payment_id = required_str(body, PAYMENT_ID_PATH)?;

        if let Some(path) = find_nul(body) {
            return Err(FieldError::ContainsNul(path));
        }

        Ok(Self {
            event_type: event_type.to_string(),
            event_id: EventId::from(event_id),
            payment_id: PaymentId::from(payment_id),
        })
    }

    /// Builds the candidate record, carrying the full payload verbatim.
    pub fn into_new_event(self, full_payload: Value) -> NewPaymentEvent {
        NewPaymentEvent {
            event_id: self.event_id,
            payment_id: self.payment_id,
            event_type: self.event_type,
            full_payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn envelope() -> Value {
        json!({
            "event": "payment.authorized",
            "id": "evt_auth_014",
            "created_at": 1_751_889_865,
            "payload": {
                "payment": {
                    "entity": {"id": "pay_014", "status": "authorized", "amount": 5000, "currency": "INR"}
                }
            }
        })
    }

    #[test]
    fn extracts_all_three_fields() {
        let fields = EnvelopeFields::extract(&envelope()).unwrap();

        assert_eq!(fields.event_type, "payment.authorized");
        assert_eq!(fields.event_id, EventId::from("evt_auth_014"));
        assert_eq!(fields.payment_id, PaymentId::from("pay_014"));
    }

    #[test]
    fn candidate_keeps_full_payload() {
        let body = envelope();
        let event = EnvelopeFields::extract(&body).unwrap().into_new_event(body.clone());
        assert_eq!(event.full_payload, body);
    }

    #[test]
    fn lookup_tolerates_missing_levels() {
        let body = json!({"payload": {}});
        assert_eq!(lookup(&body, PAYMENT_ID_PATH), None);
        assert_eq!(lookup(&json!({}), PAYMENT_ID_PATH), None);
    }

    #[test]
    fn lookup_tolerates_non_object_levels() {
        assert_eq!(lookup(&json!({"payload": "oops"}), PAYMENT_ID_PATH), None);
        assert_eq!(lookup(&json!({"payload": {"payment": [1, 2]}}), PAYMENT_ID_PATH), None);
        assert_eq!(lookup(&json!([1, 2, 3]), EVENT_ID_PATH), None);
        assert_eq!(lookup(&json!("string"), EVENT_TYPE_PATH), None);
    }

    #[test]
    fn empty_path_returns_root() {
        let body = json!({"a": 1});
        assert_eq!(lookup(&body, &[]), Some(&body));
    }

    #[test]
    fn missing_nested_payment_id_is_named() {
        let mut body = envelope();
        body["payload"]["payment"]["entity"] = json!({});

        assert_eq!(
            EnvelopeFields::extract(&body).unwrap_err(),
            FieldError::Missing("payload.payment.entity.id".to_string())
        );
    }

    #[test]
    fn null_counts_as_missing() {
        let mut body = envelope();
        body["event"] = Value::Null;
        assert_eq!(
            EnvelopeFields::extract(&body).unwrap_err(),
            FieldError::Missing("event".to_string())
        );
    }

    #[test]
    fn empty_event_id_is_rejected() {
        let mut body = envelope();
        body["id"] = json!("");
        assert_eq!(
            EnvelopeFields::extract(&body).unwrap_err(),
            FieldError::Empty("id".to_string())
        );
    }

    #[test]
    fn numeric_payment_id_is_rejected() {
        let mut body = envelope();
        body["payload"]["payment"]["entity"]["id"] = json!(14);
        assert_eq!(
            EnvelopeFields::extract(&body).unwrap_err(),
            FieldError::NotString("payload.payment.entity.id".to_string())
        );
    }

    #[test]
    fn nul_in_nested_string_is_rejected() {
        let mut body = envelope();
        body["payload"]["payment"]["entity"]["notes"] = json!("x\u{0}y");

        assert_eq!(
            EnvelopeFields::extract(&body).unwrap_err(),
            FieldError::ContainsNul("payload.payment.entity.notes".to_string())
        );
    }

    #[test]
    fn nul_in_event_id_is_rejected() {
        let mut body = envelope();
        body["id"] = json!("evt_\u{0}");

        assert_eq!(
            EnvelopeFields::extract(&body).unwrap_err(),
            FieldError::ContainsNul("id".to_string())
        );
    }

    #[test]
    fn find_nul_reports_array_indices_and_keys() {
        assert_eq!(find_nul(&json!({"a": [1, {"b": "\u{0}"}]})), Some("a[1].b".to_string()));
        assert_eq!(find_nul(&json!([["ok", "\u{0}"]])), Some("[0][1]".to_string()));
        assert_eq!(find_nul(&json!({"k\u{0}": 1})), Some("k\\u{0}".to_string()));
        assert_eq!(find_nul(&envelope()), None);
    }
}
