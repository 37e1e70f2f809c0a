#![no_main]

//! Fuzz target for webhook envelope parsing.
//!
//! Feeds arbitrary bytes through the same steps the receiver runs after
//! authentication: JSON parsing, then extraction of the event type, event id
//! and nested payment id. Nothing may panic, and a successful extraction
//! must yield non-empty fields that match a direct lookup.

use libfuzzer_sys::fuzz_target;
use payhook_api::payload::{lookup, EnvelopeFields, EVENT_ID_PATH, PAYMENT_ID_PATH};
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<Value>(data) else {
        return;
    };

    if let Ok(fields) = EnvelopeFields::extract(&value) {
        assert!(!fields.event_type.is_empty());
        assert_eq!(
            lookup(&value, EVENT_ID_PATH).and_then(Value::as_str),
            Some(fields.event_id.as_str())
        );
        assert_eq!(
            lookup(&value, PAYMENT_ID_PATH).and_then(Value::as_str),
            Some(fields.payment_id.as_str())
        );

        let event = fields.into_new_event(value.clone());
        assert_eq!(event.full_payload, value);
    }
});
