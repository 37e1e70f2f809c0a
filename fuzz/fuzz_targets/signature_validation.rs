#![no_main]

//! Fuzz target for webhook signature verification.
//!
//! Splits the input into a secret, a body and a candidate signature. The
//! verifier must never panic, must accept its own signature and must reject
//! any candidate that differs from it.

use libfuzzer_sys::fuzz_target;
use payhook_api::{SignatureVerifier, SigningSecret};

fuzz_target!(|data: &[u8]| {
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let (secret, rest) = rest.split_at(usize::from(split).min(rest.len()));
    let (body, candidate) = rest.split_at(rest.len() / 2);

    let secret = String::from_utf8_lossy(secret);
    let Ok(verifier) = SignatureVerifier::new(SigningSecret::new(secret.to_string())) else {
        assert!(secret.is_empty(), "non-empty secret rejected");
        return;
    };

    let expected = verifier.sign(body);
    assert!(verifier.verify(body, &expected));

    let candidate = String::from_utf8_lossy(candidate);
    assert_eq!(verifier.verify(body, &candidate), candidate == expected);
});
