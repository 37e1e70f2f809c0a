//! HMAC-SHA256 signature verification for incoming webhooks.
//!
//! The provider signs the exact request body with a shared secret and sends
//! the lowercase hex digest in a header. Verification always runs over the
//! raw bytes as received, before any JSON handling.

use std::fmt;

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Shared webhook secret.
///
/// Never printed: `Debug` renders a placeholder so configuration dumps and
/// tracing fields cannot leak it.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SigningSecret(String);

impl SigningSecret {
    /// Wraps a secret value.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Returns true when no secret is configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(***)")
    }
}

impl From<&str> for SigningSecret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Signature verifier construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// No secret configured.
    #[error("webhook secret is empty")]
    EmptySecret,
    /// The MAC rejected the key.
    #[error("invalid secret key")]
    InvalidSecret,
}

/// Verifies webhook signatures against one shared secret.
///
/// The secret is injected at construction, so tests can run several
/// verifiers side by side and a rotation is a matter of building a new one.
///
/// # Example
///
/// ```
/// use payhook_api::crypto::{SignatureVerifier, SigningSecret};
///
/// let verifier = SignatureVerifier::new(SigningSecret::new("test_secret")).unwrap();
/// let body = br#"{"event":"payment.authorized"}"#;
/// let signature = verifier.sign(body);
///
/// assert!(verifier.verify(body, &signature));
/// assert!(!verifier.verify(body, ""));
/// ```
#[derive(Clone)]
pub struct SignatureVerifier {
    mac: HmacSha256,
}

impl SignatureVerifier {
    /// Creates a verifier keyed with the given secret.
    ///
    /// # Errors
    ///
    /// Returns `SignatureError::EmptySecret` if the secret is empty.
    pub fn new(secret: SigningSecret) -> Result<Self, SignatureError> {
        if secret.is_empty() {
            return Err(SignatureError::EmptySecret);
        }

        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| SignatureError::InvalidSecret)?;
        Ok(Self { mac })
    }

    /// Computes the lowercase hex HMAC-SHA256 of `payload`.
    pub fn sign(&self, payload: &[u8]) -> String {
        let digest = self.mac.clone().chain_update(payload).finalize();
        hex::encode(digest.into_bytes())
    }

    /// Returns true when `signature` is the lowercase hex digest of
    /// `payload`.
    ///
    /// Only the shape of the header value (64 lowercase hex digits) is
    /// checked eagerly. The digest comparison goes through
    /// `Mac::verify_slice`, which is constant time.
    pub fn verify(&self, payload: &[u8], signature: &str) -> bool {
        if !is_lowercase_hex_digest(signature) {
            return false;
        }

        let Ok(expected) = hex::decode(signature) else {
            return false;
        };

        self.mac.clone().chain_update(payload).verify_slice(&expected).is_ok()
    }
}

impl fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureVerifier").field("algorithm", &"hmac-sha256").finish()
    }
}

const DIGEST_HEX_LEN: usize = 64;

fn is_lowercase_hex_digest(signature: &str) -> bool {
    signature.len() == DIGEST_HEX_LEN
        && signature.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
