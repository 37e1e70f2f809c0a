//! Signature authentication tests.
//!
//! The signature covers the exact request bytes. Anything that is not the
//! lowercase hex HMAC-SHA256 of those bytes under the shared secret is
//! rejected with 403 before the body is parsed.

use anyhow::Result;
use axum::http::StatusCode;
use payhook_api::{SignatureVerifier, SigningSecret};
use payhook_testing::{payment_webhook, webhook_request, TestEnv};
use serde_json::json;

fn body() -> String {
    payment_webhook("evt_sig_1", "pay_sig_1", "payment.authorized").to_string()
}

#[tokio::test]
async fn missing_signature_is_forbidden() -> Result<()> {
    let env = TestEnv::new();

    let response = env.send(webhook_request(body(), None)).await?;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body, json!({"detail": "Missing Signature Header"}));
    assert!(env.store.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn empty_signature_counts_as_missing() -> Result<()> {
    let env = TestEnv::new();

    let response = env.send(webhook_request(body(), Some(""))).await?;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body, json!({"detail": "Missing Signature Header"}));
    Ok(())
}

#[tokio::test]
async fn wrong_signature_is_forbidden() -> Result<()> {
    let env = TestEnv::new();

    let response = env.send(webhook_request(body(), Some(&"0".repeat(64)))).await?;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body, json!({"detail": "Invalid Signature"}));
    assert!(env.store.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn signature_from_other_secret_is_forbidden() -> Result<()> {
    let env = TestEnv::new();
    let other = SignatureVerifier::new(SigningSecret::new("not_the_secret"))?;
    let body = body();

    let response = env.send(webhook_request(body.clone(), Some(&other.sign(body.as_bytes())))).await?;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["detail"], "Invalid Signature");
    Ok(())
}

#[tokio::test]
async fn reserialized_body_does_not_verify() -> Result<()> {
    let env = TestEnv::new();
    let compact = body();
    let pretty = serde_json::to_string_pretty(&serde_json::from_str::<serde_json::Value>(&compact)?)?;
    let signature = env.sign(compact.as_bytes());

    let response = env.send(webhook_request(pretty, Some(&signature))).await?;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn uppercase_hex_is_rejected() -> Result<()> {
    let env = TestEnv::new();
    let body = body();
    let signature = env.sign(body.as_bytes()).to_uppercase();

    let response = env.send(webhook_request(body, Some(&signature))).await?;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["detail"], "Invalid Signature");
    Ok(())
}

#[tokio::test]
async fn signature_is_checked_before_json() -> Result<()> {
    let env = TestEnv::new();

    let response = env.send(webhook_request("not-json", Some("deadbeef"))).await?;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["detail"], "Invalid Signature");
    Ok(())
}

#[tokio::test]
async fn valid_signature_is_accepted() -> Result<()> {
    let env = TestEnv::new();
    let body = body();
    let signature = env.sign(body.as_bytes());

    let response = env.send(webhook_request(body, Some(&signature))).await?;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "success");
    Ok(())
}
