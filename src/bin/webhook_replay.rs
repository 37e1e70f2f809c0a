//! Replays a sample payment lifecycle against a running Payhook instance.
//!
//! Sends an authorization and a capture for one payment, redelivers the
//! authorization to exercise idempotency, then prints the payment history.
//!
//! Environment:
//! - `PAYHOOK_BASE_URL` (default `http://localhost:8000`)
//! - `WEBHOOK_SECRET` (default `test_secret`)
//! - `REPLAY_PAYMENT_ID` (default `pay_014`)

use std::time::Duration;

use anyhow::{Context, Result};
use payhook_api::{SignatureVerifier, SigningSecret};
use serde_json::{json, Value};
use tracing::info;

const SIGNATURE_HEADER: &str = "X-Razorpay-Signature";

struct Replay {
    client: reqwest::Client,
    base_url: String,
    verifier: SignatureVerifier,
}

impl Replay {
    fn from_env() -> Result<Self> {
        let base_url = std::env::var("PAYHOOK_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string())
            .trim_end_matches('/')
            .to_string();
        let secret = std::env::var("WEBHOOK_SECRET").unwrap_or_else(|_| "test_secret".to_string());

        let verifier = SignatureVerifier::new(SigningSecret::new(secret))
            .context("Invalid WEBHOOK_SECRET")?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, base_url, verifier })
    }

    async fn send_webhook(&self, payload: &Value) -> Result<()> {
        let body = serde_json::to_string(payload)?;
        let signature = self.verifier.sign(body.as_bytes());

        info!(event = %payload["event"], id = %payload["id"], "Sending event");

        let response = self
            .client
            .post(format!("{}/webhook/payments", self.base_url))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(body)
            .send()
            .await
            .context("Webhook request failed")?;

        let status = response.status();
        let reply: Value = response.json().await.context("Webhook response is not JSON")?;
        info!(%status, response = %reply, "Webhook answered");
        Ok(())
    }

    async fn print_history(&self, payment_id: &str) -> Result<()> {
        info!(payment_id, "Fetching history");

        let history: Value = self
            .client
            .get(format!("{}/payments/{payment_id}/events", self.base_url))
            .send()
            .await
            .context("History request failed")?
            .error_for_status()?
            .json()
            .await
            .context("History response is not JSON")?;

        println!("{}", serde_json::to_string_pretty(&history)?);
        Ok(())
    }
}

fn lifecycle(payment_id: &str) -> [Value; 2] {
    [
        json!({
            "event": "payment.authorized",
            "payload": {
                "payment": {"entity": {"id": payment_id, "status": "authorized", "amount": 5000, "currency": "INR"}}
            },
            "created_at": 1_751_889_865,
            "id": "evt_auth_014"
        }),
        json!({
            "event": "payment.captured",
            "payload": {
                "payment": {"entity": {"id": payment_id, "status": "captured", "amount": 5000, "currency": "INR"}}
            },
            "created_at": 1_751_889_900,
            "id": "evt_cap_014"
        }),
    ]
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let replay = Replay::from_env()?;
    let payment_id = std::env::var("REPLAY_PAYMENT_ID").unwrap_or_else(|_| "pay_014".to_string());
    let events = lifecycle(&payment_id);

    for event in &events {
        replay.send_webhook(event).await?;
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    info!("Redelivering the first event");
    replay.send_webhook(&events[0]).await?;

    replay.print_history(&payment_id).await
}
