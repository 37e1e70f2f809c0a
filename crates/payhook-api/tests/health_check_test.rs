//! Health, readiness and liveness endpoint tests.

use anyhow::Result;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use payhook_testing::TestEnv;

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).expect("valid request")
}

#[tokio::test]
async fn health_reports_healthy_store() -> Result<()> {
    let env = TestEnv::new();

    let response = env.send(get("/health")).await?;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    assert_eq!(response.body["checks"]["storage"]["status"], "up");
    assert!(response.body["version"].is_string());
    Ok(())
}

#[tokio::test]
async fn health_reports_unavailable_store() -> Result<()> {
    let env = TestEnv::new();
    env.store.fail_with("connection refused").await;

    let response = env.send(get("/health")).await?;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["status"], "unhealthy");
    assert_eq!(response.body["checks"]["storage"]["status"], "down");
    assert_eq!(response.body["checks"]["storage"]["message"], "Storage unavailable");
    assert!(!response.body.to_string().contains("connection refused"));
    Ok(())
}

#[tokio::test]
async fn readiness_follows_store() -> Result<()> {
    let env = TestEnv::new();
    assert_eq!(env.send(get("/ready")).await?.status, StatusCode::OK);

    env.store.fail_with("connection refused").await;
    assert_eq!(env.send(get("/ready")).await?.status, StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}

#[tokio::test]
async fn liveness_ignores_store() -> Result<()> {
    let env = TestEnv::new();
    env.store.fail_with("connection refused").await;

    let response = env.send(get("/live")).await?;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "alive");
    assert_eq!(response.body["service"], "payhook-api");
    Ok(())
}
