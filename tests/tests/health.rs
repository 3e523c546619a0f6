//! Tests for health check endpoints.
//!
//! Health routes bypass authentication and tenancy.

use axum::http::StatusCode;
use integration_tests::{fixtures::*, setup::TestContext};

/// Test /health endpoint returns proper structure
#[tokio::test]
async fn test_health_endpoint_structure() {
    let ctx = TestContext::new();

    let response = ctx.server().get("/health").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();

    for field in [
        "status",
        "end_users_connected",
        "organizations_connected",
        "tenancies_resolved",
        "components",
    ] {
        assert!(body.get(field).is_some(), "Response should have '{}' field", field);
    }
    assert_eq!(body["components"].as_array().unwrap().len(), 2);
}

/// Test /health reports one of the known statuses
#[tokio::test]
async fn test_health_endpoint_status() {
    let ctx = TestContext::new();

    let body: serde_json::Value = ctx.server().get("/health").await.json();

    let status = body["status"].as_str().unwrap_or("");
    assert!(
        status == "healthy" || status == "degraded" || status == "unhealthy",
        "Status should be 'healthy', 'degraded', or 'unhealthy', got '{}'",
        status
    );
}

/// Test /health/live always succeeds, even with credentials that would be rejected
#[tokio::test]
async fn test_live_probe_skips_authentication() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .get("/health/live")
        .add_header("Authorization", "Basic dXNlcjpwYXNz")
        .add_header("Tenant", INVALID_TENANT_ID)
        .await;

    response.assert_status(StatusCode::OK);
    assert_eq!(ctx.directory.settings_lookups(), 0);
}
