//! Tests for the metrics endpoint.
//!
//! Metrics are process-global, so the counts below are deltas.

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use integration_tests::{
    fixtures::*,
    mocks::UnavailableDirectory,
    setup::{build_router, TestContext},
};
use telemetry::{metrics, MetricsSnapshot};

#[tokio::test]
async fn test_metrics_endpoint_skips_authentication() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .get("/metrics")
        .add_header("Authorization", "Basic dXNlcjpwYXNz")
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    for field in [
        "requests_inspected",
        "tenancies_resolved",
        "rejected_not_a_member",
        "membership_lookup_errors",
        "resolution_latency_mean_ms",
    ] {
        assert!(body.get(field).is_some(), "Response should have '{}' field", field);
    }
}

#[tokio::test]
async fn test_failed_resolution_is_counted_and_timed() {
    let directory = Arc::new(UnavailableDirectory::new());
    let server = TestServer::new(build_router(directory.clone(), directory))
        .expect("Failed to create test server");
    let timed_before = metrics().resolution_latency_ms.count();
    let errors_before = metrics().membership_lookup_errors.get();

    let response = server
        .get("/testingonly/multitenancy/get")
        .add_header("Authorization", bearer(CALLER_ID))
        .add_header("Tenant", TENANT_ID)
        .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(metrics().resolution_latency_ms.count(), timed_before + 1);

    let snapshot: MetricsSnapshot = server.get("/metrics").await.json();
    assert_eq!(snapshot.membership_lookup_errors, errors_before + 1);
}
