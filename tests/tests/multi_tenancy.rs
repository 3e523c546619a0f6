//! Tenancy resolution through the real router.
//!
//! `/testingonly/authz/none/get` is untenanted and `/testingonly/multitenancy/get`
//! is tenanted. Both allow anonymous callers and echo the caller and tenancy.

use std::sync::Arc;

use api::{routes::operations::TestingOnlyResponse, PROBLEM_CONTENT_TYPE};
use axum::http::{Method, StatusCode};
use axum_test::{TestResponse, TestServer};
use integration_tests::{
    fixtures::*,
    mocks::UnavailableDirectory,
    setup::{build_router, TestContext},
};

const UNTENANTED: &str = "/testingonly/authz/none/get";
const TENANTED: &str = "/testingonly/multitenancy/get";

fn assert_problem(response: &TestResponse, status: StatusCode, code: &str) -> serde_json::Value {
    response.assert_status(status);
    assert_eq!(
        response.header("content-type").to_str().unwrap(),
        PROBLEM_CONTENT_TYPE
    );
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], code);
    assert_eq!(body["status"], status.as_u16());
    body
}

// === No operation ===

#[tokio::test]
async fn test_unmatched_route_is_not_inspected() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .get("/organizations/unknown")
        .add_header("Tenant", TENANT_ID)
        .add_header("Authorization", bearer(CALLER_ID))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(ctx.directory.membership_lookups(), 0);
    assert_eq!(ctx.directory.settings_lookups(), 0);
}

// === Anonymous callers ===

#[tokio::test]
async fn test_anonymous_without_tenant_forwards_on_untenanted_route() {
    let ctx = TestContext::new();

    let response = ctx.server().get(UNTENANTED).await;

    response.assert_status_ok();
    let body: TestingOnlyResponse = response.json();
    assert_eq!(body.caller_id, None);
    assert_eq!(body.tenant_id, None);
    assert_eq!(ctx.directory.settings_lookups(), 0);
}

#[tokio::test]
async fn test_anonymous_without_tenant_rejected_on_tenanted_route() {
    let ctx = TestContext::new();

    let response = ctx.server().get(TENANTED).await;

    let body = assert_problem(&response, StatusCode::BAD_REQUEST, "MissingTenantId");
    assert_eq!(
        body["detail"],
        "The request requires a tenant ID, but none was provided and the caller has no default organization"
    );
    assert_eq!(ctx.directory.settings_lookups(), 0);
}

#[tokio::test]
async fn test_anonymous_with_invalid_tenant_rejected_on_any_route() {
    let ctx = TestContext::new();
    let server = ctx.server();

    for path in [UNTENANTED, TENANTED] {
        let response = server
            .get(path)
            .add_query_param("organizationId", INVALID_TENANT_ID)
            .await;
        let body = assert_problem(&response, StatusCode::BAD_REQUEST, "InvalidTenantId");
        assert_eq!(body["detail"], "The tenant ID is not a valid identifier");
    }

    assert_eq!(ctx.directory.settings_lookups(), 0);
}

#[tokio::test]
async fn test_anonymous_with_valid_tenant_sets_tenancy() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .get(TENANTED)
        .add_query_param("organizationId", TENANT_ID)
        .await;

    response.assert_status_ok();
    let body: TestingOnlyResponse = response.json();
    assert_eq!(body.tenant_id.as_deref(), Some(TENANT_ID));
    assert_eq!(body.settings, 2);
    assert_eq!(ctx.directory.membership_lookups(), 0);
    assert_eq!(ctx.directory.settings_lookups(), 1);
}

#[tokio::test]
async fn test_anonymous_tenant_from_header_on_untenanted_route() {
    let ctx = TestContext::new();

    let response = ctx.server().get(UNTENANTED).add_header("Tenant", TENANT_ID).await;

    response.assert_status_ok();
    let body: TestingOnlyResponse = response.json();
    assert_eq!(body.tenant_id.as_deref(), Some(TENANT_ID));
}

#[tokio::test]
async fn test_anonymous_with_unknown_tenant_is_not_a_tenancy_error() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .get(TENANTED)
        .add_query_param("tenantId", UNKNOWN_TENANT_ID)
        .await;

    assert_problem(&response, StatusCode::NOT_FOUND, "NotFound");
}

// === Authenticated callers ===

#[tokio::test]
async fn test_member_resolves_supplied_tenant() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .get(TENANTED)
        .add_header("Authorization", bearer(CALLER_ID))
        .add_header("Tenant", TENANT_ID)
        .await;

    response.assert_status_ok();
    let body: TestingOnlyResponse = response.json();
    assert_eq!(body.caller_id.as_deref(), Some(CALLER_ID));
    assert_eq!(body.tenant_id.as_deref(), Some(TENANT_ID));
    assert_eq!(ctx.directory.membership_lookups(), 1);
    assert_eq!(ctx.directory.settings_lookups(), 1);
}

#[tokio::test]
async fn test_non_member_is_forbidden() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .get(TENANTED)
        .add_header("Authorization", bearer(CALLER_ID))
        .add_query_param("organizationId", FOREIGN_TENANT_ID)
        .await;

    let body = assert_problem(&response, StatusCode::FORBIDDEN, "UserNotAMember");
    assert_eq!(
        body["detail"],
        format!("The caller is not a member of the organization '{}'", FOREIGN_TENANT_ID)
    );
    assert_eq!(ctx.directory.settings_lookups(), 0);
}

#[tokio::test]
async fn test_authenticated_invalid_tenant_rejected_without_lookup() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .get(TENANTED)
        .add_header("Authorization", bearer(CALLER_ID))
        .add_header("Tenant", INVALID_TENANT_ID)
        .await;

    assert_problem(&response, StatusCode::BAD_REQUEST, "InvalidTenantId");
    assert_eq!(ctx.directory.membership_lookups(), 0);
}

#[tokio::test]
async fn test_default_membership_resolves_missing_tenant() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .get(TENANTED)
        .add_header("Authorization", bearer(CALLER_ID))
        .await;

    response.assert_status_ok();
    let body: TestingOnlyResponse = response.json();
    assert_eq!(body.tenant_id.as_deref(), Some(DEFAULT_TENANT_ID));
    assert_eq!(body.settings, 1);
}

#[tokio::test]
async fn test_no_default_membership_is_missing_tenant() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .get(TENANTED)
        .add_header("Authorization", bearer(NO_DEFAULT_CALLER_ID))
        .await;

    assert_problem(&response, StatusCode::BAD_REQUEST, "MissingTenantId");
    assert_eq!(ctx.directory.membership_lookups(), 1);
    assert_eq!(ctx.directory.settings_lookups(), 0);
}

#[tokio::test]
async fn test_ambiguous_default_membership_is_missing_tenant() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .get(TENANTED)
        .add_header("Authorization", bearer(AMBIGUOUS_CALLER_ID))
        .await;

    assert_problem(&response, StatusCode::BAD_REQUEST, "MissingTenantId");
    assert_eq!(ctx.directory.settings_lookups(), 0);
}

#[tokio::test]
async fn test_authenticated_untenanted_without_tenant_skips_lookups() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .get(UNTENANTED)
        .add_header("Authorization", bearer(CALLER_ID))
        .await;

    response.assert_status_ok();
    let body: TestingOnlyResponse = response.json();
    assert_eq!(body.caller_id.as_deref(), Some(CALLER_ID));
    assert_eq!(body.tenant_id, None);
    assert_eq!(ctx.directory.membership_lookups(), 0);
    assert_eq!(ctx.directory.settings_lookups(), 0);
}

// === HEAD requests ===

#[tokio::test]
async fn test_head_resolves_tenancy_like_get() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server.method(Method::HEAD, TENANTED).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.header("content-type").to_str().unwrap(),
        PROBLEM_CONTENT_TYPE
    );

    let response = server
        .method(Method::HEAD, TENANTED)
        .add_header("Authorization", bearer(CALLER_ID))
        .add_query_param("organizationId", FOREIGN_TENANT_ID)
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(ctx.directory.settings_lookups(), 0);

    let response = server
        .method(Method::HEAD, TENANTED)
        .add_header("Authorization", bearer(CALLER_ID))
        .add_header("Tenant", TENANT_ID)
        .await;
    response.assert_status_ok();
    assert_eq!(ctx.directory.settings_lookups(), 1);
}

// === Collaborator failures ===

#[tokio::test]
async fn test_unavailable_membership_service_is_not_a_tenancy_error() {
    let directory = Arc::new(UnavailableDirectory::new());
    let server = TestServer::new(build_router(directory.clone(), directory.clone()))
        .expect("Failed to create test server");

    let response = server
        .get(TENANTED)
        .add_header("Authorization", bearer(CALLER_ID))
        .add_header("Tenant", TENANT_ID)
        .await;

    let body = assert_problem(&response, StatusCode::SERVICE_UNAVAILABLE, "ServiceUnavailable");
    assert!(!body["detail"].as_str().unwrap().contains("connection refused"));
    assert_eq!(directory.calls(), 1);
}
