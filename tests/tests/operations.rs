//! Operations through the real router.

use api::{
    routes::operations::{GetOrganizationSettingsResponse, MASKED_VALUE},
    PROBLEM_CONTENT_TYPE,
};
use axum::http::{Method, StatusCode};
use integration_tests::{fixtures::*, setup::TestContext};
use serde_json::json;

// === Record crash ===

#[tokio::test]
async fn test_record_crash_is_anonymous_and_untenanted() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .post("/record/crash")
        .json(&json!({ "message": "NullReferenceException in Startup" }))
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({}));
    assert_eq!(ctx.directory.membership_lookups(), 0);
    assert_eq!(ctx.directory.settings_lookups(), 0);
}

#[tokio::test]
async fn test_record_crash_validates_message() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .post("/record/crash")
        .json(&json!({ "message": "" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "Validation");
    assert!(body["errors"][0].as_str().unwrap().starts_with("message"));
}

#[tokio::test]
async fn test_record_crash_malformed_body_is_a_problem() {
    let ctx = TestContext::new();
    let server = ctx.server();

    for body in [json!({}), json!({ "message": 42 })] {
        let response = server.post("/record/crash").json(&body).await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            response.header("content-type").to_str().unwrap(),
            PROBLEM_CONTENT_TYPE
        );
        let problem: serde_json::Value = response.json();
        assert_eq!(problem["code"], "Validation");
        assert_eq!(problem["status"], 422);
    }
}

// === Organization settings ===

#[tokio::test]
async fn test_member_reads_settings_with_secrets_masked() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .get(&format!("/organizations/{}/settings", TENANT_ID))
        .add_header("Authorization", bearer(CALLER_ID))
        .await;

    response.assert_status_ok();
    let body: GetOrganizationSettingsResponse = response.json();
    assert_eq!(body.organization_id, TENANT_ID);
    assert_eq!(body.settings["region"], "eu-west");
    assert_eq!(body.settings["apikey"], MASKED_VALUE);
}

#[tokio::test]
async fn test_route_value_takes_precedence_over_header() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .get(&format!("/organizations/{}/settings", TENANT_ID))
        .add_header("Authorization", bearer(CALLER_ID))
        .add_header("Tenant", FOREIGN_TENANT_ID)
        .await;

    response.assert_status_ok();
    let body: GetOrganizationSettingsResponse = response.json();
    assert_eq!(body.organization_id, TENANT_ID);
}

#[tokio::test]
async fn test_non_member_cannot_read_settings() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .get(&format!("/organizations/{}/settings", FOREIGN_TENANT_ID))
        .add_header("Authorization", bearer(CALLER_ID))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "UserNotAMember");
}

#[tokio::test]
async fn test_anonymous_caller_rejected_before_tenancy() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .get(&format!("/organizations/{}/settings", TENANT_ID))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "Unauthenticated");
    assert_eq!(ctx.directory.settings_lookups(), 0);
}

#[tokio::test]
async fn test_head_on_settings_enforces_access_and_tenancy() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .method(Method::HEAD, &format!("/organizations/{}/settings", TENANT_ID))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .method(Method::HEAD, &format!("/organizations/{}/settings", FOREIGN_TENANT_ID))
        .add_header("Authorization", bearer(CALLER_ID))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = server
        .method(Method::HEAD, &format!("/organizations/{}/settings", TENANT_ID))
        .add_header("Authorization", bearer(CALLER_ID))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_malformed_authorization_is_rejected() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .get("/testingonly/authz/none/get")
        .add_header("Authorization", "Basic dXNlcjpwYXNz")
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "Unauthenticated");
}
