//! Operations and their request contracts.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query},
    Json,
};
use host_core::{AccessType, OperationMethod, TenantedRequest, WebRequest};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use validator::Validate;

use crate::extractors::{Caller, MaybeTenancy, Tenancy, ValidatedJson};

/// Shown in place of encrypted setting values.
pub const MASKED_VALUE: &str = "********";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmptyResponse {}

// === Record crash ===

/// Crash report from a client application.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordCrashRequest {
    #[validate(length(min = 1, max = 2000, message = "Message must be 1-2000 characters"))]
    pub message: String,
}

impl WebRequest for RecordCrashRequest {
    type Response = EmptyResponse;
    const ROUTE: &'static str = "/record/crash";
    const METHOD: OperationMethod = OperationMethod::Post;
    const ACCESS: AccessType = AccessType::Anonymous;
}

/// POST /record/crash
pub async fn record_crash(
    Caller(caller): Caller,
    ValidatedJson(request): ValidatedJson<RecordCrashRequest>,
) -> Json<EmptyResponse> {
    error!(
        caller_id = caller.caller_id().unwrap_or("anonymous"),
        message = %request.message,
        "Client crash reported"
    );

    Json(EmptyResponse {})
}

// === Organization settings ===

#[derive(Debug, Clone, Deserialize)]
pub struct GetOrganizationSettingsRequest {
    pub organization_id: String,
}

impl WebRequest for GetOrganizationSettingsRequest {
    type Response = GetOrganizationSettingsResponse;
    const ROUTE: &'static str = "/organizations/:organization_id/settings";
    const METHOD: OperationMethod = OperationMethod::Get;
}

impl TenantedRequest for GetOrganizationSettingsRequest {
    fn organization_id(&self) -> Option<&str> {
        Some(&self.organization_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetOrganizationSettingsResponse {
    pub organization_id: String,
    pub settings: BTreeMap<String, String>,
}

/// GET /organizations/:organization_id/settings
///
/// Encrypted values are masked.
pub async fn get_organization_settings(
    Path(request): Path<GetOrganizationSettingsRequest>,
    Tenancy(tenancy): Tenancy,
) -> Json<GetOrganizationSettingsResponse> {
    info!(
        organization_id = ?request.organization_id(),
        tenant_id = %tenancy.tenant_id,
        "Fetching organization settings"
    );

    let settings = tenancy
        .settings
        .iter()
        .map(|(name, setting)| {
            let value = if setting.is_encrypted {
                MASKED_VALUE.to_string()
            } else {
                setting.value.clone()
            };
            (name.clone(), value)
        })
        .collect();

    Json(GetOrganizationSettingsResponse {
        organization_id: tenancy.tenant_id,
        settings,
    })
}

// === Testing only ===

/// Reports the caller, and any tenancy, without requiring either.
#[derive(Debug, Clone, Default)]
pub struct AuthorizeByNothingTestingOnlyRequest;

impl WebRequest for AuthorizeByNothingTestingOnlyRequest {
    type Response = TestingOnlyResponse;
    const ROUTE: &'static str = "/testingonly/authz/none/get";
    const METHOD: OperationMethod = OperationMethod::Get;
    const ACCESS: AccessType = AccessType::Anonymous;
    const TESTING_ONLY: bool = true;
}

/// Reports the resolved tenancy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTenancyTestingOnlyRequest {
    pub organization_id: Option<String>,
}

impl WebRequest for GetTenancyTestingOnlyRequest {
    type Response = TestingOnlyResponse;
    const ROUTE: &'static str = "/testingonly/multitenancy/get";
    const METHOD: OperationMethod = OperationMethod::Get;
    const ACCESS: AccessType = AccessType::Anonymous;
    const TESTING_ONLY: bool = true;
}

impl TenantedRequest for GetTenancyTestingOnlyRequest {
    fn organization_id(&self) -> Option<&str> {
        self.organization_id.as_deref()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestingOnlyResponse {
    pub caller_id: Option<String>,
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub settings: usize,
}

/// GET /testingonly/authz/none/get
pub async fn authorize_by_nothing(
    Caller(caller): Caller,
    MaybeTenancy(tenancy): MaybeTenancy,
) -> Json<TestingOnlyResponse> {
    Json(TestingOnlyResponse {
        caller_id: caller.caller_id().map(str::to_string),
        settings: tenancy.as_ref().map_or(0, |tenancy| tenancy.settings.len()),
        tenant_id: tenancy.map(|tenancy| tenancy.tenant_id),
    })
}

/// GET /testingonly/multitenancy/get
pub async fn get_tenancy(
    Caller(caller): Caller,
    Query(_request): Query<GetTenancyTestingOnlyRequest>,
    Tenancy(tenancy): Tenancy,
) -> Json<TestingOnlyResponse> {
    Json(TestingOnlyResponse {
        caller_id: caller.caller_id().map(str::to_string),
        settings: tenancy.settings.len(),
        tenant_id: Some(tenancy.tenant_id),
    })
}
