//! Tenant detection.
//!
//! Looks for a caller-supplied tenant id in, by priority:
//! 1. the `organization_id` route value
//! 2. the `Tenant` header
//! 3. the `organizationId` query parameter, then `tenantId`
//!
//! Whether a tenant is required comes from the route descriptor alone.

use axum::extract::RawPathParams;
use axum::http::request::Parts;
use host_core::{RouteDescriptor, TenantDetectionResult};

/// Route value carrying the organization id.
pub const TENANT_ROUTE_VALUE: &str = "organization_id";

/// Header carrying the organization id.
pub const TENANT_HEADER: &str = "Tenant";

/// Query parameters carrying the organization id, in priority order.
pub const TENANT_QUERY_PARAMS: [&str; 2] = ["organizationId", "tenantId"];

/// Decoded path parameters of the matched route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteValues(Vec<(String, String)>);

impl RouteValues {
    pub fn new(values: Vec<(String, String)>) -> Self {
        Self(values)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl From<&RawPathParams> for RouteValues {
    fn from(params: &RawPathParams) -> Self {
        Self(
            params
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        )
    }
}

/// Inspects an inbound request for tenancy.
pub trait TenantDetective: Send + Sync {
    /// Never fails: a missing tenant id is a valid result.
    fn detect_tenant(
        &self,
        parts: &Parts,
        route_values: &RouteValues,
        route: Option<&RouteDescriptor>,
    ) -> TenantDetectionResult;
}

/// Detects tenants from route values, headers, and the query string.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestTenantDetective;

impl RequestTenantDetective {
    pub fn new() -> Self {
        Self
    }

    fn from_route(route_values: &RouteValues) -> Option<String> {
        non_blank(route_values.get(TENANT_ROUTE_VALUE))
    }

    fn from_header(parts: &Parts) -> Option<String> {
        non_blank(
            parts
                .headers
                .get(TENANT_HEADER)
                .and_then(|value| value.to_str().ok()),
        )
    }

    fn from_query(parts: &Parts) -> Option<String> {
        let query = parts.uri.query()?;
        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();

        TENANT_QUERY_PARAMS.iter().find_map(|name| {
            pairs
                .iter()
                .filter(|(key, _)| key == name)
                .find_map(|(_, value)| non_blank(Some(value)))
        })
    }
}

impl TenantDetective for RequestTenantDetective {
    fn detect_tenant(
        &self,
        parts: &Parts,
        route_values: &RouteValues,
        route: Option<&RouteDescriptor>,
    ) -> TenantDetectionResult {
        let Some(route) = route else {
            return TenantDetectionResult::none();
        };

        let tenant_id = Self::from_route(route_values)
            .or_else(|| Self::from_header(parts))
            .or_else(|| Self::from_query(parts));

        TenantDetectionResult::new(route.requires_tenant, tenant_id)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
