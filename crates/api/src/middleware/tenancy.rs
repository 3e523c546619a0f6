//! Multi-tenancy middleware.
//!
//! Runs as a route layer, after authentication and access checks. For the
//! matched route it detects the tenant, authorizes the caller against it, and
//! hydrates the tenant settings into a request-scoped [`TenancyContext`].
//!
//! Every request ends in exactly one of: forwarded, forwarded with tenancy,
//! or halted with a tenancy problem response.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, RawPathParams, Request, State},
    middleware::Next,
    response::Response,
};
use host_core::{
    resources, CallerContext, EndUserWithMemberships, EndUsersService, IdentifierFactory,
    OrganizationsService, ResolvedTenancy, Result, TenancyContext, TenancyErrorCode,
    TenantDetectionResult,
};
use telemetry::metrics;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::detector::RouteValues;
use crate::response::ApiError;
use crate::state::AppState;

/// Why a request was halted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenancyRejection {
    pub code: TenancyErrorCode,
    pub message: String,
}

impl TenancyRejection {
    pub fn missing_tenant_id() -> Self {
        Self {
            code: TenancyErrorCode::MissingTenantId,
            message: resources::MISSING_TENANT_ID.to_string(),
        }
    }

    pub fn invalid_tenant_id() -> Self {
        Self {
            code: TenancyErrorCode::InvalidTenantId,
            message: resources::INVALID_TENANT_ID.to_string(),
        }
    }

    pub fn not_a_member(tenant_id: &str) -> Self {
        Self {
            code: TenancyErrorCode::UserNotAMember,
            message: resources::format(resources::USER_NOT_A_MEMBER, &[tenant_id]),
        }
    }
}

impl From<TenancyRejection> for ApiError {
    fn from(rejection: TenancyRejection) -> Self {
        ApiError::tenancy(rejection.code, rejection.message)
    }
}

/// Terminal outcome of resolving one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenancyOutcome {
    /// Forward without tenancy.
    Forward,
    /// Forward with the tenancy set.
    ForwardWithTenancy(ResolvedTenancy),
    /// Halt with a problem response.
    Reject(TenancyRejection),
}

/// Decides the tenancy of a request from its caller and detection result.
///
/// Makes at most one membership lookup and at most one settings lookup.
/// Collaborator failures, including cancellation, are returned as errors and
/// never turned into rejections.
#[derive(Clone)]
pub struct TenancyResolver {
    identifiers: Arc<dyn IdentifierFactory>,
    end_users: Arc<dyn EndUsersService>,
    organizations: Arc<dyn OrganizationsService>,
}

impl TenancyResolver {
    pub fn new(
        identifiers: Arc<dyn IdentifierFactory>,
        end_users: Arc<dyn EndUsersService>,
        organizations: Arc<dyn OrganizationsService>,
    ) -> Self {
        Self {
            identifiers,
            end_users,
            organizations,
        }
    }

    pub async fn resolve(
        &self,
        caller: &CallerContext,
        detection: &TenantDetectionResult,
        cancellation: &CancellationToken,
    ) -> Result<TenancyOutcome> {
        match caller.caller_id() {
            None => self.resolve_anonymous(caller, detection, cancellation).await,
            Some(caller_id) => {
                self.resolve_authenticated(caller, caller_id, detection, cancellation)
                    .await
            }
        }
    }

    async fn resolve_anonymous(
        &self,
        caller: &CallerContext,
        detection: &TenantDetectionResult,
        cancellation: &CancellationToken,
    ) -> Result<TenancyOutcome> {
        let Some(tenant_id) = detection.tenant_id.as_deref() else {
            if detection.is_tenant_required {
                return Ok(TenancyOutcome::Reject(TenancyRejection::missing_tenant_id()));
            }
            return Ok(TenancyOutcome::Forward);
        };

        if !self.identifiers.is_valid(tenant_id) {
            return Ok(TenancyOutcome::Reject(TenancyRejection::invalid_tenant_id()));
        }

        self.hydrate(caller, tenant_id, cancellation).await
    }

    async fn resolve_authenticated(
        &self,
        caller: &CallerContext,
        caller_id: &str,
        detection: &TenantDetectionResult,
        cancellation: &CancellationToken,
    ) -> Result<TenancyOutcome> {
        match detection.tenant_id.as_deref() {
            Some(tenant_id) => {
                if !self.identifiers.is_valid(tenant_id) {
                    return Ok(TenancyOutcome::Reject(TenancyRejection::invalid_tenant_id()));
                }

                let user = self.memberships(caller, caller_id, cancellation).await?;
                if user.membership_of(tenant_id).is_none() {
                    return Ok(TenancyOutcome::Reject(TenancyRejection::not_a_member(
                        tenant_id,
                    )));
                }

                self.hydrate(caller, tenant_id, cancellation).await
            }
            None if !detection.is_tenant_required => Ok(TenancyOutcome::Forward),
            None => {
                let user = self.memberships(caller, caller_id, cancellation).await?;
                match user.default_memberships().as_slice() {
                    [] => Ok(TenancyOutcome::Reject(TenancyRejection::missing_tenant_id())),
                    [default] => {
                        let tenant_id = default.organization_id.clone();
                        let outcome = self.hydrate(caller, &tenant_id, cancellation).await?;
                        metrics().default_tenancies_resolved.inc();
                        Ok(outcome)
                    }
                    defaults => {
                        warn!(
                            caller_id = %caller_id,
                            defaults = defaults.len(),
                            "Caller has more than one default organization"
                        );
                        Ok(TenancyOutcome::Reject(TenancyRejection::missing_tenant_id()))
                    }
                }
            }
        }
    }

    async fn memberships(
        &self,
        caller: &CallerContext,
        caller_id: &str,
        cancellation: &CancellationToken,
    ) -> Result<EndUserWithMemberships> {
        let start = Instant::now();
        metrics().membership_lookups.inc();

        let result = self
            .end_users
            .get_memberships(caller, caller_id, cancellation)
            .await;

        metrics()
            .membership_latency_ms
            .observe(start.elapsed().as_millis() as u64);
        if result.is_err() {
            metrics().membership_lookup_errors.inc();
        }
        result
    }

    async fn hydrate(
        &self,
        caller: &CallerContext,
        tenant_id: &str,
        cancellation: &CancellationToken,
    ) -> Result<TenancyOutcome> {
        let start = Instant::now();
        metrics().settings_lookups.inc();

        let result = self
            .organizations
            .get_settings(caller, tenant_id, cancellation)
            .await;

        metrics()
            .settings_latency_ms
            .observe(start.elapsed().as_millis() as u64);
        let settings = result.inspect_err(|_| metrics().settings_lookup_errors.inc())?;

        Ok(TenancyOutcome::ForwardWithTenancy(ResolvedTenancy {
            tenant_id: tenant_id.to_string(),
            settings,
        }))
    }
}

/// Tenancy route layer.
///
/// Requests whose matched route is not in the route table pass straight
/// through, without detection or collaborator calls.
pub async fn multi_tenancy(
    State(state): State<AppState>,
    matched_path: Option<MatchedPath>,
    path_params: Option<RawPathParams>,
    request: Request,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    let route = matched_path
        .and_then(|path| state.routes.find(request.method(), path.as_str()))
        .cloned();
    let Some(route) = route else {
        return Ok(next.run(request).await);
    };

    let start = Instant::now();
    metrics().requests_inspected.inc();

    let (mut parts, body) = request.into_parts();
    let route_values = path_params
        .as_ref()
        .map(RouteValues::from)
        .unwrap_or_default();

    let detection = state
        .tenant_detective
        .detect_tenant(&parts, &route_values, Some(&route));
    let caller = state.caller_factory.create(&parts);
    let cancellation = parts
        .extensions
        .get::<CancellationToken>()
        .cloned()
        .unwrap_or_default();

    let outcome = state
        .tenancy
        .resolve(&caller, &detection, &cancellation)
        .await;
    metrics()
        .resolution_latency_ms
        .observe(start.elapsed().as_millis() as u64);

    let outcome = outcome.inspect_err(|err| {
        if err.is_cancelled() {
            metrics().cancelled_requests.inc();
            debug!(operation = route.operation, "Request cancelled during tenancy resolution");
        } else {
            warn!(operation = route.operation, error = %err, "Tenancy resolution failed");
        }
    })?;

    match outcome {
        TenancyOutcome::Forward => {
            metrics().forwarded_untenanted.inc();
        }
        TenancyOutcome::ForwardWithTenancy(resolved) => {
            debug!(
                operation = route.operation,
                tenant_id = %resolved.tenant_id,
                settings = resolved.settings.len(),
                "Tenancy resolved"
            );
            let tenancy = parts
                .extensions
                .get::<TenancyContext>()
                .cloned()
                .unwrap_or_default();
            tenancy.set(resolved.tenant_id, resolved.settings)?;
            parts.extensions.insert(tenancy);
            metrics().tenancies_resolved.inc();
        }
        TenancyOutcome::Reject(rejection) => {
            match rejection.code {
                TenancyErrorCode::MissingTenantId => metrics().rejected_missing_tenant.inc(),
                TenancyErrorCode::InvalidTenantId => metrics().rejected_invalid_tenant.inc(),
                TenancyErrorCode::UserNotAMember => metrics().rejected_not_a_member.inc(),
            }
            warn!(
                operation = route.operation,
                code = rejection.code.code(),
                caller_id = caller.caller_id().unwrap_or("anonymous"),
                tenant_id = detection.tenant_id.as_deref().unwrap_or_default(),
                "Tenancy rejected"
            );
            return Err(rejection.into());
        }
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}
