//! Request extractors.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::request::Parts,
    Json,
};
use host_core::{CallerContext, ResolvedTenancy, TenancyContext};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::response::ApiError;

/// Resolved tenancy of a tenanted operation.
///
/// Rejects with 500 when the multi-tenancy layer did not set one, which only
/// happens when a handler is wired to an untenanted route.
#[derive(Debug, Clone)]
pub struct Tenancy(pub ResolvedTenancy);

#[async_trait]
impl<S> FromRequestParts<S> for Tenancy
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenancyContext>()
            .and_then(TenancyContext::get)
            .cloned()
            .map(Tenancy)
            .ok_or_else(|| ApiError::internal("No tenancy was resolved for this request"))
    }
}

/// Tenancy, if any was resolved.
#[derive(Debug, Clone)]
pub struct MaybeTenancy(pub Option<ResolvedTenancy>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeTenancy
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeTenancy(
            parts
                .extensions
                .get::<TenancyContext>()
                .and_then(TenancyContext::get)
                .cloned(),
        ))
    }
}

/// The caller resolved by the authentication layer.
#[derive(Debug, Clone)]
pub struct Caller(pub CallerContext);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Caller(
            parts
                .extensions
                .get::<CallerContext>()
                .cloned()
                .unwrap_or_default(),
        ))
    }
}

/// JSON body that has passed its `validator` rules.
///
/// Malformed bodies and failed rules both reject with a problem response.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::with_code(rejection.status(), "Validation", rejection.body_text())
    }
}
