//! Authentication middleware.

use axum::{
    extract::{Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use host_core::{extract_bearer_token, CallerContext, CallerContextFactory};
use tracing::{debug, warn};

use crate::response::ApiError;
use crate::state::AppState;

/// Resolve the caller from the `Authorization` header.
///
/// No header yields an anonymous caller. A malformed header or an inactive
/// token is rejected with 401. The caller is stored in request extensions.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());
        extract_bearer_token(auth_header)?.map(str::to_string)
    };

    let caller = match token {
        None => CallerContext::Anonymous,
        Some(token) => {
            let introspection = state.auth_client.introspect(&token).await?;
            let caller_id = introspection.caller_id().inspect_err(|_| {
                warn!("Request with inactive token");
            })?;
            CallerContext::authenticated(caller_id)
        }
    };

    debug!(caller_id = caller.caller_id().unwrap_or("anonymous"), "Caller resolved");
    request.extensions_mut().insert(caller);

    Ok(next.run(request).await)
}

/// Reads the caller stored by [`authenticate`]. Anonymous when absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionCallerContextFactory;

impl CallerContextFactory for ExtensionCallerContextFactory {
    fn create(&self, parts: &Parts) -> CallerContext {
        parts
            .extensions
            .get::<CallerContext>()
            .cloned()
            .unwrap_or_default()
    }
}
