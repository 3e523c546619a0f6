//! Access enforcement for token-protected operations.

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use host_core::{AccessType, CallerContext};
use tracing::warn;

use crate::response::ApiError;
use crate::state::AppState;

/// Reject anonymous callers on [`AccessType::Token`] operations.
///
/// Runs before tenancy, so an anonymous caller never triggers a lookup on a
/// protected route.
pub async fn authorize(
    State(state): State<AppState>,
    matched_path: Option<MatchedPath>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let route = matched_path.and_then(|path| state.routes.find(request.method(), path.as_str()));

    if let Some(route) = route {
        let authenticated = request
            .extensions()
            .get::<CallerContext>()
            .is_some_and(CallerContext::is_authenticated);

        if route.access == AccessType::Token && !authenticated {
            warn!(operation = route.operation, "Anonymous caller on protected operation");
            return Err(ApiError::unauthenticated(format!(
                "{} requires an authenticated caller",
                route.operation
            )));
        }
    }

    Ok(next.run(request).await)
}
