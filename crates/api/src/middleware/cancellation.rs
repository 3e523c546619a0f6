//! Per-request cancellation.

use axum::{extract::Request, middleware::Next, response::Response};
use tokio_util::sync::CancellationToken;

/// Attach a [`CancellationToken`] to the request.
///
/// The token is cancelled when the request future completes or is dropped,
/// e.g. when the client disconnects, which aborts in-flight collaborator calls.
pub async fn request_cancellation(mut request: Request, next: Next) -> Response {
    let token = CancellationToken::new();
    let _guard = token.clone().drop_guard();
    request.extensions_mut().insert(token);

    next.run(request).await
}
