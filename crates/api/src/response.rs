//! Problem responses (RFC 7807).

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use host_core::TenancyErrorCode;
use serde::{Deserialize, Serialize};

/// Media type of every error body.
pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// Problem details body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    /// Stable reason code, e.g. `MissingTenantId`
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

/// API error rendered as a problem response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub problem: ProblemDetails,
}

impl ApiError {
    pub fn with_code(status: StatusCode, code: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            status,
            problem: ProblemDetails {
                problem_type: problem_type(status),
                title: status
                    .canonical_reason()
                    .unwrap_or("Unknown Error")
                    .to_string(),
                status: status.as_u16(),
                detail: detail.into(),
                code: code.into(),
                errors: None,
            },
        }
    }

    /// Tenancy rejection: status comes from the code.
    pub fn tenancy(code: TenancyErrorCode, detail: impl Into<String>) -> Self {
        let status = StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::BAD_REQUEST);
        Self::with_code(status, code.code(), detail)
    }

    pub fn unauthenticated(detail: impl Into<String>) -> Self {
        Self::with_code(StatusCode::UNAUTHORIZED, "Unauthenticated", detail)
    }

    pub fn validation(errors: Vec<String>) -> Self {
        let mut error = Self::with_code(StatusCode::BAD_REQUEST, "Validation", "Validation failed");
        error.problem.errors = Some(errors);
        error
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::with_code(StatusCode::INTERNAL_SERVER_ERROR, "Internal", detail)
    }

    pub fn code(&self) -> &str {
        &self.problem.code
    }
}

fn problem_type(status: StatusCode) -> String {
    let section = match status.as_u16() {
        400 => "15.5.1",
        401 => "15.5.2",
        403 => "15.5.4",
        404 => "15.5.5",
        500 => "15.6.1",
        503 => "15.6.4",
        _ => return "about:blank".to_string(),
    };
    format!("https://tools.ietf.org/html/rfc9110#section-{}", section)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.problem)).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(PROBLEM_CONTENT_TYPE),
        );
        response
    }
}

impl From<host_core::Error> for ApiError {
    fn from(err: host_core::Error) -> Self {
        let status =
            StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match &err {
            host_core::Error::Tenancy { code, message, .. } => {
                ApiError::with_code(status, *code, message)
            }
            host_core::Error::Unauthenticated(msg) => ApiError::unauthenticated(msg),
            // Don't leak collaborator internals
            host_core::Error::ServiceUnavailable(_) => ApiError::with_code(
                status,
                err.error_code(),
                "A required service is temporarily unavailable",
            ),
            _ => ApiError::with_code(status, err.error_code(), err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| match &error.message {
                    Some(message) => format!("{}: {}", field, message),
                    None => format!("{}: {}", field, error.code),
                })
            })
            .collect();
        ApiError::validation(messages)
    }
}
