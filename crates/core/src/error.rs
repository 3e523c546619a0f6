//! Unified error types for the tenancy host.
//!
//! Tenancy rejections carry a stable reason code and an HTTP status:
//! - `MissingTenantId` (400)
//! - `InvalidTenantId` (400)
//! - `UserNotAMember` (403)

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Tenancy rejection reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenancyErrorCode {
    /// The route requires a tenant and none could be determined.
    MissingTenantId,
    /// The supplied tenant id fails the identifier format.
    InvalidTenantId,
    /// The caller holds no membership in the supplied organization.
    UserNotAMember,
}

impl TenancyErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingTenantId => "MissingTenantId",
            Self::InvalidTenantId => "InvalidTenantId",
            Self::UserNotAMember => "UserNotAMember",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::MissingTenantId => 400,
            Self::InvalidTenantId => 400,
            Self::UserNotAMember => 403,
        }
    }
}

/// Unified error type for the tenancy host.
#[derive(Debug, Error)]
pub enum Error {
    /// Tenancy rejection with code.
    #[error("[{code}] {message}")]
    Tenancy {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a tenancy error.
    pub fn tenancy(code: TenancyErrorCode, msg: impl Into<String>) -> Self {
        Self::Tenancy {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error came from the per-request cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Tenancy { http_status, .. } => *http_status,
            Self::Unauthenticated(_) => 401,
            Self::NotFound(_) => 404,
            // nginx's "client closed request"
            Self::Cancelled => 499,
            Self::ServiceUnavailable(_) => 503,
            Self::Internal(_) => 500,
        }
    }

    /// Get the stable error code reported to clients.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Tenancy { code, .. } => code,
            Self::Unauthenticated(_) => "Unauthenticated",
            Self::NotFound(_) => "NotFound",
            Self::Cancelled => "Cancelled",
            Self::ServiceUnavailable(_) => "ServiceUnavailable",
            Self::Internal(_) => "Internal",
        }
    }
}
