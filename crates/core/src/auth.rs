//! Bearer token extraction and the identity service introspection contract.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const BEARER_PREFIX: &str = "Bearer ";

/// Extract a bearer token from the `Authorization` header.
///
/// No header means an anonymous caller (`Ok(None)`). A header with another
/// scheme or an empty token is rejected.
pub fn extract_bearer_token(auth_header: Option<&str>) -> Result<Option<&str>> {
    let Some(auth) = auth_header else {
        return Ok(None);
    };

    let token = auth
        .strip_prefix(BEARER_PREFIX)
        .ok_or_else(|| Error::unauthenticated("Authorization header must use the Bearer scheme"))?
        .trim();

    if token.is_empty() {
        return Err(Error::unauthenticated("Bearer token is empty"));
    }

    Ok(Some(token))
}

/// Request to the identity service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntrospectionRequest {
    pub token: String,
}

impl IntrospectionRequest {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
        }
    }
}

/// Identity service verdict on a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntrospectionResponse {
    /// Whether the token is currently valid.
    pub active: bool,
    /// Caller id the token was issued to.
    pub sub: Option<String>,
}

impl IntrospectionResponse {
    pub fn active(sub: impl Into<String>) -> Self {
        Self {
            active: true,
            sub: Some(sub.into()),
        }
    }

    pub fn inactive() -> Self {
        Self {
            active: false,
            sub: None,
        }
    }

    /// The caller id of an active token.
    pub fn caller_id(&self) -> Result<&str> {
        if !self.active {
            return Err(Error::unauthenticated("Token is invalid or expired"));
        }

        self.sub
            .as_deref()
            .filter(|sub| !sub.is_empty())
            .ok_or_else(|| Error::unauthenticated("Token has no subject"))
    }
}
