//! Caller identity for a single request.

use http::request::Parts;

/// The caller issuing a request.
///
/// Created once per request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CallerContext {
    #[default]
    Anonymous,
    Authenticated {
        caller_id: String,
    },
}

impl CallerContext {
    pub fn authenticated(caller_id: impl Into<String>) -> Self {
        Self::Authenticated {
            caller_id: caller_id.into(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// Present only for authenticated callers.
    pub fn caller_id(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { caller_id } => Some(caller_id),
        }
    }
}

/// Produces the caller for an inbound request.
pub trait CallerContextFactory: Send + Sync {
    fn create(&self, parts: &Parts) -> CallerContext;
}
