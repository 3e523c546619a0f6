//! Identifier and request limits.
//!
//! Limits are checked before any regex matching or collaborator call, so an
//! oversized value never reaches the membership or settings services.

// === Identifier Limits ===

/// Maximum tenant id length accepted from a request (chars).
pub const MAX_TENANT_ID_LEN: usize = 100;

/// Identifier format: `<prefix>_<token>`.
///
/// Prefix is 2-12 lowercase letters naming the aggregate (e.g. `org`, `user`),
/// token is 10-64 alphanumerics.
pub const IDENTIFIER_PATTERN: &str = r"^[a-z]{2,12}_[A-Za-z0-9]{10,64}$";

/// Prefix used when minting organization identifiers.
pub const ORGANIZATION_ID_PREFIX: &str = "org";

// === Request Limits ===

/// Crash report message max length (chars).
pub const MAX_CRASH_MESSAGE_LEN: usize = 2000;
