//! Request pipeline middleware.
//!
//! Order for a matched operation: cancellation, authentication, access,
//! multi-tenancy, then the handler.

pub mod access;
pub mod auth;
pub mod cancellation;
pub mod tenancy;

pub use access::authorize;
pub use auth::{authenticate, ExtensionCallerContextFactory};
pub use cancellation::request_cancellation;
pub use tenancy::{multi_tenancy, TenancyOutcome, TenancyRejection, TenancyResolver};
