//! HTTP layer of the tenancy host.
//!
//! Exposes the router, the middleware pipeline that resolves callers and
//! tenancy, and the HTTP clients for the end-users and organizations services.

pub mod clients;
pub mod detector;
pub mod directory;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;

pub use clients::{HttpEndUsersService, HttpOrganizationsService};
pub use detector::{RequestTenantDetective, RouteValues, TenantDetective};
pub use directory::InMemoryDirectory;
pub use response::{ApiError, ProblemDetails, PROBLEM_CONTENT_TYPE};
pub use routes::router;
pub use state::{AppState, AuthClient};
