//! Common test setup functions.

use std::sync::Arc;

use api::{router, AppState, AuthClient, InMemoryDirectory};
use axum::Router;
use axum_test::TestServer;
use host_core::{EndUsersService, OrganizationsService};

use crate::fixtures::seeded_directory;

/// The real router over the seeded in-memory directory.
///
/// Uses mock token introspection, so `Bearer <caller id>` authenticates as
/// that caller.
pub struct TestContext {
    pub directory: Arc<InMemoryDirectory>,
    pub router: Router,
}

impl TestContext {
    pub fn new() -> Self {
        let directory = seeded_directory();
        let router = build_router(directory.clone(), directory.clone());
        Self { directory, router }
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router.clone()).expect("Failed to create test server")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// The real router over arbitrary collaborators.
pub fn build_router(
    end_users: Arc<dyn EndUsersService>,
    organizations: Arc<dyn OrganizationsService>,
) -> Router {
    let state = AppState::new(end_users, organizations, AuthClient::mock());
    router(state).expect("Failed to register operations")
}
