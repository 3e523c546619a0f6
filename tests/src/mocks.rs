//! Collaborators that fail on purpose.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use host_core::{
    CallerContext, EndUserWithMemberships, EndUsersService, Error, OrganizationsService, Result,
    TenantSettings,
};
use tokio_util::sync::CancellationToken;

/// Every lookup fails as if the upstream service were down.
#[derive(Default)]
pub struct UnavailableDirectory {
    calls: AtomicUsize,
}

impl UnavailableDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EndUsersService for UnavailableDirectory {
    async fn get_memberships(
        &self,
        _caller: &CallerContext,
        _user_id: &str,
        _cancellation: &CancellationToken,
    ) -> Result<EndUserWithMemberships> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::service_unavailable("end-users: connection refused"))
    }
}

#[async_trait]
impl OrganizationsService for UnavailableDirectory {
    async fn get_settings(
        &self,
        _caller: &CallerContext,
        _tenant_id: &str,
        _cancellation: &CancellationToken,
    ) -> Result<TenantSettings> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::service_unavailable("organizations: connection refused"))
    }
}
