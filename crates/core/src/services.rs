//! External collaborators consulted during tenancy resolution.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::caller::CallerContext;
use crate::error::Result;
use crate::tenant::{EndUserWithMemberships, TenantSettings};

/// Looks up end users and their organization memberships.
#[async_trait]
pub trait EndUsersService: Send + Sync {
    /// Fetch the memberships of `user_id`.
    ///
    /// Returns [`crate::Error::Cancelled`] if `cancellation` fires first.
    async fn get_memberships(
        &self,
        caller: &CallerContext,
        user_id: &str,
        cancellation: &CancellationToken,
    ) -> Result<EndUserWithMemberships>;
}

/// Looks up organization (tenant) configuration.
#[async_trait]
pub trait OrganizationsService: Send + Sync {
    /// Fetch the settings of `tenant_id`.
    ///
    /// Returns [`crate::Error::Cancelled`] if `cancellation` fires first.
    async fn get_settings(
        &self,
        caller: &CallerContext,
        tenant_id: &str,
        cancellation: &CancellationToken,
    ) -> Result<TenantSettings>;
}
