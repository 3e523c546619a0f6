//! In-process end-user and organization directory.
//!
//! Serves memberships and settings from memory when the host runs without
//! upstream services (`mock` URLs), and backs the test suites.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use host_core::{
    CallerContext, EndUserWithMemberships, EndUsersService, Error, IdentifierFactory, Membership,
    OrganizationsService, PrefixedIdentifierFactory, Result, TenantSettings,
};
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

const MEMBERSHIP_ID_PREFIX: &str = "mbr";

#[derive(Default)]
pub struct InMemoryDirectory {
    memberships: RwLock<HashMap<String, Vec<Membership>>>,
    settings: RwLock<HashMap<String, TenantSettings>>,
    membership_lookups: AtomicUsize,
    settings_lookups: AtomicUsize,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `user_id` a member of `organization_id`.
    pub fn add_membership(&self, user_id: &str, organization_id: &str, is_default: bool) {
        let membership = Membership {
            id: PrefixedIdentifierFactory.create(MEMBERSHIP_ID_PREFIX),
            user_id: user_id.to_string(),
            organization_id: organization_id.to_string(),
            is_default,
        };
        self.memberships
            .write()
            .entry(user_id.to_string())
            .or_default()
            .push(membership);
    }

    /// Register an organization with its settings, replacing any previous ones.
    pub fn set_settings(&self, organization_id: &str, settings: TenantSettings) {
        self.settings
            .write()
            .insert(organization_id.to_string(), settings);
    }

    /// Number of membership lookups served so far.
    pub fn membership_lookups(&self) -> usize {
        self.membership_lookups.load(Ordering::SeqCst)
    }

    /// Number of settings lookups served so far.
    pub fn settings_lookups(&self) -> usize {
        self.settings_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EndUsersService for InMemoryDirectory {
    async fn get_memberships(
        &self,
        _caller: &CallerContext,
        user_id: &str,
        cancellation: &CancellationToken,
    ) -> Result<EndUserWithMemberships> {
        self.membership_lookups.fetch_add(1, Ordering::SeqCst);
        if cancellation.is_cancelled() {
            return Err(Error::Cancelled);
        }

        // Unknown users simply have no memberships
        let memberships = self
            .memberships
            .read()
            .get(user_id)
            .cloned()
            .unwrap_or_default();

        Ok(EndUserWithMemberships {
            id: user_id.to_string(),
            memberships,
        })
    }
}

#[async_trait]
impl OrganizationsService for InMemoryDirectory {
    async fn get_settings(
        &self,
        _caller: &CallerContext,
        tenant_id: &str,
        cancellation: &CancellationToken,
    ) -> Result<TenantSettings> {
        self.settings_lookups.fetch_add(1, Ordering::SeqCst);
        if cancellation.is_cancelled() {
            return Err(Error::Cancelled);
        }

        self.settings
            .read()
            .get(tenant_id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("organization '{}'", tenant_id)))
    }
}
