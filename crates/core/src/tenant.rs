//! Tenant, membership, and request-scoped tenancy types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use crate::error::{Error, Result};

/// Association between a user and an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub id: String,
    pub user_id: String,
    pub organization_id: String,
    /// Marks the user's fallback organization
    #[serde(default)]
    pub is_default: bool,
}

/// An end user and all of their memberships.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndUserWithMemberships {
    pub id: String,
    #[serde(default)]
    pub memberships: Vec<Membership>,
}

impl EndUserWithMemberships {
    /// Returns the membership for `organization_id`, if the user holds one.
    pub fn membership_of(&self, organization_id: &str) -> Option<&Membership> {
        self.memberships
            .iter()
            .find(|membership| membership.organization_id == organization_id)
    }

    /// All memberships flagged as default.
    ///
    /// More than one is possible; nothing upstream prevents it.
    pub fn default_memberships(&self) -> Vec<&Membership> {
        self.memberships
            .iter()
            .filter(|membership| membership.is_default)
            .collect()
    }
}

/// A single tenant setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantSetting {
    pub value: String,
    #[serde(default)]
    pub is_encrypted: bool,
}

/// Configuration scoped to one tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantSettings(BTreeMap<String, TenantSetting>);

impl TenantSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, TenantSetting { value: value.into(), is_encrypted: false });
        self
    }

    pub fn with_encrypted(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, TenantSetting { value: value.into(), is_encrypted: true });
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, setting: TenantSetting) {
        self.0.insert(name.into(), setting);
    }

    pub fn get(&self, name: &str) -> Option<&TenantSetting> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TenantSetting)> {
        self.0.iter()
    }
}

/// Outcome of inspecting a request for tenancy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantDetectionResult {
    /// Whether the bound request contract needs a tenant
    pub is_tenant_required: bool,
    /// Tenant id supplied by the caller
    pub tenant_id: Option<String>,
}

impl TenantDetectionResult {
    pub fn new(is_tenant_required: bool, tenant_id: Option<String>) -> Self {
        Self {
            is_tenant_required,
            tenant_id,
        }
    }

    /// Nothing required, nothing supplied.
    pub fn none() -> Self {
        Self::default()
    }
}

/// A tenant id together with its hydrated settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTenancy {
    pub tenant_id: String,
    pub settings: TenantSettings,
}

/// Request-scoped tenancy slot.
///
/// Clones share the slot. Written at most once per request.
#[derive(Debug, Clone, Default)]
pub struct TenancyContext {
    slot: Arc<OnceLock<ResolvedTenancy>>,
}

impl TenancyContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, tenant_id: impl Into<String>, settings: TenantSettings) -> Result<()> {
        self.slot
            .set(ResolvedTenancy {
                tenant_id: tenant_id.into(),
                settings,
            })
            .map_err(|rejected| {
                Error::internal(format!(
                    "tenancy already set to '{}', refusing '{}'",
                    self.tenant_id().unwrap_or_default(),
                    rejected.tenant_id
                ))
            })
    }

    pub fn get(&self) -> Option<&ResolvedTenancy> {
        self.slot.get()
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.get().map(|tenancy| tenancy.tenant_id.as_str())
    }

    pub fn is_set(&self) -> bool {
        self.slot.get().is_some()
    }
}
