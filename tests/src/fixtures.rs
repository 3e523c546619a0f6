//! Test identities and a seeded directory.

use std::sync::Arc;

use api::InMemoryDirectory;
use host_core::TenantSettings;

/// Caller with one plain and one default membership.
pub const CALLER_ID: &str = "user_acallerid00";

/// Caller with memberships but no default.
pub const NO_DEFAULT_CALLER_ID: &str = "user_nodefault000";

/// Caller with two default memberships.
pub const AMBIGUOUS_CALLER_ID: &str = "user_ambiguous000";

/// Organization `CALLER_ID` is a plain member of.
pub const TENANT_ID: &str = "org_atenantid00";

/// Default organization of `CALLER_ID`.
pub const DEFAULT_TENANT_ID: &str = "org_adefaulttenant";

/// Organization nobody above belongs to.
pub const FOREIGN_TENANT_ID: &str = "org_aforeigntenant";

/// Well-formed but unregistered.
pub const UNKNOWN_TENANT_ID: &str = "org_unknowntenant";

/// Fails the identifier format.
pub const INVALID_TENANT_ID: &str = "not-a-tenant";

/// `Authorization` value for a caller. Mock introspection trusts the token as
/// the caller id.
pub fn bearer(caller_id: &str) -> String {
    format!("Bearer {}", caller_id)
}

/// Directory with the organizations and memberships above.
pub fn seeded_directory() -> Arc<InMemoryDirectory> {
    let directory = InMemoryDirectory::new();

    directory.set_settings(
        TENANT_ID,
        TenantSettings::new()
            .with("region", "eu-west")
            .with_encrypted("apikey", "ciphertext"),
    );
    directory.set_settings(DEFAULT_TENANT_ID, TenantSettings::new().with("region", "us-east"));
    directory.set_settings(FOREIGN_TENANT_ID, TenantSettings::new());

    directory.add_membership(CALLER_ID, TENANT_ID, false);
    directory.add_membership(CALLER_ID, DEFAULT_TENANT_ID, true);

    directory.add_membership(NO_DEFAULT_CALLER_ID, TENANT_ID, false);

    directory.add_membership(AMBIGUOUS_CALLER_ID, TENANT_ID, true);
    directory.add_membership(AMBIGUOUS_CALLER_ID, DEFAULT_TENANT_ID, true);

    Arc::new(directory)
}
