//! User-visible messages for tenancy problems.

/// The route needs a tenant and none was supplied or defaulted.
pub const MISSING_TENANT_ID: &str =
    "The request requires a tenant ID, but none was provided and the caller has no default organization";

/// The supplied tenant id is not a well-formed identifier.
pub const INVALID_TENANT_ID: &str = "The tenant ID is not a valid identifier";

/// `{0}` is replaced with the offending tenant id.
pub const USER_NOT_A_MEMBER: &str = "The caller is not a member of the organization '{0}'";

/// Replace positional `{n}` placeholders with `args[n]`.
pub fn format(template: &str, args: &[&str]) -> String {
    args.iter()
        .enumerate()
        .fold(template.to_string(), |message, (index, arg)| {
            message.replace(&format!("{{{index}}}"), arg)
        })
}
