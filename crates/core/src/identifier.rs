//! Identifier format validation and minting.

use regex::Regex;
use std::sync::LazyLock;
use uuid::Uuid;

use crate::limits::{IDENTIFIER_PATTERN, MAX_TENANT_ID_LEN};

/// Compiled identifier regex (lazy initialization).
static IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(IDENTIFIER_PATTERN).expect("invalid identifier pattern"));

/// Validates and creates identifiers.
pub trait IdentifierFactory: Send + Sync {
    /// Whether `candidate` is a well-formed identifier.
    fn is_valid(&self, candidate: &str) -> bool;

    /// Mint a new identifier with the given prefix.
    fn create(&self, prefix: &str) -> String;
}

/// `<prefix>_<token>` identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixedIdentifierFactory;

impl PrefixedIdentifierFactory {
    pub fn new() -> Self {
        Self
    }
}

impl IdentifierFactory for PrefixedIdentifierFactory {
    fn is_valid(&self, candidate: &str) -> bool {
        if candidate.is_empty() || candidate.len() > MAX_TENANT_ID_LEN {
            return false;
        }

        IDENTIFIER_REGEX.is_match(candidate)
    }

    fn create(&self, prefix: &str) -> String {
        format!("{}_{}", prefix, Uuid::new_v4().simple())
    }
}
