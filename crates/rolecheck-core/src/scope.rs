//! Scope identifiers.
//!
//! The management API names scopes by path. Only two forms are supported, and
//! they are resolved once at the boundary into [`ScopeIdentifier`] so nothing
//! downstream branches on string prefixes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ScopeError, ScopeResult};

/// Path prefix of a subscription scope.
pub const SUBSCRIPTION_PREFIX: &str = "/subscriptions/";

/// Path prefix of a management group scope.
pub const MANAGEMENT_GROUP_PREFIX: &str = "/providers/Microsoft.Management/managementGroups/";

/// A resolved scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ScopeIdentifier {
    /// A subscription, by subscription id.
    Subscription(String),
    /// A management group, by group name.
    ManagementGroup(String),
}

impl ScopeIdentifier {
    /// Build a subscription scope from a bare subscription id.
    ///
    /// # Errors
    /// Returns `ScopeError::InvalidId` if the id is empty or contains `/`.
    pub fn subscription(id: impl Into<String>) -> ScopeResult<Self> {
        validate_bare_id("subscription", id.into()).map(Self::Subscription)
    }

    /// Build a management group scope from a bare group name.
    ///
    /// # Errors
    /// Returns `ScopeError::InvalidId` if the id is empty or contains `/`.
    pub fn management_group(id: impl Into<String>) -> ScopeResult<Self> {
        validate_bare_id("management group", id.into()).map(Self::ManagementGroup)
    }

    /// The bare id without the path prefix.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Subscription(id) | Self::ManagementGroup(id) => id,
        }
    }

    /// Human label for the scope kind.
    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::Subscription(_) => "subscription",
            Self::ManagementGroup(_) => "management group",
        }
    }

    /// The canonical resource path, e.g. `/subscriptions/{id}`.
    #[must_use]
    pub fn path(&self) -> String {
        self.to_string()
    }
}

fn validate_bare_id(kind: &'static str, id: String) -> ScopeResult<String> {
    let trimmed = id.trim();
    if trimmed.is_empty() || trimmed.contains('/') {
        return Err(ScopeError::InvalidId { kind, id });
    }
    Ok(trimmed.to_string())
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &value[prefix.len()..])
}

impl FromStr for ScopeIdentifier {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let path = trimmed.strip_suffix('/').unwrap_or(trimmed);
        let invalid = || ScopeError::InvalidScope(s.to_string());

        if let Some(rest) = strip_prefix_ignore_case(path, SUBSCRIPTION_PREFIX) {
            return Self::subscription(rest).map_err(|_| invalid());
        }
        if let Some(rest) = strip_prefix_ignore_case(path, MANAGEMENT_GROUP_PREFIX) {
            return Self::management_group(rest).map_err(|_| invalid());
        }
        Err(invalid())
    }
}

impl fmt::Display for ScopeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subscription(id) => write!(f, "{SUBSCRIPTION_PREFIX}{id}"),
            Self::ManagementGroup(id) => write!(f, "{MANAGEMENT_GROUP_PREFIX}{id}"),
        }
    }
}
