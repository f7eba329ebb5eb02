//! Rolecheck Core - inheritance diff for role and policy assignments
//!
//! This crate holds the source-agnostic part of rolecheck:
//!
//! - **Assignments**: [`AssignmentRecord`] and [`ScopeSnapshot`], compared by
//!   identifier only
//! - **Scopes**: [`ScopeIdentifier`], the tagged subscription / management group
//!   form resolved once at the API boundary
//! - **Diff**: [`diff`] computes what a subscription would lose and gain when it
//!   moves from one management group to another
//!
//! # Quick Start
//!
//! ```rust
//! use rolecheck_core::{ScopeSnapshot, diff};
//!
//! let current = ScopeSnapshot::from_ids(["Reader", "Contributor"]);
//! let target = ScopeSnapshot::from_ids(["Contributor", "Owner"]);
//!
//! let result = diff(&current, &target);
//! assert_eq!(result.lost_ids(), vec!["Reader"]);
//! assert_eq!(result.gained_ids(), vec!["Owner"]);
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod assignment;
mod diff;
mod error;
mod scope;

pub use assignment::*;
pub use diff::*;
pub use error::*;
pub use scope::*;

/// Assignment kinds that can be compared.
///
/// Identifiers of different kinds are never compared against each other.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentKind {
    /// Role assignments (principal bound to a role definition).
    Role,
    /// Policy assignments (policy definition bound to a scope).
    Policy,
}

impl AssignmentKind {
    /// All kinds, in report order.
    pub const ALL: [Self; 2] = [Self::Role, Self::Policy];

    /// Plural noun used in report headings.
    #[must_use]
    pub const fn noun_plural(self) -> &'static str {
        match self {
            Self::Role => "roles",
            Self::Policy => "policies",
        }
    }

    /// Capitalized singular noun used in report titles.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Role => "Role",
            Self::Policy => "Policy",
        }
    }
}

impl std::fmt::Display for AssignmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Role => write!(f, "role"),
            Self::Policy => write!(f, "policy"),
        }
    }
}

impl std::str::FromStr for AssignmentKind {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "role" | "roles" => Ok(Self::Role),
            "policy" | "policies" => Ok(Self::Policy),
            other => Err(ScopeError::UnknownKind(other.to_string())),
        }
    }
}
