//! Rolecheck ARM - assignment fetcher for Azure Resource Manager
//!
//! Lists role and policy assignments visible at a subscription or management
//! group scope and turns them into [`ScopeSnapshot`]s for the diff engine.
//!
//! Only assignments at or above the scope are returned (`$filter=atScope()`),
//! which is exactly the set a child of that scope inherits. Every page is
//! drained before a snapshot is returned.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod client;
mod config;
mod error;
mod types;

pub use client::ArmClient;
pub use config::ArmConfig;
pub use error::{ArmError, ArmResult};
pub use types::{
    ArmErrorBody, ArmErrorDetail, Page, PolicyAssignment, PolicyAssignmentProperties,
    RoleAssignment, RoleAssignmentProperties, Subscription,
};

use async_trait::async_trait;
use rolecheck_core::{AssignmentKind, ScopeIdentifier, ScopeSnapshot};

/// Source of assignment snapshots.
///
/// Implemented by [`ArmClient`]; tests and callers can substitute their own.
#[async_trait]
pub trait AssignmentSource: Send + Sync {
    /// List every assignment of `kind` a child of `scope` inherits.
    async fn list_assignments(
        &self,
        scope: &ScopeIdentifier,
        kind: AssignmentKind,
    ) -> ArmResult<ScopeSnapshot>;

    /// Resolve the subscription to use when none was given.
    async fn default_subscription(&self) -> ArmResult<String>;

    /// Like [`list_assignments`](Self::list_assignments), for a scope path.
    ///
    /// Fails with `ArmError::InvalidScope` before any request is made if the
    /// path is neither a subscription nor a management group.
    async fn list_assignments_at(
        &self,
        scope: &str,
        kind: AssignmentKind,
    ) -> ArmResult<ScopeSnapshot> {
        let scope: ScopeIdentifier = scope.parse()?;
        self.list_assignments(&scope, kind).await
    }
}
