//! Report types for the move preview.

use chrono::{DateTime, Utc};
use rolecheck_core::{AssignmentKind, AssignmentRecord, ScopeIdentifier};
use serde::Serialize;

use super::FetchFailurePolicy;

/// Version of the JSON report layout.
pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Which side of the move a scope stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeRole {
    /// The subscription being moved.
    Subscription,
    /// Its management group today.
    CurrentManagementGroup,
    /// The management group it would move to.
    TargetManagementGroup,
}

impl ScopeRole {
    /// Human label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Subscription => "subscription",
            Self::CurrentManagementGroup => "current management group",
            Self::TargetManagementGroup => "target management group",
        }
    }
}

/// A scope fetch that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    /// Side of the move.
    pub role: ScopeRole,
    /// Scope that could not be listed.
    pub scope: ScopeIdentifier,
    /// Error message.
    pub message: String,
}

/// Assignments on the subscription itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubscriptionSummary {
    /// Everything visible at the subscription, inherited or not.
    pub visible: usize,
    /// Assignments made directly on the subscription; a move keeps these.
    pub direct: usize,
}

/// Preview for one assignment kind.
#[derive(Debug, Clone, Serialize)]
pub struct KindReport {
    /// Assignment kind.
    pub kind: AssignmentKind,
    /// Inherited today, not inherited after the move. Sorted by id.
    pub lost: Vec<AssignmentRecord>,
    /// Inherited after the move, not inherited today. Sorted by id.
    pub gained: Vec<AssignmentRecord>,
    /// Subscription counts; `None` when the subscription could not be listed.
    pub subscription: Option<SubscriptionSummary>,
    /// Fetches that failed; lost/gained may be skewed when non-empty.
    pub fetch_errors: Vec<FetchFailure>,
}

impl KindReport {
    /// True when any fetch for this kind failed.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.fetch_errors.is_empty()
    }
}

/// Full preview of a subscription move.
#[derive(Debug, Clone, Serialize)]
pub struct MoveReport {
    /// Layout version.
    pub schema_version: u32,
    /// When the report was built.
    pub generated_at: DateTime<Utc>,
    /// Subscription being moved.
    pub subscription: ScopeIdentifier,
    /// Management group it is in now.
    pub current_management_group: ScopeIdentifier,
    /// Management group it would move to.
    pub target_management_group: ScopeIdentifier,
    /// Failure policy the report was built under.
    pub on_fetch_error: FetchFailurePolicy,
    /// One entry per compared kind, in report order.
    pub kinds: Vec<KindReport>,
}

impl MoveReport {
    /// True when any fetch failed.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.kinds.iter().any(KindReport::is_degraded)
    }
}
