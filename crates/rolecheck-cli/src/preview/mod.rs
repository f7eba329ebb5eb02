//! Move preview: fetch every scope concurrently, then diff per kind.
//!
//! For each selected kind the subscription, the current management group and
//! the target management group are listed at the same time. A failed fetch is
//! either turned into an empty snapshot and reported next to the diff it may
//! skew ([`FetchFailurePolicy::Degrade`]) or ends the run
//! ([`FetchFailurePolicy::Abort`]).

pub mod types;

use anyhow::{Result, bail};
use chrono::Utc;
use clap::ValueEnum;
use futures_util::future::join_all;
use rolecheck_arm::AssignmentSource;
use rolecheck_core::{AssignmentKind, InheritanceDiff, ScopeIdentifier, ScopeSnapshot};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use types::{
    FetchFailure, KindReport, MoveReport, REPORT_SCHEMA_VERSION, ScopeRole, SubscriptionSummary,
};

/// How a failed scope fetch is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FetchFailurePolicy {
    /// Treat the scope as empty and report the error alongside the diff.
    #[default]
    Degrade,
    /// Stop at the first failure.
    Abort,
}

/// What to compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    /// Subscription being moved.
    pub subscription: ScopeIdentifier,
    /// Management group it is in now.
    pub current: ScopeIdentifier,
    /// Management group it would move to.
    pub target: ScopeIdentifier,
    /// Kinds to compare, in report order.
    pub kinds: Vec<AssignmentKind>,
    /// Failure handling.
    pub on_fetch_error: FetchFailurePolicy,
}

impl MovePlan {
    /// Every scope that gets listed, with its side of the move.
    #[must_use]
    pub fn scopes(&self) -> [(ScopeRole, &ScopeIdentifier); 3] {
        [
            (ScopeRole::Subscription, &self.subscription),
            (ScopeRole::CurrentManagementGroup, &self.current),
            (ScopeRole::TargetManagementGroup, &self.target),
        ]
    }
}

/// Outcome of listing one scope for one kind.
#[derive(Debug, Clone)]
pub struct ScopeFetch {
    /// Side of the move.
    pub role: ScopeRole,
    /// Scope that was listed.
    pub scope: ScopeIdentifier,
    /// Kind that was listed.
    pub kind: AssignmentKind,
    /// Records; empty when the fetch failed.
    pub snapshot: ScopeSnapshot,
    /// Error message when the fetch failed.
    pub error: Option<String>,
}

/// Fetch every scope and build the report.
///
/// # Errors
/// Returns an error if a fetch fails under [`FetchFailurePolicy::Abort`].
pub async fn preview<S>(source: &S, plan: &MovePlan) -> Result<MoveReport>
where
    S: AssignmentSource + ?Sized,
{
    let fetches = fetch_all(source, plan).await;
    build_report(plan, &fetches)
}

/// List every (scope, kind) pair of the plan concurrently.
pub async fn fetch_all<S>(source: &S, plan: &MovePlan) -> Vec<ScopeFetch>
where
    S: AssignmentSource + ?Sized,
{
    // Scope-major so an aborted run reports the first failure in (scope, kind) order.
    let requests: Vec<(ScopeRole, ScopeIdentifier, AssignmentKind)> = plan
        .scopes()
        .into_iter()
        .flat_map(|(role, scope)| {
            plan.kinds
                .iter()
                .map(move |&kind| (role, scope.clone(), kind))
        })
        .collect();

    join_all(requests.into_iter().map(|(role, scope, kind)| async move {
        match source.list_assignments(&scope, kind).await {
            Ok(snapshot) => {
                debug!(%scope, %kind, records = snapshot.len(), "Fetched scope");
                ScopeFetch {
                    role,
                    scope,
                    kind,
                    snapshot,
                    error: None,
                }
            }
            Err(err) => {
                warn!(
                    %scope,
                    %kind,
                    error = %err,
                    auth_failure = err.is_auth_failure(),
                    "Failed to fetch assignments"
                );
                ScopeFetch {
                    role,
                    scope,
                    kind,
                    snapshot: ScopeSnapshot::empty(),
                    error: Some(err.to_string()),
                }
            }
        }
    }))
    .await
}

/// Turn fetch results into a report.
///
/// # Errors
/// Returns an error naming the first failed fetch under
/// [`FetchFailurePolicy::Abort`].
pub fn build_report(plan: &MovePlan, fetches: &[ScopeFetch]) -> Result<MoveReport> {
    if plan.on_fetch_error == FetchFailurePolicy::Abort {
        if let Some(failed) = fetches.iter().find(|fetch| fetch.error.is_some()) {
            bail!(
                "Failed to fetch {} assignments for the {} {}: {}",
                failed.kind,
                failed.role.label(),
                failed.scope,
                failed.error.as_deref().unwrap_or_default()
            );
        }
    }

    let kinds = plan
        .kinds
        .iter()
        .map(|&kind| kind_report(plan, kind, fetches))
        .collect();

    Ok(MoveReport {
        schema_version: REPORT_SCHEMA_VERSION,
        generated_at: Utc::now(),
        subscription: plan.subscription.clone(),
        current_management_group: plan.current.clone(),
        target_management_group: plan.target.clone(),
        on_fetch_error: plan.on_fetch_error,
        kinds,
    })
}

fn kind_report(plan: &MovePlan, kind: AssignmentKind, fetches: &[ScopeFetch]) -> KindReport {
    let find = |role: ScopeRole| {
        fetches
            .iter()
            .find(|fetch| fetch.kind == kind && fetch.role == role)
    };
    let empty = ScopeSnapshot::empty();
    let snapshot = |role: ScopeRole| find(role).map_or(&empty, |fetch| &fetch.snapshot);

    let diff = InheritanceDiff::compute(
        kind,
        snapshot(ScopeRole::CurrentManagementGroup),
        snapshot(ScopeRole::TargetManagementGroup),
    );

    let subscription = find(ScopeRole::Subscription)
        .filter(|fetch| fetch.error.is_none())
        .map(|fetch| summarize_subscription(&fetch.snapshot, &plan.subscription));

    let fetch_errors = plan
        .scopes()
        .into_iter()
        .filter_map(|(role, _)| find(role))
        .filter_map(|fetch| {
            fetch.error.as_ref().map(|message| FetchFailure {
                role: fetch.role,
                scope: fetch.scope.clone(),
                message: message.clone(),
            })
        })
        .collect();

    KindReport {
        kind,
        lost: diff.result.lost,
        gained: diff.result.gained,
        subscription,
        fetch_errors,
    }
}

/// Count what is visible at the subscription and what was assigned on it directly.
#[must_use]
pub fn summarize_subscription(
    snapshot: &ScopeSnapshot,
    subscription: &ScopeIdentifier,
) -> SubscriptionSummary {
    let path = subscription.path();
    let direct = snapshot
        .records()
        .iter()
        .filter(|record| {
            record
                .details()
                .and_then(|details| details.scope.as_deref())
                .is_some_and(|scope| scope.trim_end_matches('/').eq_ignore_ascii_case(&path))
        })
        .count();

    SubscriptionSummary {
        visible: snapshot.len(),
        direct,
    }
}
