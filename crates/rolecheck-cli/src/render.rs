//! Report output.

use std::io::{self, Write};

use rolecheck_core::{AssignmentKind, AssignmentRecord};

use crate::preview::{KindReport, MovePlan, MoveReport};

/// Print which scopes are about to be fetched.
///
/// # Errors
/// Returns any write error.
pub fn write_progress(out: &mut impl Write, plan: &MovePlan) -> io::Result<()> {
    for kind in &plan.kinds {
        for (role, scope) in plan.scopes() {
            writeln!(
                out,
                "Fetching {kind} assignments for the {} '{}'...",
                role.label(),
                scope.id()
            )?;
        }
    }
    Ok(())
}

/// Human-readable report.
///
/// # Errors
/// Returns any write error.
pub fn write_human(out: &mut impl Write, report: &MoveReport) -> io::Result<()> {
    writeln!(out, "Subscription: {}", report.subscription.id())?;
    writeln!(
        out,
        "Moving from management group '{}' to '{}'",
        report.current_management_group.id(),
        report.target_management_group.id()
    )?;

    for kind in &report.kinds {
        write_kind(out, kind)?;
    }
    Ok(())
}

fn write_kind(out: &mut impl Write, report: &KindReport) -> io::Result<()> {
    let kind = report.kind;
    let nouns = capitalized_plural(kind);

    writeln!(out, "\n=== {} Changes Preview ===", kind.title())?;

    if report.lost.is_empty() {
        writeln!(out, "\nNo {} will be lost.", kind.noun_plural())?;
    } else {
        writeln!(out, "\n{nouns} that will be LOST:")?;
        write_records(out, &report.lost)?;
    }

    if report.gained.is_empty() {
        writeln!(out, "\nNo new {} will be gained.", kind.noun_plural())?;
    } else {
        writeln!(out, "\n{nouns} that will be GAINED:")?;
        write_records(out, &report.gained)?;
    }

    if let Some(summary) = report.subscription {
        writeln!(
            out,
            "\n{} {kind} assignment(s) made directly on the subscription are kept ({} visible in total).",
            summary.direct, summary.visible
        )?;
    }

    for failure in &report.fetch_errors {
        writeln!(
            out,
            "\nWarning: could not fetch {kind} assignments for the {} '{}': {}",
            failure.role.label(),
            failure.scope.id(),
            failure.message
        )?;
    }
    if report.is_degraded() {
        writeln!(
            out,
            "Warning: the {kind} preview above treats unreadable scopes as empty and may be wrong."
        )?;
    }
    Ok(())
}

fn write_records(out: &mut impl Write, records: &[AssignmentRecord]) -> io::Result<()> {
    for record in records {
        match record.details().and_then(|d| d.display_name.as_deref()) {
            Some(name) => writeln!(out, "- {} ({name})", record.id())?,
            None => writeln!(out, "- {}", record.id())?,
        }
    }
    Ok(())
}

fn capitalized_plural(kind: AssignmentKind) -> String {
    let plural = kind.noun_plural();
    let mut chars = plural.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// JSON report, pretty printed, newline terminated.
///
/// # Errors
/// Returns an error if serialization or the write fails.
pub fn write_json(out: &mut impl Write, report: &MoveReport) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::{
        FetchFailure, FetchFailurePolicy, REPORT_SCHEMA_VERSION, ScopeRole, SubscriptionSummary,
    };
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use rolecheck_core::{AssignmentDetails, ScopeIdentifier};

    fn report(kinds: Vec<KindReport>) -> MoveReport {
        MoveReport {
            schema_version: REPORT_SCHEMA_VERSION,
            generated_at: Utc::now(),
            subscription: ScopeIdentifier::subscription("sub-1").unwrap(),
            current_management_group: ScopeIdentifier::management_group("mg-a").unwrap(),
            target_management_group: ScopeIdentifier::management_group("mg-b").unwrap(),
            on_fetch_error: FetchFailurePolicy::Degrade,
            kinds,
        }
    }

    fn kind(kind: AssignmentKind, lost: &[&str], gained: &[&str]) -> KindReport {
        KindReport {
            kind,
            lost: lost.iter().map(|id| AssignmentRecord::new(*id)).collect(),
            gained: gained.iter().map(|id| AssignmentRecord::new(*id)).collect(),
            subscription: None,
            fetch_errors: Vec::new(),
        }
    }

    fn human(report: &MoveReport) -> String {
        let mut out = Vec::new();
        write_human(&mut out, report).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn renders_lost_and_gained_roles() {
        let text = human(&report(vec![kind(AssignmentKind::Role, &["Reader"], &["Owner"])]));
        assert_eq!(
            text,
            "Subscription: sub-1\n\
             Moving from management group 'mg-a' to 'mg-b'\n\
             \n=== Role Changes Preview ===\n\
             \nRoles that will be LOST:\n\
             - Reader\n\
             \nRoles that will be GAINED:\n\
             - Owner\n"
        );
    }

    #[test]
    fn renders_none_messages() {
        let text = human(&report(vec![
            kind(AssignmentKind::Role, &[], &[]),
            kind(AssignmentKind::Policy, &[], &[]),
        ]));
        assert!(text.contains("No roles will be lost."));
        assert!(text.contains("No new roles will be gained."));
        assert!(text.contains("=== Policy Changes Preview ==="));
        assert!(text.contains("No policies will be lost."));
        assert!(text.contains("No new policies will be gained."));
    }

    #[test]
    fn renders_policy_display_names() {
        let mut policies = kind(AssignmentKind::Policy, &[], &[]);
        policies.gained = vec![AssignmentRecord::new("/policyDefinitions/p1").with_details(
            AssignmentDetails {
                display_name: Some("Allowed locations".into()),
                ..AssignmentDetails::default()
            },
        )];
        let text = human(&report(vec![policies]));
        assert!(text.contains("Policies that will be GAINED:\n- /policyDefinitions/p1 (Allowed locations)\n"));
    }

    #[test]
    fn renders_fetch_warnings_and_summary() {
        let mut roles = kind(AssignmentKind::Role, &["Reader"], &[]);
        roles.subscription = Some(SubscriptionSummary {
            visible: 5,
            direct: 2,
        });
        roles.fetch_errors.push(FetchFailure {
            role: ScopeRole::TargetManagementGroup,
            scope: ScopeIdentifier::management_group("mg-b").unwrap(),
            message: "ARM API error 403 (AuthorizationFailed): denied".into(),
        });

        let text = human(&report(vec![roles]));
        assert!(text.contains(
            "2 role assignment(s) made directly on the subscription are kept (5 visible in total)."
        ));
        assert!(text.contains(
            "Warning: could not fetch role assignments for the target management group 'mg-b': ARM API error 403"
        ));
        assert!(text.contains("may be wrong"));
    }

    #[test]
    fn progress_lists_every_fetch() {
        let plan = MovePlan {
            subscription: ScopeIdentifier::subscription("sub-1").unwrap(),
            current: ScopeIdentifier::management_group("mg-a").unwrap(),
            target: ScopeIdentifier::management_group("mg-b").unwrap(),
            kinds: vec![AssignmentKind::Role],
            on_fetch_error: FetchFailurePolicy::Degrade,
        };
        let mut out = Vec::new();
        write_progress(&mut out, &plan).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("Fetching role assignments for the subscription 'sub-1'..."));
    }

    #[test]
    fn json_report_shape() {
        let mut out = Vec::new();
        write_json(
            &mut out,
            &report(vec![kind(AssignmentKind::Role, &["Reader"], &[])]),
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["schema_version"], REPORT_SCHEMA_VERSION);
        assert_eq!(value["subscription"]["kind"], "subscription");
        assert_eq!(value["subscription"]["id"], "sub-1");
        assert_eq!(value["on_fetch_error"], "degrade");
        assert_eq!(value["kinds"][0]["kind"], "role");
        assert_eq!(value["kinds"][0]["lost"][0]["id"], "Reader");
        assert_eq!(value["kinds"][0]["gained"], serde_json::json!([]));
        assert!(value["kinds"][0]["subscription"].is_null());
    }
}
