//! Inheritance diff engine.
//!
//! Given the assignments a child inherits under its current parent and under
//! a target parent, report what a move from one to the other would lose and
//! gain. Pure set arithmetic on identifiers: no I/O, no validation of the
//! identifier scheme (callers never mix role and policy identifiers).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{AssignmentKind, AssignmentRecord, ScopeSnapshot};

/// Assignments lost and gained by a move.
///
/// Both lists are deduplicated and sorted by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    /// Present under the current scope, absent under the target.
    pub lost: Vec<AssignmentRecord>,
    /// Present under the target scope, absent under the current.
    pub gained: Vec<AssignmentRecord>,
}

impl DiffResult {
    /// True when the move changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lost.is_empty() && self.gained.is_empty()
    }

    /// Identifiers of lost assignments.
    #[must_use]
    pub fn lost_ids(&self) -> Vec<&str> {
        self.lost.iter().map(AssignmentRecord::id).collect()
    }

    /// Identifiers of gained assignments.
    #[must_use]
    pub fn gained_ids(&self) -> Vec<&str> {
        self.gained.iter().map(AssignmentRecord::id).collect()
    }
}

/// A diff tagged with the assignment kind it was computed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InheritanceDiff {
    /// Which kind of assignment was compared.
    pub kind: AssignmentKind,
    /// The comparison result.
    #[serde(flatten)]
    pub result: DiffResult,
}

impl InheritanceDiff {
    /// Compare two snapshots of the same kind.
    #[must_use]
    pub fn compute(kind: AssignmentKind, current: &ScopeSnapshot, target: &ScopeSnapshot) -> Self {
        Self {
            kind,
            result: diff(current, target),
        }
    }
}

/// Compute `lost = current - target` and `gained = target - current`.
#[must_use]
pub fn diff(current: &ScopeSnapshot, target: &ScopeSnapshot) -> DiffResult {
    let current = index(current);
    let target = index(target);

    DiffResult {
        lost: difference(&current, &target),
        gained: difference(&target, &current),
    }
}

// First occurrence of an identifier keeps its details.
fn index(snapshot: &ScopeSnapshot) -> BTreeMap<&str, &AssignmentRecord> {
    let mut map = BTreeMap::new();
    for record in snapshot {
        map.entry(record.id()).or_insert(record);
    }
    map
}

fn difference(
    left: &BTreeMap<&str, &AssignmentRecord>,
    right: &BTreeMap<&str, &AssignmentRecord>,
) -> Vec<AssignmentRecord> {
    left.iter()
        .filter(|(id, _)| !right.contains_key(*id))
        .map(|(_, record)| (*record).clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AssignmentDetails;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn snap(ids: &[&str]) -> ScopeSnapshot {
        ScopeSnapshot::from_ids(ids.iter().copied())
    }

    #[test]
    fn reader_contributor_owner_scenario() {
        let result = diff(&snap(&["Reader", "Contributor"]), &snap(&["Contributor", "Owner"]));
        assert_eq!(result.lost_ids(), vec!["Reader"]);
        assert_eq!(result.gained_ids(), vec!["Owner"]);
    }

    #[test]
    fn both_empty() {
        let result = diff(&ScopeSnapshot::empty(), &ScopeSnapshot::empty());
        assert!(result.is_empty());
    }

    #[test]
    fn identical_non_empty_inputs() {
        let result = diff(&snap(&["PolicyA"]), &snap(&["PolicyA"]));
        assert!(result.lost.is_empty());
        assert!(result.gained.is_empty());
    }

    #[test]
    fn empty_current_gains_everything() {
        let result = diff(&ScopeSnapshot::empty(), &snap(&["b", "a", "a"]));
        assert!(result.lost.is_empty());
        assert_eq!(result.gained_ids(), vec!["a", "b"]);
    }

    #[test]
    fn duplicates_collapse() {
        let result = diff(&snap(&["x", "x", "y"]), &snap(&["y", "y"]));
        assert_eq!(result.lost_ids(), vec!["x"]);
        assert!(result.gained.is_empty());
    }

    #[test]
    fn output_is_sorted() {
        let result = diff(&snap(&["c", "a", "b"]), &ScopeSnapshot::empty());
        assert_eq!(result.lost_ids(), vec!["a", "b", "c"]);
    }

    #[test]
    fn first_occurrence_details_are_kept() {
        let first = AssignmentRecord::new("Reader").with_details(AssignmentDetails {
            principal_id: Some("alice".into()),
            ..AssignmentDetails::default()
        });
        let second = AssignmentRecord::new("Reader").with_details(AssignmentDetails {
            principal_id: Some("bob".into()),
            ..AssignmentDetails::default()
        });
        let current: ScopeSnapshot = [first, second].into_iter().collect();

        let result = diff(&current, &ScopeSnapshot::empty());
        assert_eq!(result.lost.len(), 1);
        let principal = result.lost[0]
            .details()
            .and_then(|d| d.principal_id.as_deref());
        assert_eq!(principal, Some("alice"));
    }

    #[test]
    fn inheritance_diff_serializes_flat() {
        let d = InheritanceDiff::compute(AssignmentKind::Policy, &snap(&["p1"]), &snap(&["p2"]));
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "kind": "policy",
                "lost": [{"id": "p1"}],
                "gained": [{"id": "p2"}]
            })
        );
    }

    fn ids_strategy() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-e]{1,2}", 0..12)
    }

    proptest! {
        #[test]
        fn lost_and_gained_are_symmetric(a in ids_strategy(), b in ids_strategy()) {
            let a = ScopeSnapshot::from_ids(a);
            let b = ScopeSnapshot::from_ids(b);
            let ab = diff(&a, &b);
            let ba = diff(&b, &a);
            prop_assert_eq!(ab.lost, ba.gained);
            prop_assert_eq!(ab.gained, ba.lost);
        }

        #[test]
        fn identical_inputs_diff_to_nothing(a in ids_strategy()) {
            let a = ScopeSnapshot::from_ids(a);
            prop_assert!(diff(&a, &a).is_empty());
        }

        #[test]
        fn lost_and_gained_are_disjoint(a in ids_strategy(), b in ids_strategy()) {
            let result = diff(&ScopeSnapshot::from_ids(a), &ScopeSnapshot::from_ids(b));
            for id in result.lost_ids() {
                prop_assert!(!result.gained_ids().contains(&id));
            }
        }

        #[test]
        fn results_hold_no_duplicates(a in ids_strategy(), b in ids_strategy()) {
            let result = diff(&ScopeSnapshot::from_ids(a), &ScopeSnapshot::from_ids(b));
            let mut lost = result.lost_ids();
            lost.dedup();
            prop_assert_eq!(lost.len(), result.lost.len());
            let mut gained = result.gained_ids();
            gained.dedup();
            prop_assert_eq!(gained.len(), result.gained.len());
        }

        #[test]
        fn results_come_from_the_right_side(a in ids_strategy(), b in ids_strategy()) {
            let result = diff(&ScopeSnapshot::from_ids(a.clone()), &ScopeSnapshot::from_ids(b.clone()));
            for id in result.lost_ids() {
                prop_assert!(a.iter().any(|x| x == id) && !b.iter().any(|x| x == id));
            }
            for id in result.gained_ids() {
                prop_assert!(b.iter().any(|x| x == id) && !a.iter().any(|x| x == id));
            }
        }

        #[test]
        fn empty_current_gains_the_target_set(b in ids_strategy()) {
            let target = ScopeSnapshot::from_ids(b.clone());
            let result = diff(&ScopeSnapshot::empty(), &target);
            prop_assert!(result.lost.is_empty());
            let mut expected = b;
            expected.sort();
            expected.dedup();
            prop_assert_eq!(result.gained_ids(), expected.iter().map(String::as_str).collect::<Vec<_>>());
        }
    }
}
