//! Assignment records and scope snapshots.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Display metadata attached to a record.
///
/// None of these fields take part in comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentDetails {
    /// Full resource id of the assignment itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_id: Option<String>,

    /// Principal the assignment binds (role assignments only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_id: Option<String>,

    /// Principal type, e.g. `User`, `Group`, `ServicePrincipal`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_type: Option<String>,

    /// Scope the assignment was made at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Human readable name, when the API provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl AssignmentDetails {
    /// True when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.assignment_id.is_none()
            && self.principal_id.is_none()
            && self.principal_type.is_none()
            && self.scope.is_none()
            && self.display_name.is_none()
    }
}

/// One role or policy assignment, identified by an opaque string.
///
/// Two records are the same assignment iff their identifiers are equal;
/// `details` are carried along for display only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRecord {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<AssignmentDetails>,
}

impl AssignmentRecord {
    /// Create a record with no display metadata.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            details: None,
        }
    }

    /// Attach display metadata. Empty details are dropped.
    #[must_use]
    pub fn with_details(mut self, details: AssignmentDetails) -> Self {
        self.details = (!details.is_empty()).then_some(details);
        self
    }

    /// The identifier used for comparison.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display metadata, if any.
    #[must_use]
    pub const fn details(&self) -> Option<&AssignmentDetails> {
        self.details.as_ref()
    }
}

impl PartialEq for AssignmentRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AssignmentRecord {}

impl Hash for AssignmentRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for AssignmentRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AssignmentRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl From<&str> for AssignmentRecord {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AssignmentRecord {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

/// Records retrieved for one scope at one point in time.
///
/// Order carries no meaning and duplicates are allowed; the diff engine
/// treats the snapshot as a set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeSnapshot {
    records: Vec<AssignmentRecord>,
}

impl ScopeSnapshot {
    /// An empty snapshot.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Build a snapshot from bare identifiers.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ids.into_iter().map(AssignmentRecord::new).collect()
    }

    /// Add a record.
    pub fn push(&mut self, record: AssignmentRecord) {
        self.records.push(record);
    }

    /// Records in retrieval order.
    #[must_use]
    pub fn records(&self) -> &[AssignmentRecord] {
        &self.records
    }

    /// Number of records, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the snapshot holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of distinct identifiers.
    #[must_use]
    pub fn distinct_len(&self) -> usize {
        let ids: std::collections::HashSet<&str> =
            self.records.iter().map(AssignmentRecord::id).collect();
        ids.len()
    }
}

impl FromIterator<AssignmentRecord> for ScopeSnapshot {
    fn from_iter<T: IntoIterator<Item = AssignmentRecord>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl Extend<AssignmentRecord> for ScopeSnapshot {
    fn extend<T: IntoIterator<Item = AssignmentRecord>>(&mut self, iter: T) {
        self.records.extend(iter);
    }
}

impl<'a> IntoIterator for &'a ScopeSnapshot {
    type Item = &'a AssignmentRecord;
    type IntoIter = std::slice::Iter<'a, AssignmentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
