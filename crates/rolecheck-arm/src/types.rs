//! Wire types for the management API responses.

use rolecheck_core::{AssignmentDetails, AssignmentRecord};
use serde::{Deserialize, Serialize};

/// One page of a list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    /// Absolute URL of the next page, if any.
    #[serde(default, rename = "nextLink", skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
}

/// `Microsoft.Authorization/roleAssignments` item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Full resource id of the assignment.
    #[serde(default)]
    pub id: Option<String>,
    /// Assignment name (a GUID).
    #[serde(default)]
    pub name: Option<String>,
    /// Assignment properties.
    pub properties: RoleAssignmentProperties,
}

/// Properties of a role assignment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignmentProperties {
    /// Role definition resource id; the comparison identifier.
    #[serde(default)]
    pub role_definition_id: String,
    /// Principal object id.
    #[serde(default)]
    pub principal_id: Option<String>,
    /// Principal type.
    #[serde(default)]
    pub principal_type: Option<String>,
    /// Scope the assignment was made at.
    #[serde(default)]
    pub scope: Option<String>,
}

impl RoleAssignment {
    /// Convert into a record keyed by role definition id.
    ///
    /// Returns `None` when the role definition id is missing.
    #[must_use]
    pub fn into_record(self) -> Option<AssignmentRecord> {
        let props = self.properties;
        if props.role_definition_id.is_empty() {
            return None;
        }
        Some(
            AssignmentRecord::new(props.role_definition_id).with_details(AssignmentDetails {
                assignment_id: self.id,
                principal_id: props.principal_id,
                principal_type: props.principal_type,
                scope: props.scope,
                display_name: None,
            }),
        )
    }
}

/// `Microsoft.Authorization/policyAssignments` item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyAssignment {
    /// Full resource id of the assignment.
    #[serde(default)]
    pub id: Option<String>,
    /// Assignment name.
    #[serde(default)]
    pub name: Option<String>,
    /// Assignment properties.
    pub properties: PolicyAssignmentProperties,
}

/// Properties of a policy assignment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyAssignmentProperties {
    /// Policy (or initiative) definition resource id; the comparison identifier.
    #[serde(default)]
    pub policy_definition_id: String,
    /// Display name of the assignment.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Scope the assignment was made at.
    #[serde(default)]
    pub scope: Option<String>,
}

impl PolicyAssignment {
    /// Convert into a record keyed by policy definition id.
    ///
    /// Returns `None` when the policy definition id is missing.
    #[must_use]
    pub fn into_record(self) -> Option<AssignmentRecord> {
        let props = self.properties;
        if props.policy_definition_id.is_empty() {
            return None;
        }
        Some(
            AssignmentRecord::new(props.policy_definition_id).with_details(AssignmentDetails {
                assignment_id: self.id,
                principal_id: None,
                principal_type: None,
                scope: props.scope,
                display_name: props.display_name.or(self.name),
            }),
        )
    }
}

/// `/subscriptions` item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Subscription id (a GUID).
    pub subscription_id: String,
    /// Display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// `Enabled`, `Disabled`, `Warned`, ...
    #[serde(default)]
    pub state: Option<String>,
}

impl Subscription {
    /// True unless the API says otherwise.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.state
            .as_deref()
            .is_none_or(|state| state.eq_ignore_ascii_case("enabled"))
    }
}

/// Error envelope returned by the management API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmErrorBody {
    /// Error detail.
    pub error: ArmErrorDetail,
}

/// Error detail inside [`ArmErrorBody`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmErrorDetail {
    /// Machine-readable code, e.g. `AuthorizationFailed`.
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,
}
