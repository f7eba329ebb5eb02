//! Scope and input error types.

/// Errors raised while resolving caller input into core types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    /// Scope string matches neither the subscription nor the management group form.
    #[error(
        "Invalid scope '{0}': must be /subscriptions/{{id}} or /providers/Microsoft.Management/managementGroups/{{id}}"
    )]
    InvalidScope(String),

    /// Bare identifier is empty or contains a path separator.
    #[error("Invalid {kind} id '{id}': must be non-empty and contain no '/'")]
    InvalidId {
        /// Which scope kind the id was meant for.
        kind: &'static str,
        /// Offending value.
        id: String,
    },

    /// Unknown assignment kind name.
    #[error("Unknown assignment kind '{0}': expected 'role' or 'policy'")]
    UnknownKind(String),
}

/// Result type for scope resolution.
pub type ScopeResult<T> = Result<T, ScopeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_scope_display() {
        let e = ScopeError::InvalidScope("/tenants/x".into());
        assert_eq!(
            e.to_string(),
            "Invalid scope '/tenants/x': must be /subscriptions/{id} or /providers/Microsoft.Management/managementGroups/{id}"
        );
    }

    #[test]
    fn invalid_id_display() {
        let e = ScopeError::InvalidId {
            kind: "management group",
            id: "a/b".into(),
        };
        assert_eq!(
            e.to_string(),
            "Invalid management group id 'a/b': must be non-empty and contain no '/'"
        );
    }
}
