//! ARM-specific error types.

use rolecheck_auth::AuthError;
use rolecheck_core::ScopeError;
use thiserror::Error;

use crate::types::ArmErrorBody;

/// Errors raised while listing assignments.
#[derive(Error, Debug)]
pub enum ArmError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No token could be obtained
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Scope string is not a subscription or management group
    #[error(transparent)]
    InvalidScope(#[from] ScopeError),

    /// URL construction failed
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Management API returned an error
    #[error("ARM API error {status}{}: {message}", code_suffix(.code))]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Paging did not terminate
    #[error("Pagination error: {0}")]
    Pagination(String),

    /// No subscription visible to the caller
    #[error("No enabled subscription is visible to this identity")]
    NoSubscription,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ArmError {
    /// Build an API error from a non-success response body.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ArmErrorBody>(body) {
            Ok(parsed) => Self::Api {
                status,
                code: parsed.error.code,
                message: parsed
                    .error
                    .message
                    .unwrap_or_else(|| fallback_message(status, body)),
            },
            Err(_) => Self::Api {
                status,
                code: None,
                message: fallback_message(status, body),
            },
        }
    }

    /// HTTP status, when the failure came from the API.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True for credential problems and 401/403 responses.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Auth(_)) || matches!(self.status(), Some(401 | 403))
    }
}

#[allow(clippy::ref_option)]
fn code_suffix(code: &Option<String>) -> String {
    code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default()
}

fn fallback_message(status: u16, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed.chars().take(512).collect()
    }
}

/// Result type for ARM operations.
pub type ArmResult<T> = Result<T, ArmError>;
