//! Credential error types.

/// Credential errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No credential source is configured.
    #[error("No credential configured: {0}")]
    NotConfigured(String),

    /// Invalid credential configuration.
    #[error("Invalid credential configuration: {0}")]
    InvalidConfig(String),

    /// Token endpoint rejected the request.
    #[error("Token request failed ({status}): {error} - {description}")]
    TokenRequestFailed {
        /// HTTP status code.
        status: u16,
        /// Error code from the identity provider.
        error: String,
        /// Human-readable description.
        description: String,
    },

    /// Token response could not be used.
    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    /// Azure CLI could not produce a token.
    #[error("Azure CLI credential failed: {0}")]
    CliFailed(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// URL parsing failed.
    #[error("URL parsing failed: {0}")]
    UrlError(#[from] url::ParseError),
}

/// Result type for credential operations.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_configured_display() {
        let e = AuthError::NotConfigured("set AZURE_ACCESS_TOKEN".into());
        assert_eq!(e.to_string(), "No credential configured: set AZURE_ACCESS_TOKEN");
    }

    #[test]
    fn token_request_failed_display() {
        let e = AuthError::TokenRequestFailed {
            status: 401,
            error: "invalid_client".into(),
            description: "bad secret".into(),
        };
        assert_eq!(
            e.to_string(),
            "Token request failed (401): invalid_client - bad secret"
        );
    }

    #[test]
    fn cli_failed_display() {
        let e = AuthError::CliFailed("az not found".into());
        assert_eq!(e.to_string(), "Azure CLI credential failed: az not found");
    }

    #[test]
    fn json_error_from() {
        let json_err: Result<serde_json::Value, _> = serde_json::from_str("bad");
        let e: AuthError = json_err.unwrap_err().into();
        assert!(matches!(e, AuthError::JsonError(_)));
    }

    #[test]
    fn url_error_from() {
        let url_err = url::Url::parse("://bad").unwrap_err();
        let e: AuthError = url_err.into();
        assert!(matches!(e, AuthError::UrlError(_)));
    }
}
