//! Client configuration.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{ArmError, ArmResult};

/// Configuration for [`ArmClient`](crate::ArmClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArmConfig {
    /// Management endpoint, including protocol.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// `api-version` for role assignment listing.
    #[serde(default = "default_role_api_version")]
    pub role_api_version: String,

    /// `api-version` for policy assignment listing.
    #[serde(default = "default_policy_api_version")]
    pub policy_api_version: String,

    /// `api-version` for subscription listing.
    #[serde(default = "default_subscription_api_version")]
    pub subscription_api_version: String,

    /// Connection timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u32,

    /// Request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u32,
}

fn default_endpoint() -> String {
    "https://management.azure.com".to_string()
}

fn default_role_api_version() -> String {
    "2022-04-01".to_string()
}

fn default_policy_api_version() -> String {
    "2023-04-01".to_string()
}

fn default_subscription_api_version() -> String {
    "2022-12-01".to_string()
}

const fn default_connect_timeout_ms() -> u32 {
    10_000 // 10 seconds
}

const fn default_request_timeout_ms() -> u32 {
    60_000 // 60 seconds
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            role_api_version: default_role_api_version(),
            policy_api_version: default_policy_api_version(),
            subscription_api_version: default_subscription_api_version(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ArmConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    /// Returns `ArmError::Config` if validation fails.
    pub fn validate(&self) -> ArmResult<()> {
        self.endpoint_url()?;

        for (name, value) in [
            ("role_api_version", &self.role_api_version),
            ("policy_api_version", &self.policy_api_version),
            ("subscription_api_version", &self.subscription_api_version),
        ] {
            if value.trim().is_empty() {
                return Err(ArmError::Config(format!("{name} cannot be empty")));
            }
        }

        if self.connect_timeout_ms == 0 || self.connect_timeout_ms > 300_000 {
            return Err(ArmError::Config(
                "Connect timeout must be between 1ms and 300000ms".into(),
            ));
        }

        if self.request_timeout_ms == 0 || self.request_timeout_ms > 600_000 {
            return Err(ArmError::Config(
                "Request timeout must be between 1ms and 600000ms".into(),
            ));
        }

        Ok(())
    }

    /// Parse the endpoint.
    ///
    /// # Errors
    /// Returns `ArmError::Config` unless the endpoint is an absolute http(s) URL.
    pub fn endpoint_url(&self) -> ArmResult<Url> {
        let url = Url::parse(&self.endpoint)
            .map_err(|e| ArmError::Config(format!("Invalid endpoint '{}': {e}", self.endpoint)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ArmError::Config(format!(
                "Endpoint '{}' must use http or https",
                self.endpoint
            )));
        }
        if url.query().is_some() {
            return Err(ArmError::Config(format!(
                "Endpoint '{}' must not carry a query string",
                self.endpoint
            )));
        }
        Ok(url)
    }
}
