//! Credential sources and the default selection chain.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::{
    ARM_RESOURCE, ARM_SCOPE, AccessToken, AuthError, AuthResult, AzureCliCredential,
    ClientSecretCredential, DEFAULT_AUTHORITY_HOST, ENV_ACCESS_TOKEN, ENV_CLIENT_ID,
    ENV_CLIENT_SECRET, ENV_TENANT_ID,
};

/// Something that can hand out bearer tokens for the management API.
#[async_trait]
pub trait TokenCredential: Send + Sync + std::fmt::Debug {
    /// Short name of the credential source, for logs.
    fn source(&self) -> &'static str;

    /// Get a valid token, fetching or refreshing as needed.
    async fn get_token(&self) -> AuthResult<AccessToken>;
}

/// A fixed, pre-issued bearer token.
#[derive(Debug, Clone)]
pub struct StaticTokenCredential {
    token: AccessToken,
}

impl StaticTokenCredential {
    /// Wrap a raw bearer token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::bearer(token, None),
        }
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    fn source(&self) -> &'static str {
        "static"
    }

    async fn get_token(&self) -> AuthResult<AccessToken> {
        Ok(self.token.clone())
    }
}

/// Options shared by credential sources.
#[derive(Debug, Clone)]
pub struct CredentialOptions {
    /// Identity provider base URL.
    pub authority_host: String,
    /// OAuth scope requested by client secret auth.
    pub scope: String,
    /// Resource requested from the Azure CLI.
    pub resource: String,
    /// Timeout for token requests.
    pub timeout: Duration,
}

impl Default for CredentialOptions {
    fn default() -> Self {
        Self {
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            scope: ARM_SCOPE.to_string(),
            resource: ARM_RESOURCE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl CredentialOptions {
    /// Builder: set the authority host.
    ///
    /// # Errors
    /// Returns `AuthError::UrlError` if the host is not a valid URL.
    pub fn with_authority_host(mut self, host: &str) -> AuthResult<Self> {
        Url::parse(host)?;
        self.authority_host = host.to_string();
        Ok(self)
    }

    /// Builder: set the token request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Which credential source the default chain picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// `AZURE_ACCESS_TOKEN` was set.
    StaticToken,
    /// Tenant, client id and client secret were all set.
    ClientSecret,
    /// Nothing set in the environment; fall back to `az`.
    AzureCli,
}

/// Picks the first configured credential source.
///
/// Order: static token, client secret, Azure CLI.
#[derive(Debug)]
pub struct DefaultCredential;

impl DefaultCredential {
    /// Build a credential from the process environment.
    ///
    /// # Errors
    /// Returns `AuthError` if a partially configured source cannot be built.
    pub fn from_env(options: CredentialOptions) -> AuthResult<Arc<dyn TokenCredential>> {
        Self::from_lookup(|key| std::env::var(key).ok(), options)
    }

    /// Build a credential from an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns `AuthError::InvalidConfig` if only some of the client secret
    /// variables are set.
    pub fn from_lookup<F>(
        lookup: F,
        options: CredentialOptions,
    ) -> AuthResult<Arc<dyn TokenCredential>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let source = Self::select(&get)?;
        debug!(?source, "Selected credential source");

        let credential: Arc<dyn TokenCredential> = match source {
            CredentialSource::StaticToken => Arc::new(StaticTokenCredential::new(
                get(ENV_ACCESS_TOKEN).unwrap_or_default(),
            )),
            CredentialSource::ClientSecret => Arc::new(ClientSecretCredential::new(
                get(ENV_TENANT_ID).unwrap_or_default(),
                get(ENV_CLIENT_ID).unwrap_or_default(),
                get(ENV_CLIENT_SECRET).unwrap_or_default(),
                &options,
            )?),
            CredentialSource::AzureCli => Arc::new(AzureCliCredential::new(&options)),
        };
        Ok(credential)
    }

    /// Decide which source a lookup selects.
    ///
    /// # Errors
    /// Returns `AuthError::InvalidConfig` if only some of the client secret
    /// variables are set.
    pub fn select<F>(get: &F) -> AuthResult<CredentialSource>
    where
        F: Fn(&str) -> Option<String>,
    {
        if get(ENV_ACCESS_TOKEN).is_some() {
            return Ok(CredentialSource::StaticToken);
        }

        let secret_vars = [ENV_TENANT_ID, ENV_CLIENT_ID, ENV_CLIENT_SECRET];
        let present: Vec<&str> = secret_vars
            .iter()
            .copied()
            .filter(|key| get(*key).is_some())
            .collect();

        match present.len() {
            0 => Ok(CredentialSource::AzureCli),
            3 => Ok(CredentialSource::ClientSecret),
            _ => {
                let missing: Vec<&str> = secret_vars
                    .iter()
                    .copied()
                    .filter(|key| !present.contains(key))
                    .collect();
                Err(AuthError::InvalidConfig(format!(
                    "client secret credential is missing {}",
                    missing.join(", ")
                )))
            }
        }
    }
}
