//! OAuth 2.0 client credentials grant for a service principal.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use url::Url;

use crate::{AccessToken, AuthError, AuthResult, CredentialOptions, TokenCredential, TokenResponse};

/// Error body returned by the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Service principal credential using a client secret.
///
/// The token is cached in memory and reused until it is within
/// [`DEFAULT_REFRESH_THRESHOLD`](crate::DEFAULT_REFRESH_THRESHOLD) of expiry.
#[derive(Clone)]
pub struct ClientSecretCredential {
    client_id: String,
    client_secret: String,
    scope: String,
    token_url: Url,
    http: reqwest::Client,
    cached: Arc<RwLock<Option<AccessToken>>>,
    refresh: Arc<Mutex<()>>,
}

impl std::fmt::Debug for ClientSecretCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecretCredential")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scope", &self.scope)
            .field("token_url", &self.token_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ClientSecretCredential {
    /// Create a credential for `tenant_id`.
    ///
    /// # Errors
    /// Returns `AuthError::InvalidConfig` if any input is empty, or
    /// `AuthError::UrlError` / `AuthError::HttpError` if the token URL or the
    /// HTTP client cannot be built.
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        options: &CredentialOptions,
    ) -> AuthResult<Self> {
        let tenant_id = tenant_id.into();
        let client_id = client_id.into();
        let client_secret = client_secret.into();

        for (name, value) in [
            ("tenant id", &tenant_id),
            ("client id", &client_id),
            ("client secret", &client_secret),
        ] {
            if value.trim().is_empty() {
                return Err(AuthError::InvalidConfig(format!("{name} cannot be empty")));
            }
        }
        if tenant_id.contains('/') {
            return Err(AuthError::InvalidConfig(format!(
                "tenant id '{tenant_id}' must not contain '/'"
            )));
        }

        let token_url = token_url(&options.authority_host, &tenant_id)?;
        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()?;

        Ok(Self {
            client_id,
            client_secret,
            scope: options.scope.clone(),
            token_url,
            http,
            cached: Arc::new(RwLock::new(None)),
            refresh: Arc::new(Mutex::new(())),
        })
    }

    fn cached_token(&self) -> Option<AccessToken> {
        self.cached
            .read()
            .as_ref()
            .filter(|token| !token.needs_refresh())
            .cloned()
    }

    #[instrument(skip(self), fields(client_id = %self.client_id))]
    async fn request_token(&self) -> AuthResult<AccessToken> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];

        let response = self
            .http
            .post(self.token_url.clone())
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let parsed: TokenErrorBody = serde_json::from_str(&body).unwrap_or(TokenErrorBody {
                error: None,
                error_description: None,
            });
            return Err(AuthError::TokenRequestFailed {
                status: status.as_u16(),
                error: parsed.error.unwrap_or_else(|| "unknown_error".into()),
                description: parsed
                    .error_description
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string()),
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| AuthError::InvalidTokenResponse(e.to_string()))?;
        if parsed.access_token.is_empty() {
            return Err(AuthError::InvalidTokenResponse(
                "access_token is empty".into(),
            ));
        }

        let token = AccessToken::from_response(parsed);
        debug!(expires_at = ?token.expires_at(), "Obtained access token");
        Ok(token)
    }
}

fn token_url(authority_host: &str, tenant_id: &str) -> AuthResult<Url> {
    let mut base = Url::parse(authority_host)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join(&format!("{tenant_id}/oauth2/v2.0/token"))?)
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    fn source(&self) -> &'static str {
        "client_secret"
    }

    async fn get_token(&self) -> AuthResult<AccessToken> {
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        // One token request at a time; waiters pick up the fresh token.
        let _refresh = self.refresh.lock().await;
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        let token = self.request_token().await?;
        *self.cached.write() = Some(token.clone());
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn options(host: &str) -> CredentialOptions {
        CredentialOptions::default()
            .with_authority_host(host)
            .unwrap()
    }

    #[test]
    fn token_url_joins_tenant() {
        let url = token_url("https://login.microsoftonline.com", "contoso").unwrap();
        assert_eq!(
            url.as_str(),
            "https://login.microsoftonline.com/contoso/oauth2/v2.0/token"
        );

        let url = token_url("http://localhost:8080/authority", "t1").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/authority/t1/oauth2/v2.0/token");
    }

    #[test]
    fn rejects_empty_inputs() {
        let err = ClientSecretCredential::new("t", "", "s", &CredentialOptions::default())
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidConfig(msg) if msg.contains("client id")));
    }

    #[test]
    fn debug_redacts_secret() {
        let credential =
            ClientSecretCredential::new("t", "c", "hunter2", &CredentialOptions::default())
                .unwrap();
        assert!(!format!("{credential:?}").contains("hunter2"));
    }

    #[tokio::test]
    async fn fetches_and_caches_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=app"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "Bearer",
                "expires_in": 3599,
                "access_token": "arm-token"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let credential =
            ClientSecretCredential::new("tenant-1", "app", "secret", &options(&server.uri()))
                .unwrap();

        let first = credential.get_token().await.unwrap();
        let second = credential.get_token().await.unwrap();
        assert_eq!(first.token(), "arm-token");
        assert_eq!(second.token(), "arm-token");
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_token_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({
                        "access_token": "shared",
                        "expires_in": 3599
                    }))
                    .set_delay(std::time::Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let credential =
            ClientSecretCredential::new("tenant-1", "app", "secret", &options(&server.uri()))
                .unwrap();
        let (a, b, c, d, e, f) = tokio::join!(
            credential.get_token(),
            credential.get_token(),
            credential.get_token(),
            credential.get_token(),
            credential.get_token(),
            credential.get_token(),
        );
        for token in [a, b, c, d, e, f] {
            assert_eq!(token.unwrap().token(), "shared");
        }
    }

    #[tokio::test]
    async fn refreshes_short_lived_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "short",
                "expires_in": 60
            })))
            .expect(2)
            .mount(&server)
            .await;

        let credential =
            ClientSecretCredential::new("tenant-1", "app", "secret", &options(&server.uri()))
                .unwrap();
        credential.get_token().await.unwrap();
        credential.get_token().await.unwrap();
    }

    #[tokio::test]
    async fn maps_identity_provider_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": "invalid_client",
                "error_description": "AADSTS7000215: Invalid client secret provided."
            })))
            .mount(&server)
            .await;

        let credential =
            ClientSecretCredential::new("tenant-1", "app", "wrong", &options(&server.uri()))
                .unwrap();
        let err = credential.get_token().await.unwrap_err();
        assert!(
            matches!(
                &err,
                AuthError::TokenRequestFailed { status: 401, error, description }
                    if error == "invalid_client" && description.starts_with("AADSTS7000215")
            ),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn rejects_malformed_token_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let credential =
            ClientSecretCredential::new("tenant-1", "app", "secret", &options(&server.uri()))
                .unwrap();
        let err = credential.get_token().await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidTokenResponse(_)));
    }
}
