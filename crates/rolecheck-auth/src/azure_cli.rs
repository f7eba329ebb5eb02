//! Token from the signed-in Azure CLI session.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use parking_lot::RwLock;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::{
    AccessToken, AuthError, AuthResult, CredentialOptions, ENV_ACCESS_TOKEN, TokenCredential,
};

/// Output of `az account get-access-token --output json`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliTokenOutput {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    /// Unix seconds; present in newer CLI versions.
    #[serde(default, rename = "expires_on")]
    expires_on_unix: Option<i64>,
    /// Local time string; present in all versions.
    #[serde(default)]
    expires_on: Option<String>,
}

/// Runs `az account get-access-token` and caches the result until it is
/// within [`DEFAULT_REFRESH_THRESHOLD`](crate::DEFAULT_REFRESH_THRESHOLD) of
/// expiry. Each run of `az` is bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct AzureCliCredential {
    program: String,
    resource: String,
    timeout: Duration,
    cached: Arc<RwLock<Option<AccessToken>>>,
    refresh: Arc<Mutex<()>>,
}

impl AzureCliCredential {
    /// Create a credential for the configured resource.
    #[must_use]
    pub fn new(options: &CredentialOptions) -> Self {
        let program = if cfg!(windows) { "az.cmd" } else { "az" };
        Self {
            program: program.to_string(),
            resource: options.resource.clone(),
            timeout: options.timeout,
            cached: Arc::new(RwLock::new(None)),
            refresh: Arc::new(Mutex::new(())),
        }
    }

    /// Builder: use a different executable.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn cached_token(&self) -> Option<AccessToken> {
        self.cached
            .read()
            .as_ref()
            .filter(|token| !token.needs_refresh())
            .cloned()
    }

    #[instrument(skip(self), fields(program = %self.program))]
    async fn run_cli(&self) -> AuthResult<AccessToken> {
        let mut command = tokio::process::Command::new(&self.program);
        command
            .args([
                "account",
                "get-access-token",
                "--resource",
                self.resource.as_str(),
                "--output",
                "json",
            ])
            .kill_on_drop(true);

        // Dropping the output future on timeout kills `az`.
        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                AuthError::CliFailed(format!(
                    "'{} account get-access-token' did not finish within {}s",
                    self.program,
                    self.timeout.as_secs_f64()
                ))
            })?
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => AuthError::NotConfigured(format!(
                    "'{}' not found. Install the Azure CLI and run 'az login', or set {ENV_ACCESS_TOKEN}",
                    self.program
                )),
                _ => AuthError::CliFailed(format!("could not run '{}': {e}", self.program)),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AuthError::CliFailed(format!(
                "'{} account get-access-token' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let token = parse_cli_output(&output.stdout)?;
        debug!(expires_at = ?token.expires_at(), "Obtained access token from Azure CLI");
        Ok(token)
    }
}

#[async_trait]
impl TokenCredential for AzureCliCredential {
    fn source(&self) -> &'static str {
        "azure_cli"
    }

    async fn get_token(&self) -> AuthResult<AccessToken> {
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        let _refresh = self.refresh.lock().await;
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        let token = self.run_cli().await?;
        *self.cached.write() = Some(token.clone());
        Ok(token)
    }
}

/// Parse the JSON the Azure CLI prints for an access token.
///
/// # Errors
/// Returns `AuthError::InvalidTokenResponse` if the output is not the
/// expected JSON or carries an empty token.
pub fn parse_cli_output(stdout: &[u8]) -> AuthResult<AccessToken> {
    let parsed: CliTokenOutput = serde_json::from_slice(stdout)
        .map_err(|e| AuthError::InvalidTokenResponse(format!("Azure CLI output: {e}")))?;

    if parsed.access_token.trim().is_empty() {
        return Err(AuthError::InvalidTokenResponse(
            "Azure CLI returned an empty accessToken".into(),
        ));
    }

    let expires_at = parsed
        .expires_on_unix
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .or_else(|| parsed.expires_on.as_deref().and_then(parse_local_expiry));

    let token = AccessToken::bearer(parsed.access_token, expires_at);
    Ok(match parsed.token_type.filter(|t| !t.is_empty()) {
        Some(token_type) => token.with_token_type(token_type),
        None => token,
    })
}

// `expiresOn` is local time without offset, e.g. "2024-05-01 13:45:10.000000".
fn parse_local_expiry(value: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f").ok()?;
    chrono::Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unix_expiry() {
        let token = parse_cli_output(
            br#"{
                "accessToken": "cli-token",
                "expiresOn": "2024-05-01 13:45:10.000000",
                "expires_on": 1714571110,
                "subscription": "sub",
                "tenant": "ten",
                "tokenType": "Bearer"
            }"#,
        )
        .unwrap();

        assert_eq!(token.token(), "cli-token");
        assert_eq!(token.expires_at().unwrap().timestamp(), 1_714_571_110);
        assert_eq!(token.authorization_header(), "Bearer cli-token");
    }

    #[test]
    fn falls_back_to_local_expiry_string() {
        let token = parse_cli_output(
            br#"{"accessToken": "t", "expiresOn": "2024-05-01 13:45:10.123456"}"#,
        )
        .unwrap();
        assert!(token.expires_at().is_some());
    }

    #[test]
    fn unknown_expiry_is_none() {
        let token = parse_cli_output(br#"{"accessToken": "t"}"#).unwrap();
        assert!(token.expires_at().is_none());
    }

    #[test]
    fn rejects_empty_token() {
        let err = parse_cli_output(br#"{"accessToken": ""}"#).unwrap_err();
        assert!(matches!(err, AuthError::InvalidTokenResponse(_)));
    }

    #[test]
    fn rejects_non_json() {
        let err = parse_cli_output(b"ERROR: Please run 'az login'").unwrap_err();
        assert!(matches!(err, AuthError::InvalidTokenResponse(_)));
    }

    /// Write an executable stand-in for `az` that logs each run to `calls`.
    #[cfg(unix)]
    fn fake_az(dir: &std::path::Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("az");
        let log = dir.join("calls");
        std::fs::write(
            &script,
            format!("#!/bin/sh\necho run >> '{}'\n{body}\n", log.display()),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script.display().to_string()
    }

    #[cfg(unix)]
    fn az_runs(dir: &std::path::Path) -> usize {
        std::fs::read_to_string(dir.join("calls")).map_or(0, |log| log.lines().count())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn caches_token_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let expires_on = Utc::now().timestamp() + 3600;
        let program = fake_az(
            dir.path(),
            &format!(r#"echo '{{"accessToken": "cli-token", "expires_on": {expires_on}}}'"#),
        );
        let credential =
            AzureCliCredential::new(&CredentialOptions::default()).with_program(program);

        let (first, second, third) = tokio::join!(
            credential.get_token(),
            credential.get_token(),
            credential.get_token(),
        );
        for token in [first, second, third] {
            assert_eq!(token.unwrap().token(), "cli-token");
        }
        assert_eq!(credential.get_token().await.unwrap().token(), "cli-token");
        assert_eq!(az_runs(dir.path()), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn hung_cli_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_az(dir.path(), r#"sleep 5; echo '{"accessToken": "late"}'"#);
        let options = CredentialOptions::default().with_timeout(Duration::from_millis(200));
        let credential = AzureCliCredential::new(&options).with_program(program);

        let started = std::time::Instant::now();
        let err = credential.get_token().await.unwrap_err();
        assert!(
            matches!(&err, AuthError::CliFailed(msg) if msg.contains("did not finish")),
            "unexpected error: {err}"
        );
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_run_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_az(dir.path(), "echo 'Please run az login' >&2; exit 1");
        let credential =
            AzureCliCredential::new(&CredentialOptions::default()).with_program(program);

        for _ in 0..2 {
            let err = credential.get_token().await.unwrap_err();
            assert!(matches!(&err, AuthError::CliFailed(msg) if msg.contains("az login")));
        }
        assert_eq!(az_runs(dir.path()), 2);
    }

    #[tokio::test]
    async fn missing_program_means_not_configured() {
        let credential = AzureCliCredential::new(&CredentialOptions::default())
            .with_program("rolecheck-test-no-such-az");
        let err = credential.get_token().await.unwrap_err();
        assert!(
            matches!(&err, AuthError::NotConfigured(msg) if msg.contains("az login")),
            "unexpected error: {err}"
        );
    }
}
