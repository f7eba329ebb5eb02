//! Layered configuration.
//!
//! Precedence, highest first: command-line flags, `ROLECHECK_*` environment
//! variables (both handled by clap), the TOML file, built-in defaults.
//! Everything is validated here, before any network call.
//!
//! ```toml
//! subscription = "e6b1f24d-85ce-4fe2-8a32-3e9d38ad9a05"
//! current_management_group = "mg-legacy"
//! target_management_group = "mg-platform"
//! kinds = ["role", "policy"]
//! on_fetch_error = "abort"
//! log_level = "info"
//!
//! [arm]
//! request_timeout_ms = 30000
//!
//! [auth]
//! authority_host = "https://login.microsoftonline.us"
//! timeout_ms = 20000
//! ```

use std::io::{BufRead, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use rolecheck_arm::ArmConfig;
use rolecheck_auth::{CredentialOptions, DEFAULT_AUTHORITY_HOST};
use rolecheck_core::{AssignmentKind, ScopeIdentifier, ScopeResult};
use serde::Deserialize;

use crate::cli::Cli;
use crate::logging::LogFormat;
use crate::preview::FetchFailurePolicy;
use crate::prompt;

/// Contents of the TOML configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Subscription id or path.
    pub subscription: Option<String>,
    /// Current management group id or path.
    pub current_management_group: Option<String>,
    /// Target management group id or path.
    pub target_management_group: Option<String>,
    /// Kinds to compare.
    pub kinds: Option<Vec<AssignmentKind>>,
    /// Failure handling.
    pub on_fetch_error: Option<FetchFailurePolicy>,
    /// Log filter directives.
    pub log_level: Option<String>,
    /// Log line format.
    pub log_format: Option<LogFormat>,
    /// Management API client settings.
    #[serde(default)]
    pub arm: ArmConfig,
    /// Sign-in settings.
    #[serde(default)]
    pub auth: AuthSection,
}

/// `[auth]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSection {
    /// Identity provider base URL.
    pub authority_host: Option<String>,
    /// Bound on each token request, including a run of `az`.
    pub timeout_ms: Option<u64>,
}

/// Largest accepted `[auth] timeout_ms`.
const MAX_AUTH_TIMEOUT_MS: u64 = 600_000;

impl FileConfig {
    /// Read and parse a config file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid config.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parse config file contents.
    ///
    /// # Errors
    /// Returns the TOML error for malformed input or unknown keys.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// `None` means "use the default subscription".
    pub subscription: Option<ScopeIdentifier>,
    /// `None` means "ask".
    pub current_management_group: Option<ScopeIdentifier>,
    /// `None` means "ask".
    pub target_management_group: Option<ScopeIdentifier>,
    /// Kinds to compare, deduplicated, never empty.
    pub kinds: Vec<AssignmentKind>,
    /// What a failed scope fetch does to the run.
    pub on_fetch_error: FetchFailurePolicy,
    /// Print the JSON report instead of the human one.
    pub json: bool,
    /// Whether missing management groups may be prompted for.
    pub interactive: bool,
    /// Management API settings, already validated.
    pub arm: ArmConfig,
    /// Options for the credential chain.
    pub credentials: CredentialOptions,
    /// Filter directive from the config file.
    pub log_level: Option<String>,
    /// Log line format.
    pub log_format: LogFormat,
}

impl Settings {
    /// Load the config file named on the command line, if any, and resolve.
    ///
    /// # Errors
    /// Returns an error if the file is unreadable or any value is invalid.
    pub fn load(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(cli, file)
    }

    /// Merge command-line values over file values and validate the result.
    ///
    /// # Errors
    /// Returns an error naming the first invalid value.
    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self> {
        let subscription =
            first_non_blank(cli.subscription.as_deref(), file.subscription.as_deref())
                .map(parse_subscription)
                .transpose()?;
        let current_management_group = first_non_blank(
            cli.current_mg.as_deref(),
            file.current_management_group.as_deref(),
        )
        .map(parse_management_group)
        .transpose()?;
        let target_management_group = first_non_blank(
            cli.target_mg.as_deref(),
            file.target_management_group.as_deref(),
        )
        .map(parse_management_group)
        .transpose()?;

        let requested = if cli.kinds.is_empty() {
            file.kinds.unwrap_or_else(|| AssignmentKind::ALL.to_vec())
        } else {
            cli.kinds.clone()
        };
        let kinds: Vec<AssignmentKind> = AssignmentKind::ALL
            .into_iter()
            .filter(|kind| requested.contains(kind))
            .collect();
        if kinds.is_empty() {
            bail!("kinds must name at least one of: role, policy");
        }

        let mut arm = file.arm;
        if let Some(endpoint) = &cli.arm_endpoint {
            arm.endpoint.clone_from(endpoint);
        }
        arm.validate().context("Invalid [arm] configuration")?;

        let authority_host = cli
            .authority_host
            .as_deref()
            .or(file.auth.authority_host.as_deref())
            .unwrap_or(DEFAULT_AUTHORITY_HOST);
        let mut credentials = CredentialOptions::default()
            .with_authority_host(authority_host)
            .with_context(|| format!("Invalid authority host '{authority_host}'"))?;
        if let Some(timeout_ms) = file.auth.timeout_ms {
            if !(1..=MAX_AUTH_TIMEOUT_MS).contains(&timeout_ms) {
                bail!(
                    "Invalid [auth] configuration: timeout_ms must be between 1 and {MAX_AUTH_TIMEOUT_MS}"
                );
            }
            credentials = credentials.with_timeout(Duration::from_millis(timeout_ms));
        }

        Ok(Self {
            subscription,
            current_management_group,
            target_management_group,
            kinds,
            on_fetch_error: cli
                .on_fetch_error
                .or(file.on_fetch_error)
                .unwrap_or_default(),
            json: cli.json,
            interactive: !cli.no_input,
            arm,
            credentials,
            log_level: file.log_level,
            log_format: cli.log_format.or(file.log_format).unwrap_or_default(),
        })
    }

    /// Both management groups, prompting for any that are missing.
    ///
    /// # Errors
    /// Returns an error if a group is missing and cannot be prompted for, or
    /// the answer is not a valid management group.
    pub fn management_groups(
        &self,
        input: &mut impl BufRead,
        output: &mut impl Write,
    ) -> Result<(ScopeIdentifier, ScopeIdentifier)> {
        let current = match &self.current_management_group {
            Some(scope) => scope.clone(),
            None => self.ask_group(input, output, "Current Management Group ID", "--current-mg")?,
        };
        let target = match &self.target_management_group {
            Some(scope) => scope.clone(),
            None => self.ask_group(input, output, "Target Management Group ID", "--target-mg")?,
        };
        Ok((current, target))
    }

    fn ask_group(
        &self,
        input: &mut impl BufRead,
        output: &mut impl Write,
        label: &str,
        flag: &str,
    ) -> Result<ScopeIdentifier> {
        if !self.interactive {
            bail!("Missing {label}: pass {flag}");
        }
        let answer = prompt::ask(input, output, label)
            .with_context(|| format!("Missing {label}: pass {flag}"))?;
        parse_management_group(&answer)
    }
}

fn first_non_blank<'a>(primary: Option<&'a str>, fallback: Option<&'a str>) -> Option<&'a str> {
    [primary, fallback]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
}

/// Accept a bare subscription id or a `/subscriptions/{id}` path.
///
/// # Errors
/// Returns an error for anything else.
pub fn parse_subscription(value: &str) -> Result<ScopeIdentifier> {
    parse_scope(value, "subscription", ScopeIdentifier::subscription)
}

/// Accept a bare management group name or its full resource path.
///
/// # Errors
/// Returns an error for anything else.
pub fn parse_management_group(value: &str) -> Result<ScopeIdentifier> {
    parse_scope(value, "management group", ScopeIdentifier::management_group)
}

fn parse_scope(
    value: &str,
    expected: &str,
    bare: fn(String) -> ScopeResult<ScopeIdentifier>,
) -> Result<ScopeIdentifier> {
    let scope = if value.starts_with('/') {
        value.parse::<ScopeIdentifier>()?
    } else {
        bare(value.to_string())?
    };
    if scope.kind_label() != expected {
        bail!("'{value}' is a {} scope, expected a {expected}", scope.kind_label());
    }
    Ok(scope)
}
