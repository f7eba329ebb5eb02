//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use rolecheck_core::AssignmentKind;

use crate::logging::LogFormat;
use crate::preview::FetchFailurePolicy;

/// Preview which inherited role and policy assignments a subscription loses
/// and gains when it moves to another management group.
#[derive(Parser, Debug, Default)]
#[command(name = "rolecheck", version, about, long_about = None)]
pub struct Cli {
    /// Subscription to move (id or `/subscriptions/{id}`); blank uses the default subscription.
    #[arg(long, env = "ROLECHECK_SUBSCRIPTION", value_name = "ID")]
    pub subscription: Option<String>,

    /// Management group the subscription is in now.
    #[arg(long = "current-mg", env = "ROLECHECK_CURRENT_MG", value_name = "ID")]
    pub current_mg: Option<String>,

    /// Management group the subscription would move to.
    #[arg(long = "target-mg", env = "ROLECHECK_TARGET_MG", value_name = "ID")]
    pub target_mg: Option<String>,

    /// Assignment kinds to compare, comma separated [default: role,policy].
    #[arg(long, env = "ROLECHECK_KINDS", value_delimiter = ',', value_name = "KIND")]
    pub kinds: Vec<AssignmentKind>,

    /// What to do when a scope cannot be fetched.
    #[arg(long, env = "ROLECHECK_ON_FETCH_ERROR", value_enum, value_name = "POLICY")]
    pub on_fetch_error: Option<FetchFailurePolicy>,

    /// Output JSON instead of human-readable format.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// TOML configuration file.
    #[arg(long, env = "ROLECHECK_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Management API endpoint.
    #[arg(long, env = "ROLECHECK_ARM_ENDPOINT", value_name = "URL")]
    pub arm_endpoint: Option<String>,

    /// Identity provider used for client secret sign-in.
    #[arg(long, env = "ROLECHECK_AUTHORITY_HOST", value_name = "URL")]
    pub authority_host: Option<String>,

    /// Log output format on stderr.
    #[arg(long, env = "ROLECHECK_LOG_FORMAT", value_enum, value_name = "FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Never prompt for missing management groups.
    #[arg(long, default_value_t = false)]
    pub no_input: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}
