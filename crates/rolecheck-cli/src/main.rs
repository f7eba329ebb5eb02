//! `rolecheck` - preview role and policy changes for a management group move.
//!
//! # Usage
//!
//! ```text
//! # Human-readable output
//! rolecheck --subscription <id> --current-mg mg-legacy --target-mg mg-platform
//!
//! # JSON output, roles only, stop on the first failed fetch
//! rolecheck --current-mg mg-legacy --target-mg mg-platform --kinds role --json --on-fetch-error abort
//!
//! # Settings from a file; missing management groups are prompted for
//! rolecheck --config rolecheck.toml
//! ```
//!
//! Exit codes: 0 when the preview was printed (even with degraded fetches),
//! 1 on a runtime failure or an aborted fetch, 2 on invalid input.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

mod cli;
mod config;
mod logging;
mod preview;
mod prompt;
mod render;

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use rolecheck_arm::{ArmClient, AssignmentSource};
use rolecheck_auth::DefaultCredential;
use rolecheck_core::ScopeIdentifier;
use tracing::{error, info, warn};

use cli::Cli;
use config::Settings;
use preview::MovePlan;

/// Invalid flags, config or ids.
const EXIT_USAGE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (settings, current, target) = match prepare(&cli) {
        Ok(prepared) => prepared,
        Err(err) => {
            eprintln!("Error: {err:#}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    match run(settings, current, target).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{err:#}"), "rolecheck failed");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Everything that can be checked without the network.
fn prepare(cli: &Cli) -> Result<(Settings, ScopeIdentifier, ScopeIdentifier)> {
    let settings = Settings::load(cli)?;
    logging::init(cli.verbose, settings.log_level.as_deref(), settings.log_format)?;

    let stdin = io::stdin();
    let mut stderr = io::stderr();
    let (current, target) = settings.management_groups(&mut stdin.lock(), &mut stderr)?;
    Ok((settings, current, target))
}

async fn run(settings: Settings, current: ScopeIdentifier, target: ScopeIdentifier) -> Result<()> {
    let credential = DefaultCredential::from_env(settings.credentials.clone())
        .context("Failed to set up Azure credentials")?;
    info!(source = credential.source(), "Using credential");

    let client = ArmClient::new(settings.arm.clone(), credential)?;

    let subscription = match settings.subscription {
        Some(subscription) => subscription,
        None => {
            let id = client
                .default_subscription()
                .await
                .context("Could not resolve the default subscription; pass --subscription")?;
            ScopeIdentifier::subscription(id)?
        }
    };

    let plan = MovePlan {
        subscription,
        current,
        target,
        kinds: settings.kinds,
        on_fetch_error: settings.on_fetch_error,
    };
    info!(
        subscription = %plan.subscription,
        current = %plan.current,
        target = %plan.target,
        "Previewing move"
    );

    if !settings.json {
        render::write_progress(&mut io::stderr().lock(), &plan)?;
    }

    let report = preview::preview(&client, &plan).await?;
    if report.is_degraded() {
        warn!("Some scopes could not be fetched; the preview may list spurious changes");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if settings.json {
        render::write_json(&mut out, &report)?;
    } else {
        render::write_human(&mut out, &report)?;
    }
    out.flush()?;
    Ok(())
}
