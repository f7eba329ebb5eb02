//! Rolecheck Auth - bearer tokens for the Azure Resource Manager API
//!
//! This crate provides just enough credential handling to call the management
//! API:
//!
//! - **Static token**: a pre-issued bearer token (`AZURE_ACCESS_TOKEN`)
//! - **Client secret**: OAuth 2.0 client credentials grant for a service principal
//! - **Azure CLI**: reuse the signed-in `az` session
//! - **Default chain**: pick the first of the above that is configured
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use rolecheck_auth::{CredentialOptions, DefaultCredential, TokenCredential};
//!
//! let credential = DefaultCredential::from_env(CredentialOptions::default())?;
//! let token = credential.get_token().await?;
//! let header = token.authorization_header();
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod azure_cli;
mod client_secret;
mod credential;
mod error;
mod token;

pub use azure_cli::*;
pub use client_secret::*;
pub use credential::*;
pub use error::*;
pub use token::*;

use std::time::Duration;

/// Resource id of the management API (v1 style, used by the Azure CLI).
pub const ARM_RESOURCE: &str = "https://management.azure.com/";

/// OAuth scope of the management API (v2 style).
pub const ARM_SCOPE: &str = "https://management.azure.com/.default";

/// Default Microsoft Entra ID authority host.
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Refresh cached tokens when less than this time remains.
pub const DEFAULT_REFRESH_THRESHOLD: Duration = Duration::from_secs(300);

/// Environment variable holding a pre-issued bearer token.
pub const ENV_ACCESS_TOKEN: &str = "AZURE_ACCESS_TOKEN";
/// Environment variable holding the tenant id for client secret auth.
pub const ENV_TENANT_ID: &str = "AZURE_TENANT_ID";
/// Environment variable holding the client id for client secret auth.
pub const ENV_CLIENT_ID: &str = "AZURE_CLIENT_ID";
/// Environment variable holding the client secret.
pub const ENV_CLIENT_SECRET: &str = "AZURE_CLIENT_SECRET";
