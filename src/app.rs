//! One refresh run: access_token -> jsapi_ticket -> share script patch.
//!
//! Each step returns a `Result`; the first failure ends the run, so the ticket
//! is never requested without a token and the file is never touched without a
//! ticket. `exit_status` maps the finished run to the process exit code.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::{Config, ConfigError};
use crate::patch::{AssetPatcher, DEFAULT_VARIABLE, PatchError, PatchOutcome};
use crate::signature::SignaturePackage;
use crate::token::{self, WxClient};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to get access_token: {0}")]
    Token(#[source] token::Error),

    #[error("failed to get jsapi_ticket: {0}")]
    Ticket(#[source] token::Error),

    #[error("failed to update share script: {0}")]
    Patch(#[from] PatchError),
}

impl AppError {
    /// errcode guidance for platform-reported failures
    pub fn explain(&self) -> Option<String> {
        match self {
            AppError::Token(e) | AppError::Ticket(e) => e.explain(),
            _ => None,
        }
    }
}

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub ticket: String,
    pub outcome: PatchOutcome,
    pub asset_path: PathBuf,
    /// Present when a share URL was configured
    pub signature: Option<SignaturePackage>,
}

/// Exit status for a run that failed
pub const EXIT_FAILURE: u8 = 1;

/// Process exit status: 0 on success, including a script without the
/// assignment line; `EXIT_FAILURE` on any error.
pub fn exit_status(result: &Result<RunReport, AppError>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => EXIT_FAILURE,
    }
}

/// Load configuration from the process environment, then run every step
pub async fn run_from_env() -> Result<RunReport, AppError> {
    run_from_lookup(|key| std::env::var(key).ok()).await
}

/// Load configuration through `lookup`, then run every step.
/// A configuration error returns before any client is built.
pub async fn run_from_lookup<F>(lookup: F) -> Result<RunReport, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let config = Config::from_lookup(lookup)?;
    run(&config).await
}

/// Run every step against the configured API base
pub async fn run(config: &Config) -> Result<RunReport, AppError> {
    let client = WxClient::new(&config.api_base).map_err(AppError::Token)?;
    run_with(&client, config).await
}

/// Run every step with an existing client
#[instrument(level = "debug", skip_all, fields(appid = %config.app_id_hint()))]
pub async fn run_with(client: &WxClient, config: &Config) -> Result<RunReport, AppError> {
    // Build the patcher first so a bad variable pattern fails before any request
    let patcher = AssetPatcher::new(&config.asset_path, DEFAULT_VARIABLE)?;

    let token = client
        .get_access_token(&config.app_id, &config.app_secret)
        .await
        .map_err(AppError::Token)?;
    info!("access_token acquired");

    let ticket = client
        .get_jsapi_ticket(&token.access_token)
        .await
        .map_err(AppError::Ticket)?;
    info!(expires_in = ticket.expires_in, "jsapi_ticket acquired: {}", ticket.ticket);

    let outcome = patcher.patch(&ticket.ticket)?;
    match outcome {
        PatchOutcome::Updated { .. } => {
            info!("{} updated", patcher.path().display())
        }
        PatchOutcome::AlreadyCurrent => {
            info!("{} already holds this ticket", patcher.path().display())
        }
        PatchOutcome::NoMatch => warn!(
            "{} has no jsapi_ticket assignment; not updated",
            patcher.path().display()
        ),
    }

    let signature = config.share_url.as_deref().map(|url| {
        let pkg = SignaturePackage::new(&ticket.ticket, url);
        info!(
            url = %pkg.url,
            nonce_str = %pkg.nonce_str,
            timestamp = pkg.timestamp,
            signature = %pkg.signature,
            "signed share url"
        );
        pkg
    });

    Ok(RunReport {
        ticket: ticket.ticket,
        outcome,
        asset_path: config.asset_path.clone(),
        signature,
    })
}
