use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use tally_core::config::{AppConfig, ConfigError, LoadOptions};
use tally_discord::registrar::CommandRegistrar;
use tally_discord::verify::{PublicKeyError, SignatureVerifier};
use tally_sheets::{SheetsClient, SheetsError};

use crate::routes::AppState;

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
    pub registrar: CommandRegistrar,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("interaction verification key rejected: {0}")]
    PublicKey(#[source] PublicKeyError),
    #[error("spreadsheet session failed: {0}")]
    Sheets(#[from] SheetsError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

/// Builds the application from an already-loaded config. Startup is fail
/// fast: a bad verification key or an unreachable spreadsheet aborts the
/// process rather than serving requests that could never be logged.
pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let verifier = SignatureVerifier::from_hex(&config.discord.public_key)
        .map_err(BootstrapError::PublicKey)?;

    let http_client = reqwest::Client::new();
    let sheets = SheetsClient::connect(http_client.clone(), &config.sheets).await?;

    let registrar = CommandRegistrar::new(http_client, &config.discord);
    if config.discord.guild_id.is_none() {
        warn!(
            event_name = "system.bootstrap.global_commands",
            correlation_id = "bootstrap",
            "no guild configured; global command updates can take up to an hour to appear"
        );
    }

    let state = AppState::new(verifier, Arc::new(sheets));

    info!(
        event_name = "system.bootstrap.complete",
        correlation_id = "bootstrap",
        command_scope = registrar.scope(),
        "application bootstrap complete"
    );

    Ok(Application { config, state, registrar })
}
