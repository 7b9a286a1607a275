mod bootstrap;
pub mod routes;

use anyhow::Result;
use tally_core::config::{AppConfig, LoadOptions};
use tally_discord::commands::command_catalog;

fn init_logging(config: &AppConfig) {
    use tally_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    // Command registration is best effort. Discord keeps serving the
    // previously registered set, so a failed update must not stop the server.
    if let Err(error) = app.registrar.register(&command_catalog()).await {
        tracing::error!(
            event_name = "discord.commands.register_failed",
            correlation_id = "bootstrap",
            error = %error,
            "command registration failed; continuing with the previously registered set"
        );
    }

    let address = format!("{}:{}", app.config.http.bind_address, app.config.http.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "interaction endpoint listening"
    );

    let router = routes::router(app.state);
    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router).await {
            tracing::error!(
                event_name = "system.server.error",
                correlation_id = "bootstrap",
                error = %error,
                "interaction endpoint terminated unexpectedly"
            );
        }
    });

    wait_for_shutdown().await?;
    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "tally-server stopping"
    );

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
