use reqwest::header;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::info;

use tally_core::config::DiscordConfig;

use crate::commands::CommandDefinition;

pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

#[derive(Debug, Error)]
pub enum RegistrarError {
    #[error("command registration request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("command registration rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// One-shot bulk registration of the command catalog at startup. Guild-scoped
/// when a guild id is configured (near-instant propagation), global otherwise.
pub struct CommandRegistrar {
    client: reqwest::Client,
    bot_token: SecretString,
    application_id: String,
    guild_id: Option<String>,
}

impl CommandRegistrar {
    pub fn new(client: reqwest::Client, config: &DiscordConfig) -> Self {
        Self {
            client,
            bot_token: config.bot_token.clone(),
            application_id: config.application_id.clone(),
            guild_id: config.guild_id.clone(),
        }
    }

    pub fn registration_url(&self) -> String {
        match &self.guild_id {
            Some(guild_id) => format!(
                "{DISCORD_API_BASE}/applications/{}/guilds/{guild_id}/commands",
                self.application_id
            ),
            None => format!("{DISCORD_API_BASE}/applications/{}/commands", self.application_id),
        }
    }

    pub fn scope(&self) -> &'static str {
        if self.guild_id.is_some() {
            "guild"
        } else {
            "global"
        }
    }

    /// Overwrites the full command set with a bulk PUT. The platform answers
    /// 200 or 201 on success; anything else is reported to the caller, which
    /// decides whether to keep running.
    pub async fn register(&self, commands: &[CommandDefinition]) -> Result<(), RegistrarError> {
        let response = self
            .client
            .put(self.registration_url())
            .header(
                header::AUTHORIZATION,
                format!("Bot {}", self.bot_token.expose_secret()),
            )
            .json(commands)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 200 || status.as_u16() == 201 {
            info!(
                event_name = "discord.commands.registered",
                scope = self.scope(),
                count = commands.len(),
                "slash commands registered"
            );
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(RegistrarError::Rejected { status: status.as_u16(), body })
    }
}
