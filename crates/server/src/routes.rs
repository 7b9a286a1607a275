//! Interaction webhook routes.
//!
//! Endpoints:
//! - `GET  /`             — liveness probe with a fixed status string
//! - `POST /interactions` — signed interaction callbacks (ping and slash commands)
//!
//! Every callback is verified against the application public key before the
//! body is parsed. Command handling never fails the HTTP exchange: sink
//! errors are rendered into the message content so the caller still receives
//! a well-formed response.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use tally_core::worklog::WorkLogSink;
use tally_discord::commands::{classify_command, CommandRouter, WorkCommand};
use tally_discord::interaction::{Interaction, InteractionKind, InteractionResponse};
use tally_discord::verify::SignatureVerifier;

pub const STATUS_MESSAGE: &str = "✅ Bot server is running!";

const TIMESTAMP_HEADER: &str = "x-signature-timestamp";
const SIGNATURE_HEADER: &str = "x-signature-ed25519";

#[derive(Clone)]
pub struct AppState {
    verifier: SignatureVerifier,
    commands: Arc<CommandRouter>,
}

impl AppState {
    pub fn new(verifier: SignatureVerifier, sink: Arc<dyn WorkLogSink>) -> Self {
        Self { verifier, commands: Arc::new(CommandRouter::new(sink)) }
    }
}

#[derive(Debug, Serialize)]
pub struct InteractionError {
    pub error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/interactions", post(interactions))
        .with_state(state)
}

async fn index() -> &'static str {
    STATUS_MESSAGE
}

/// Receives one interaction callback. The raw body is kept as bytes until the
/// signature check passes, since the signature covers the exact wire bytes.
async fn interactions(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<InteractionResponse>, (StatusCode, Json<InteractionError>)> {
    let correlation_id = Uuid::new_v4();

    let timestamp = headers.get(TIMESTAMP_HEADER).and_then(|value| value.to_str().ok());
    let signature = headers.get(SIGNATURE_HEADER).and_then(|value| value.to_str().ok());
    if !state.verifier.verify_request(timestamp, signature, &body) {
        warn!(
            event_name = "discord.interaction.unauthorized",
            correlation_id = %correlation_id,
            "rejecting interaction callback with a bad signature"
        );
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(InteractionError { error: "invalid request signature".to_string() }),
        ));
    }

    let interaction: Interaction = serde_json::from_slice(&body).map_err(|error| {
        warn!(
            event_name = "discord.interaction.malformed",
            correlation_id = %correlation_id,
            error = %error,
            "signed interaction payload did not parse"
        );
        (
            StatusCode::BAD_REQUEST,
            Json(InteractionError { error: "malformed interaction payload".to_string() }),
        )
    })?;

    match interaction.kind {
        InteractionKind::Ping => {
            info!(
                event_name = "discord.interaction.ping",
                correlation_id = %correlation_id,
                "acknowledging ping"
            );
            Ok(Json(InteractionResponse::pong()))
        }
        InteractionKind::ApplicationCommand => {
            Ok(Json(handle_command(&state, &interaction, correlation_id).await))
        }
        InteractionKind::Unsupported(kind) => {
            warn!(
                event_name = "discord.interaction.unsupported",
                correlation_id = %correlation_id,
                interaction_type = kind,
                "received an interaction type the service does not handle"
            );
            Ok(Json(InteractionResponse::message("Unsupported interaction type")))
        }
    }
}

async fn handle_command(
    state: &AppState,
    interaction: &Interaction,
    correlation_id: Uuid,
) -> InteractionResponse {
    let display_name = interaction.display_name();
    let command = match interaction.data.as_ref() {
        Some(data) => classify_command(data),
        None => WorkCommand::Unknown { name: String::new() },
    };

    info!(
        event_name = "discord.interaction.command",
        correlation_id = %correlation_id,
        command = interaction.command_name().unwrap_or("unknown"),
        display_name = %display_name,
        "dispatching slash command"
    );

    match state.commands.route(command, &display_name).await {
        Ok(content) => InteractionResponse::message(content),
        Err(source) => {
            error!(
                event_name = "discord.interaction.command_failed",
                correlation_id = %correlation_id,
                error = %source,
                "command handling failed"
            );
            InteractionResponse::message(format!("❌ Error: {source}"))
        }
    }
}
