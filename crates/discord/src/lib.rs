//! Discord Integration - interaction webhook interface
//!
//! This crate provides the Discord side of tally:
//! - **Interactions** (`interaction`) - typed webhook payloads and responses
//! - **Verification** (`verify`) - Ed25519 request authentication
//! - **Commands** (`commands`) - `/start`, `/end`, `/work_done` catalog and routing
//! - **Registrar** (`registrar`) - startup bulk command registration
//!
//! # Getting Started
//!
//! 1. Create an application at https://discord.com/developers/applications
//! 2. Point its Interactions Endpoint URL at `POST /interactions`
//! 3. Set env vars: `TALLY_DISCORD_PUBLIC_KEY`, `TALLY_DISCORD_BOT_TOKEN`,
//!    `TALLY_DISCORD_APPLICATION_ID` (and `TALLY_DISCORD_GUILD_ID` for
//!    instant guild-scoped registration)
//!
//! # Architecture
//!
//! ```text
//! Interaction → SignatureVerifier → classify_command → CommandRouter → WorkLogSink
//!                                                           ↓
//!                                              InteractionResponse ← content
//! ```
//!
//! # Key Types
//!
//! - `SignatureVerifier` - fail-closed header check over the raw body
//! - `Interaction` / `InteractionResponse` - the webhook wire shapes
//! - `CommandRouter` - maps commands to work-log writes and confirmations
//! - `CommandRegistrar` - idempotent full replace of the command set

pub mod commands;
pub mod interaction;
pub mod registrar;
pub mod verify;
