//! Echo Bot Example
//!
//! A small bot showing both handler roles:
//!
//! - `/start`, `/help` and `/echo <text>` are command handlers; exactly one
//!   of them answers a matching message
//! - every other message (including unknown `/commands`) goes to the
//!   generic handlers, which log it and echo it back
//!
//! # Usage
//!
//! ```bash
//! YOAI_API__API_KEY=... cargo run --package echo-bot
//! cargo run --package echo-bot -- --config ./yoai.toml
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use yoai::prelude::*;

#[derive(Debug, Parser)]
#[command(about = "Echo bot for the YoAI bot API")]
struct Args {
    /// Configuration file to load instead of searching for yoai.toml.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile, e.g. "production".
    #[arg(short, long)]
    profile: Option<String>,
}

const HELP_TEXT: &str = "Echo Bot - Commands\n\
    /echo <text> - Echo text\n\
    /help        - This help\n\
    /start       - Show the menu";

// ============================================================================
// Handlers
// ============================================================================

/// Logs every message no command claimed.
async fn log_handler(ctx: Arc<UpdateContext>) {
    info!(
        chat_id = %ctx.chat_id(),
        sender = ctx.message().sender_id().unwrap_or("unknown"),
        text = ctx.text().unwrap_or(""),
        "Message received"
    );
}

/// Sends the text back unchanged.
async fn echo_back(ctx: Arc<UpdateContext>) -> Option<String> {
    ctx.text()
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}

/// Greets the user with a reply keyboard.
async fn start_handler(ctx: Arc<UpdateContext>) -> Result<(), ApiError> {
    let options = [
        ButtonOption::new("Help", "/help"),
        ButtonOption::new("Echo", "/echo hello"),
    ];
    ctx.bot()
        .send_message_with_options(ctx.chat_id(), "Welcome! Pick an option:", &options)
        .await?;
    Ok(())
}

async fn help_handler(_ctx: Arc<UpdateContext>) -> String {
    HELP_TEXT.to_string()
}

async fn echo_handler(ctx: Arc<UpdateContext>) -> String {
    match ctx.args() {
        Some(args) if !args.is_empty() => args.to_string(),
        _ => "Usage: /echo <text>".to_string(),
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = YoaiRuntime::builder();
    if let Some(path) = args.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = args.profile {
        builder = builder.profile(profile);
    }
    let runtime = builder.build()?;

    match runtime.bot().get_bot_info().await {
        Ok(bot_info) => info!(info = ?bot_info, "Connected"),
        Err(e) => error!(error = %e, "Failed to fetch bot info"),
    }

    runtime.on_command("start", start_handler);
    runtime.on_command("help", help_handler);
    runtime.on_command("echo", echo_handler);

    runtime.on_message(log_handler);
    runtime.on_message(echo_back);

    runtime.run().await?;

    Ok(())
}
