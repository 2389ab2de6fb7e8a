//! # Console Bot Demo
//!
//! Drives the teamkill dispatcher from stdin instead of a chat gateway.
//! Each line is one JSON `CommandEvent`; each event runs on its own task,
//! the same way a gateway client would hand them over.
//!
//! ```text
//! $ cargo run -p console-bot-demo -- bot.json
//! {"channel_id":"general","actor":{"id":"1","roles":["Moderator"]},"text":"!addtk <@42>","mentions":[{"user_id":"42","display_name":"Alice"}]}
//! [general] ✅ One kill added to <@42>'s total. <@42> now has **1 TK**.
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use teamkill_core::{BotConfig, CommandDispatcher, CommandEvent};
use teamkill_persistence::JsonFileStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Setup
// ============================================================================

fn load_config() -> Result<BotConfig> {
    let base = match std::env::args().nth(1) {
        Some(path) => BotConfig::from_file(Path::new(&path))?,
        None => BotConfig::default(),
    };
    Ok(base.with_env()?)
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config().context("loading configuration")?;
    tracing::info!(data_file = %config.data_file.display(), "starting console bot");

    let store = Arc::new(JsonFileStore::new(&config.data_file));
    let dispatcher = Arc::new(CommandDispatcher::new(store, config.policy()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks = JoinSet::new();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let event: CommandEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed event");
                continue;
            }
        };

        let dispatcher = Arc::clone(&dispatcher);
        tasks.spawn(async move {
            // Failures are already logged by the dispatcher; nothing is sent.
            if let Ok(Some(reply)) = dispatcher.handle(&event).await {
                println!("[{}] {}", reply.channel_id, reply.text);
            }
        });

        // Reap finished tasks so a long session does not accumulate them.
        while let Some(joined) = tasks.try_join_next() {
            joined.context("command task panicked")?;
        }
    }

    while let Some(joined) = tasks.join_next().await {
        joined.context("command task panicked")?;
    }

    Ok(())
}
