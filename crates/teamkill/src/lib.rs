//! # Teamkill
//!
//! The command core of a chat bot that tracks team kills per user.
//!
//! ## Core Concepts
//!
//! - [`CommandEvent`] = one inbound message, already stripped of gateway types
//! - [`AuthorizationPolicy`] = who may run privileged commands
//! - [`ResetConfirmationMachine`] = pure decisions about destructive resets
//! - [`CounterStore`] = the single, serialized source of truth for counts
//!
//! The key principle: **machines decide, the dispatcher executes**. The reset
//! machine never clears anything itself; it answers [`ConfirmOutcome::Executed`]
//! and the dispatcher performs the wipe against the store.
//!
//! ## Architecture
//!
//! ```text
//! Gateway (Discord, console, ...)
//!     │
//!     ▼ CommandEvent
//! CommandDispatcher.handle()   (one task per event)
//!     │
//!     ├─► Verb::parse() ─► None ─► ignored, no reply
//!     │
//!     ├─► AuthorizationPolicy.is_authorized()  (privileged verbs only)
//!     │
//!     ├─► CounterStore ──────────── apply_delta / snapshot / clear_all
//!     │        (global lock, durable commit before returning)
//!     │
//!     └─► ResetConfirmationMachine ─ request_reset / confirm_reset
//!              │
//!              ▼
//!          Outcome ─► render() ─► Reply
//! ```
//!
//! ## Key Invariants
//!
//! 1. **Counts never go negative** - decrementing at zero is rejected, not clamped
//! 2. **No lost updates** - every store mutation is read-modify-commit under one lock
//! 3. **Commit before reply** - a success reply is only built after the write is durable
//! 4. **Fresh authorization** - roles are checked on every privileged command
//! 5. **Per-actor resets** - one admin's confirmation never resolves another's request
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use teamkill_core::{Actor, BotConfig, CommandDispatcher, CommandEvent, Mention};
//! use teamkill_persistence::JsonFileStore;
//!
//! let config = BotConfig::default().with_env()?;
//! let store = Arc::new(JsonFileStore::new(&config.data_file));
//! let dispatcher = Arc::new(CommandDispatcher::new(store, config.policy()));
//!
//! let event = CommandEvent::new("general", Actor::new("1", "mod").with_role("Moderator"), "!addtk")
//!     .mentioning(Mention::new("42", "Alice"));
//!
//! if let Some(reply) = dispatcher.handle(&event).await? {
//!     gateway.send(&reply.channel_id, &reply.text).await?;
//! }
//! ```
//!
//! ## What This Is Not
//!
//! Not an audit log: only current counts are kept, never history.

mod auth;
mod clock;
mod command;
mod config;
mod dispatcher;
mod error;
mod event;
mod render;
mod reset;
mod store;

pub use auth::{AuthorizationPolicy, DEFAULT_ADMIN_ROLES};
pub use clock::{Clock, SystemClock};
pub use command::Verb;
pub use config::{BotConfig, ENV_ADMIN_ROLES, ENV_DATA_FILE};
pub use dispatcher::CommandDispatcher;
pub use error::{ConfigError, DispatchError, StoreError};
pub use event::{Actor, CommandEvent, Mention, Reply};
pub use render::{leaderboard, render, tk_count, Outcome, HELP_MESSAGE, NO_DATA_MESSAGE};
pub use reset::{
    confirmation_window, ConfirmOutcome, ResetConfirmationMachine, CONFIRMATION_WINDOW_SECS,
};
pub use store::{CounterRecord, CounterStore, CounterTable, Delta, MemoryCounterStore, StoredCounter};

// Re-export commonly used external types
pub use async_trait::async_trait;
