//! Error types for the command core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by [`CounterStore`](crate::CounterStore) implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Decrement requested for a user that is untracked or already at zero.
    /// The store is left unchanged. `tracked` is false when no record exists.
    #[error("user {user_id} has nothing to subtract")]
    NothingToSubtract { user_id: String, tracked: bool },

    #[error("counter store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted state could not be decoded.
    #[error("counter data at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("counter state could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),

    /// Failure reported by a database-backed store.
    #[error("counter store backend failed: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The blocking worker running the operation panicked or was cancelled.
    #[error("counter store task failed: {0}")]
    Task(String),
}

impl StoreError {
    /// Wrap any backend error.
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Backend(Box::new(err))
    }

    /// True when the failure concerns durability rather than a business rule.
    pub fn is_persistence_failure(&self) -> bool {
        !matches!(self, StoreError::NothingToSubtract { .. })
    }
}

/// A command was aborted and no reply must be sent.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("command aborted: {0}")]
    Store(#[from] StoreError),
}

/// Errors loading [`BotConfig`](crate::BotConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
