//! Two-step confirmation for wiping all counters.
//!
//! The machine only decides. It never touches the counter store; a
//! [`ConfirmOutcome::Executed`] result tells the caller to perform the wipe.
//!
//! ```text
//! NoPendingReset ──request──► Pending(t)
//! Pending(t)     ──request──► Pending(t')       (replaces t, no error)
//! Pending(t)     ──confirm, now - t <= window──► NoPendingReset  => Executed
//! Pending(t)     ──confirm, now - t >  window──► NoPendingReset  => Expired
//! NoPendingReset ──confirm──► NoPendingReset                     => NoPendingRequest
//! ```

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// How long a reset request stays confirmable, in seconds from the request.
pub const CONFIRMATION_WINDOW_SECS: i64 = 30;

/// [`CONFIRMATION_WINDOW_SECS`] as a duration.
pub fn confirmation_window() -> Duration {
    Duration::seconds(CONFIRMATION_WINDOW_SECS)
}

/// Result of a confirmation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Confirmed in time. The caller must clear the counter store.
    Executed,
    /// Confirmed too late. The request is discarded and nothing is cleared.
    Expired,
    /// The actor has no outstanding request.
    NoPendingRequest,
}

/// Tracks at most one pending reset request per actor.
///
/// Entries are independent per actor and live only for the process lifetime.
/// Expiry is evaluated lazily at confirm time, so an abandoned request simply
/// sits in the map until its actor confirms or requests again.
#[derive(Debug, Default)]
pub struct ResetConfirmationMachine {
    pending: DashMap<String, DateTime<Utc>>,
}

impl ResetConfirmationMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reset request, replacing any earlier one from the same actor.
    pub fn request_reset(&self, actor_id: &str, now: DateTime<Utc>) {
        if let Some(previous) = self.pending.insert(actor_id.to_owned(), now) {
            tracing::debug!(actor = actor_id, %previous, "superseded pending reset");
        }
    }

    /// Resolve the actor's pending request, consuming it.
    pub fn confirm_reset(&self, actor_id: &str, now: DateTime<Utc>) -> ConfirmOutcome {
        match self.pending.remove(actor_id) {
            None => ConfirmOutcome::NoPendingRequest,
            Some((_, requested_at)) if now - requested_at > confirmation_window() => {
                ConfirmOutcome::Expired
            }
            Some(_) => ConfirmOutcome::Executed,
        }
    }

    /// When the actor's outstanding request was made, if any.
    pub fn pending_since(&self, actor_id: &str) -> Option<DateTime<Utc>> {
        self.pending.get(actor_id).map(|entry| *entry.value())
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
