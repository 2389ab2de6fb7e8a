//! Testing utilities for the teamkill bot.
//!
//! - [`ManualClock`]: a clock tests move by hand to cross the reset window
//! - actor and event helpers for building [`CommandEvent`]s tersely
//! - [`FailingStore`]: a store whose every operation fails like a broken disk
//! - [`RecordingStore`]: wraps a store and counts mutation attempts

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use teamkill_core::{
    Actor, Clock, CommandEvent, CounterRecord, CounterStore, Delta, Mention, StoreError,
};

/// Channel id used by the event helpers.
pub const TEST_CHANNEL: &str = "test-channel";

// ============================================================================
// Clock
// ============================================================================

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::starting_at(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// Actors and events
// ============================================================================

/// Actor with the platform administrator permission and no roles.
pub fn admin(id: &str) -> Actor {
    Actor::new(id, format!("admin-{id}")).with_admin_permission()
}

/// Actor holding the default `Moderator` role.
pub fn moderator(id: &str) -> Actor {
    Actor::new(id, format!("mod-{id}")).with_role("Moderator")
}

/// Actor with no privileged role.
pub fn member(id: &str) -> Actor {
    Actor::new(id, format!("member-{id}")).with_role("Member")
}

/// An event with no mentions.
pub fn command(actor: Actor, text: &str) -> CommandEvent {
    CommandEvent::new(TEST_CHANNEL, actor, text)
}

/// An event mentioning `user_id` as the target.
pub fn targeted(actor: Actor, text: &str, user_id: &str, display_name: &str) -> CommandEvent {
    command(actor, text).mentioning(Mention::new(user_id, display_name))
}

// ============================================================================
// Stores
// ============================================================================

/// Store that fails every call with an I/O error.
#[derive(Debug, Clone, Default)]
pub struct FailingStore;

impl FailingStore {
    fn error() -> StoreError {
        StoreError::Io(std::io::Error::other("simulated disk failure"))
    }
}

#[async_trait]
impl CounterStore for FailingStore {
    async fn apply_delta(&self, _: &str, _: &str, _: Delta) -> Result<u64, StoreError> {
        Err(Self::error())
    }

    async fn snapshot(&self) -> Result<Vec<CounterRecord>, StoreError> {
        Err(Self::error())
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        Err(Self::error())
    }
}

/// Counts calls into the wrapped store.
#[derive(Debug, Default)]
pub struct RecordingStore<S> {
    inner: S,
    deltas: AtomicUsize,
    clears: AtomicUsize,
}

impl<S> RecordingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            deltas: AtomicUsize::new(0),
            clears: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of `apply_delta` calls, successful or not.
    pub fn delta_calls(&self) -> usize {
        self.deltas.load(Ordering::SeqCst)
    }

    pub fn clear_calls(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    /// Total mutation attempts.
    pub fn mutation_calls(&self) -> usize {
        self.delta_calls() + self.clear_calls()
    }
}

#[async_trait]
impl<S: CounterStore> CounterStore for RecordingStore<S> {
    async fn apply_delta(
        &self,
        user_id: &str,
        display_name: &str,
        delta: Delta,
    ) -> Result<u64, StoreError> {
        self.deltas.fetch_add(1, Ordering::SeqCst);
        self.inner.apply_delta(user_id, display_name, delta).await
    }

    async fn snapshot(&self) -> Result<Vec<CounterRecord>, StoreError> {
        self.inner.snapshot().await
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.inner.clear_all().await
    }
}
