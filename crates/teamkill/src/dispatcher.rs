//! Routes command events to the policy, the reset machine and the store.
//!
//! ```text
//! CommandEvent
//!     │ Verb::parse()
//!     ▼
//! privileged? ──► AuthorizationPolicy ──deny──► Outcome::Denied
//!     │
//!     ├─► add/sub ─────► CounterStore::apply_delta
//!     ├─► showtotals ──► CounterStore::snapshot
//!     ├─► resettks ────► ResetConfirmationMachine::request_reset
//!     └─► confirmreset ► ResetConfirmationMachine::confirm_reset
//!                              │ Executed
//!                              ▼
//!                        CounterStore::clear_all
//! ```
//!
//! One dispatcher is shared by every in-flight event. It holds no lock of
//! its own; the store and the reset machine serialize their own state.

use std::sync::Arc;

use tracing::{debug, error, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::auth::AuthorizationPolicy;
use crate::clock::{Clock, SystemClock};
use crate::command::Verb;
use crate::error::{DispatchError, StoreError};
use crate::event::{CommandEvent, Mention, Reply};
use crate::render::{render, Outcome};
use crate::reset::{ConfirmOutcome, ResetConfirmationMachine};
use crate::store::{CounterStore, Delta};

pub struct CommandDispatcher {
    store: Arc<dyn CounterStore>,
    policy: AuthorizationPolicy,
    resets: ResetConfirmationMachine,
    clock: Arc<dyn Clock>,
}

impl CommandDispatcher {
    /// Create a dispatcher using wall-clock time.
    pub fn new(store: Arc<dyn CounterStore>, policy: AuthorizationPolicy) -> Self {
        Self {
            store,
            policy,
            resets: ResetConfirmationMachine::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &Arc<dyn CounterStore> {
        &self.store
    }

    pub fn policy(&self) -> &AuthorizationPolicy {
        &self.policy
    }

    pub fn resets(&self) -> &ResetConfirmationMachine {
        &self.resets
    }

    /// Handle one event and build the reply, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the store fails to read or commit. No
    /// reply must be sent in that case; the failure is logged here.
    pub async fn handle(&self, event: &CommandEvent) -> Result<Option<Reply>, DispatchError> {
        let command_id = Uuid::new_v4();
        let span = info_span!(
            "command",
            %command_id,
            actor = %event.actor.id,
            channel = %event.channel_id,
            verb = tracing::field::Empty,
        );

        let result = self.dispatch(event).instrument(span.clone()).await;
        match result {
            Ok(outcome) => Ok(render(&outcome).map(|text| Reply {
                channel_id: event.channel_id.clone(),
                text,
            })),
            Err(err) => {
                span.in_scope(|| error!(error = %err, "command aborted, no reply sent"));
                Err(err)
            }
        }
    }

    /// Decide and apply the effect of one event without rendering it.
    pub async fn dispatch(&self, event: &CommandEvent) -> Result<Outcome, DispatchError> {
        let Some(verb) = Verb::parse(&event.text) else {
            debug!("not a command");
            return Ok(Outcome::Ignored);
        };
        Span::current().record("verb", verb.trigger());
        debug!(%verb, "parsed command");

        if verb.is_privileged() && !self.policy.is_authorized(&event.actor) {
            warn!(%verb, "privileged command denied");
            return Ok(Outcome::Denied(verb));
        }

        let target = event.target().filter(|_| verb.needs_target());
        match (verb, target) {
            (Verb::AddKill, Some(target)) => self.adjust(target, Delta::Increment).await,
            (Verb::SubKill, Some(target)) => self.adjust(target, Delta::Decrement).await,
            (Verb::AddKill | Verb::SubKill, None) => Ok(Outcome::MissingTarget(verb)),
            (Verb::ShowTotals, _) => Ok(Outcome::Leaderboard(self.store.snapshot().await?)),
            (Verb::RequestReset, _) => {
                self.resets.request_reset(&event.actor.id, self.clock.now());
                info!("reset requested, awaiting confirmation");
                Ok(Outcome::ResetRequested)
            }
            (Verb::ConfirmReset, _) => self.confirm_reset(&event.actor.id).await,
            (Verb::Help, _) => Ok(Outcome::Help),
        }
    }

    async fn adjust(&self, target: &Mention, delta: Delta) -> Result<Outcome, DispatchError> {
        let result = self
            .store
            .apply_delta(&target.user_id, &target.display_name, delta)
            .await;

        match (result, delta) {
            (Ok(count), Delta::Increment) => {
                info!(user = %target.user_id, count, "kill added");
                Ok(Outcome::KillAdded {
                    target: target.clone(),
                    count,
                })
            }
            (Ok(count), Delta::Decrement) => {
                info!(user = %target.user_id, count, "kill subtracted");
                Ok(Outcome::KillSubtracted {
                    target: target.clone(),
                    count,
                })
            }
            (Err(StoreError::NothingToSubtract { tracked, .. }), _) => {
                debug!(user = %target.user_id, tracked, "nothing to subtract");
                Ok(Outcome::NothingToSubtract {
                    target: target.clone(),
                    tracked,
                })
            }
            (Err(err), _) => Err(err.into()),
        }
    }

    async fn confirm_reset(&self, actor_id: &str) -> Result<Outcome, DispatchError> {
        match self.resets.confirm_reset(actor_id, self.clock.now()) {
            ConfirmOutcome::Executed => {
                self.store.clear_all().await?;
                info!("all counters cleared");
                Ok(Outcome::ResetExecuted)
            }
            ConfirmOutcome::Expired => {
                warn!("reset confirmation arrived after the window");
                Ok(Outcome::ResetExpired)
            }
            ConfirmOutcome::NoPendingRequest => Ok(Outcome::NoPendingReset),
        }
    }
}
