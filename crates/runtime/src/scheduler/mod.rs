//! Action scheduler: one countdown-driven, cancellable action per actor.
//!
//! A pending action waits `warmup` ticks, emitting a countdown notice every
//! period, then runs its effect. Each period the scheduler checks, in order:
//!
//! 1. the actor is still reachable (otherwise the entry is dropped silently),
//! 2. the actor has not moved beyond tolerance (otherwise it is interrupted),
//! 3. the countdown reached zero (the effect runs).
//!
//! Every exit removes the entry and cancels its timer in the same step.
mod types;

pub use types::{
    Effect, Resolution, ScheduleOutcome, Ticket, TicketStatus, WarmupEnd, WarmupRequest,
};

use std::collections::HashMap;

use tracing::{debug, trace, warn};
use waystone_core::{ActorId, CoordConfig, EffectError, Position, Tick};

use crate::outcome::CancelOutcome;
use crate::session::{Notice, SessionEnv};
use crate::timer::{TimerHandle, TimerQueue};
use types::PendingAction;

/// A pending action that left the table during [`ActionScheduler::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarmupReport {
    pub actor: ActorId,
    pub end: WarmupEnd,
}

enum Step {
    Stale,
    Disconnected,
    Interrupted,
    Complete,
    Countdown,
}

/// Owner of the pending-action table and its timers.
pub struct ActionScheduler {
    pending: HashMap<ActorId, PendingAction>,
    timers: TimerQueue<ActorId>,
    period: u64,
    move_tolerance: f64,
}

impl ActionScheduler {
    pub fn new(countdown_period_ticks: u64, move_tolerance: f64) -> Self {
        Self {
            pending: HashMap::new(),
            timers: TimerQueue::new(),
            period: countdown_period_ticks.max(1),
            move_tolerance,
        }
    }

    pub fn from_config(config: &CoordConfig) -> Self {
        Self::new(
            u64::from(config.countdown_period_ticks),
            config.move_tolerance,
        )
    }

    /// Starts a delayed action for `request.actor`.
    ///
    /// A zero warmup runs `effect` synchronously and arms nothing; a failing
    /// or panicking effect is logged and still reported as `Success`. An actor
    /// that already has a pending action is rejected and `effect` is dropped
    /// without running.
    pub fn schedule<F>(&mut self, request: WarmupRequest, effect: F, now: Tick) -> ScheduleOutcome
    where
        F: FnOnce(ActorId, &Position) -> Result<(), EffectError> + Send + 'static,
    {
        let actor = request.actor;
        if self.pending.contains_key(&actor) {
            debug!(%actor, "warmup rejected: already pending");
            return ScheduleOutcome::AlreadyPending;
        }

        if request.warmup_ticks == 0 {
            if let Err(error) = EffectError::catch_panic(|| effect(actor, &request.target)) {
                warn!(%actor, %error, "immediate action effect failed");
            }
            return ScheduleOutcome::Success;
        }

        let remaining = request.warmup_ticks.div_ceil(self.period);
        let timer = self.timers.schedule_repeating(actor, now, self.period);
        let (resolver, ticket) = Ticket::channel();

        self.pending.insert(
            actor,
            PendingAction {
                target: request.target,
                remaining,
                interrupt_on_move: request.interrupt_on_move,
                origin: request.origin,
                effect: Box::new(effect),
                resolver,
                timer,
            },
        );
        debug!(%actor, remaining, "warmup started");
        ScheduleOutcome::WarmupStarted(ticket)
    }

    /// Removes the actor's pending action without running or resolving it.
    ///
    /// Callers send their own notice if they want one.
    pub fn cancel(&mut self, actor: ActorId) -> CancelOutcome {
        match self.remove(actor) {
            Some(_) => {
                debug!(%actor, "warmup cancelled");
                CancelOutcome::Cancelled
            }
            None => CancelOutcome::NothingToCancel,
        }
    }

    /// Cleanup path for a disconnecting actor.
    pub fn disconnect(&mut self, actor: ActorId) -> bool {
        self.remove(actor).is_some()
    }

    pub fn is_pending(&self, actor: ActorId) -> bool {
        self.pending.contains_key(&actor)
    }

    /// Countdown steps left for the actor's pending action.
    pub fn remaining(&self, actor: ActorId) -> Option<u64> {
        self.pending.get(&actor).map(|entry| entry.remaining)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Armed timers. Always equal to [`Self::pending_count`].
    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Drops every pending action and disarms all timers.
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        self.timers.clear();
        dropped
    }

    /// Advances every pending action whose timer is due at `now`.
    pub fn tick(&mut self, now: Tick, env: SessionEnv<'_>) -> Vec<WarmupReport> {
        let mut reports = Vec::new();

        for fired in self.timers.poll(now) {
            let actor = fired.key;
            match self.step_for(actor, fired.handle, env) {
                Step::Stale => {
                    trace!(%actor, timer = fired.handle.id(), "stale warmup timer ignored");
                }
                Step::Disconnected => {
                    self.remove(actor);
                    debug!(%actor, "warmup dropped: actor unreachable");
                    reports.push(WarmupReport {
                        actor,
                        end: WarmupEnd::Disconnected,
                    });
                }
                Step::Interrupted => {
                    if let Some(entry) = self.remove(actor) {
                        env.notifier.notify(actor, Notice::WarmupInterrupted);
                        let _ = entry.resolver.send(Resolution::Interrupted);
                        debug!(%actor, "warmup interrupted by movement");
                        reports.push(WarmupReport {
                            actor,
                            end: WarmupEnd::Interrupted,
                        });
                    }
                }
                Step::Complete => {
                    if let Some(entry) = self.remove(actor) {
                        let end = Self::complete(actor, entry, env);
                        reports.push(WarmupReport { actor, end });
                    }
                }
                Step::Countdown => {
                    if let Some(entry) = self.pending.get_mut(&actor) {
                        env.notifier.notify(
                            actor,
                            Notice::WarmupCountdown {
                                remaining: entry.remaining,
                            },
                        );
                        entry.remaining -= 1;
                    }
                }
            }
        }

        reports
    }

    fn step_for(&self, actor: ActorId, handle: TimerHandle, env: SessionEnv<'_>) -> Step {
        let Some(entry) = self.pending.get(&actor) else {
            return Step::Stale;
        };
        if entry.timer != handle {
            return Step::Stale;
        }
        if !env.directory.is_reachable(actor) {
            return Step::Disconnected;
        }
        if entry.interrupt_on_move
            && env
                .directory
                .current_position(actor)
                .is_some_and(|live| entry.origin.moved_beyond(&live, self.move_tolerance))
        {
            return Step::Interrupted;
        }
        if entry.remaining == 0 {
            Step::Complete
        } else {
            Step::Countdown
        }
    }

    fn complete(actor: ActorId, entry: PendingAction, env: SessionEnv<'_>) -> WarmupEnd {
        let PendingAction {
            target,
            effect,
            resolver,
            ..
        } = entry;

        match EffectError::catch_panic(|| effect(actor, &target)) {
            Ok(()) => {
                env.notifier.notify(actor, Notice::WarmupCompleted);
                let _ = resolver.send(Resolution::Completed);
                debug!(%actor, %target, "warmup completed");
                WarmupEnd::Completed
            }
            Err(error) => {
                warn!(%actor, %error, "warmup effect failed");
                let _ = resolver.send(Resolution::Failed(error));
                WarmupEnd::Failed
            }
        }
    }

    /// Removes the entry and disarms its timer in one step.
    fn remove(&mut self, actor: ActorId) -> Option<PendingAction> {
        let entry = self.pending.remove(&actor)?;
        self.timers.cancel(entry.timer);
        Some(entry)
    }
}

#[cfg(test)]
mod tests;
