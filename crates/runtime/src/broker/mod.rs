//! Request broker: two-party handshakes with cooldown and expiry.
//!
//! Requests are keyed by their *target*, so each actor holds at most one
//! inbound request. A sender may have outbound requests to several targets at
//! once. Every exit path (accept, deny, cancel, timeout, disconnect of either
//! party) removes the slot and disarms its timeout in the same step; a timeout
//! that fires for a slot that is gone or was replaced is ignored.
mod types;

pub use types::{AcceptEffect, AcceptOutcome, BrokerSettings, DenyOutcome, Request, SendOutcome};

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace, warn};
use waystone_core::{ActorId, EffectError, RequestKind, Tick};

use crate::outcome::CancelOutcome;
use crate::session::{InteractionPolicy, Notice, SessionEnv};
use crate::timer::TimerQueue;
use types::Slot;

/// Owner of the request table, the cooldown table and the timeout timers.
pub struct RequestBroker {
    settings: BrokerSettings,
    policy: Arc<dyn InteractionPolicy>,
    requests: HashMap<ActorId, Slot>,
    cooldowns: HashMap<ActorId, Tick>,
    timers: TimerQueue<ActorId>,
}

impl RequestBroker {
    pub fn new(settings: BrokerSettings, policy: Arc<dyn InteractionPolicy>) -> Self {
        Self {
            settings,
            policy,
            requests: HashMap::new(),
            cooldowns: HashMap::new(),
            timers: TimerQueue::new(),
        }
    }

    pub fn settings(&self) -> BrokerSettings {
        self.settings
    }

    /// Proposes `kind` from `sender` to `target`.
    ///
    /// Checks run in a fixed order: disabled, self request, target offline,
    /// policy, sender cooldown, target busy. Only `Sent` mutates state.
    pub fn send(
        &mut self,
        sender: ActorId,
        target: ActorId,
        kind: RequestKind,
        now: Tick,
        env: SessionEnv<'_>,
    ) -> SendOutcome {
        if !self.settings.enabled {
            return SendOutcome::Disabled;
        }
        if sender == target {
            return SendOutcome::SelfRequest;
        }
        if !env.directory.is_reachable(target) {
            return SendOutcome::TargetOffline;
        }
        if let Err(denial) = self.policy.check(sender, target, kind) {
            debug!(%sender, %target, %denial, "request rejected by policy");
            return SendOutcome::Rejected(denial);
        }
        if let Some(remaining_ticks) = self.cooldown_remaining(sender, now) {
            return SendOutcome::OnCooldown { remaining_ticks };
        }
        if self.requests.contains_key(&target) {
            return SendOutcome::TargetBusy;
        }

        let expires_at = now + self.settings.timeout_ticks;
        let timer = self.timers.schedule_once(target, expires_at);
        let request = Request {
            sender,
            target,
            kind,
            created_at: now,
            expires_at,
        };
        self.requests.insert(target, Slot { request, timer });
        self.cooldowns.insert(sender, now);

        env.notifier.notify(
            target,
            Notice::RequestReceived {
                from: sender,
                kind,
                expires_in_ticks: self.settings.timeout_ticks,
            },
        );
        debug!(%sender, %target, %kind, %expires_at, "request sent");
        SendOutcome::Sent
    }

    /// Accepts the inbound request of `target`, running `effect` on it.
    ///
    /// A failing or panicking effect is logged and swallowed; the request is
    /// consumed either way.
    pub fn accept<F>(&mut self, target: ActorId, effect: F, env: SessionEnv<'_>) -> AcceptOutcome
    where
        F: FnOnce(&Request) -> Result<(), EffectError>,
    {
        let Some(request) = self.remove(target) else {
            return AcceptOutcome::NoRequest;
        };

        if !env.directory.is_reachable(request.sender) {
            debug!(sender = %request.sender, %target, "accept found sender offline");
            return AcceptOutcome::SenderOffline(request);
        }

        if let Err(error) = EffectError::catch_panic(|| effect(&request)) {
            warn!(sender = %request.sender, %target, %error, "accept effect failed");
        }
        env.notifier
            .notify(request.sender, Notice::RequestAccepted { by: target });
        debug!(sender = %request.sender, %target, "request accepted");
        AcceptOutcome::Accepted(request)
    }

    /// Denies the inbound request of `target`.
    pub fn deny(&mut self, target: ActorId, env: SessionEnv<'_>) -> DenyOutcome {
        let Some(request) = self.remove(target) else {
            return DenyOutcome::NoRequest;
        };
        env.notify_if_reachable(request.sender, Notice::RequestDenied { by: target });
        debug!(sender = %request.sender, %target, "request denied");
        DenyOutcome::Denied(request)
    }

    /// Silently removes the inbound request of `target`. Idempotent.
    pub fn cancel(&mut self, target: ActorId) -> CancelOutcome {
        match self.remove(target) {
            Some(request) => {
                debug!(sender = %request.sender, %target, "request cancelled");
                CancelOutcome::Cancelled
            }
            None => CancelOutcome::NothingToCancel,
        }
    }

    /// Withdraws every request sent by `sender`, telling each target.
    pub fn cancel_outbound(&mut self, sender: ActorId, env: SessionEnv<'_>) -> Vec<Request> {
        let withdrawn = self.remove_outbound(sender);
        for request in &withdrawn {
            env.notify_if_reachable(request.target, Notice::RequestCancelled { by: sender });
        }
        withdrawn
    }

    /// Cleanup for a disconnecting actor: drops the request it holds as
    /// target and every request it sent. No notices are sent.
    pub fn disconnect(&mut self, actor: ActorId) -> Vec<Request> {
        let mut removed: Vec<Request> = self.remove(actor).into_iter().collect();
        removed.extend(self.remove_outbound(actor));
        if !removed.is_empty() {
            debug!(%actor, count = removed.len(), "requests dropped on disconnect");
        }
        removed
    }

    /// Expires every request whose timeout is due at `now`, notifying both
    /// parties that are still connected.
    pub fn expire_due(&mut self, now: Tick, env: SessionEnv<'_>) -> Vec<Request> {
        let mut expired = Vec::new();

        for fired in self.timers.poll(now) {
            let target = fired.key;
            let live = self
                .requests
                .get(&target)
                .is_some_and(|slot| slot.timer == fired.handle);
            if !live {
                trace!(%target, timer = fired.handle.id(), "stale request timeout ignored");
                continue;
            }
            let Some(request) = self.remove(target) else {
                continue;
            };

            env.notify_if_reachable(
                request.sender,
                Notice::RequestExpired {
                    other: target,
                    outgoing: true,
                },
            );
            env.notify_if_reachable(
                target,
                Notice::RequestExpired {
                    other: request.sender,
                    outgoing: false,
                },
            );
            debug!(sender = %request.sender, %target, "request expired");
            expired.push(request);
        }

        expired
    }

    /// Inbound request currently held by `target`.
    pub fn pending_for(&self, target: ActorId) -> Option<&Request> {
        self.requests.get(&target).map(|slot| &slot.request)
    }

    /// Requests currently sent by `sender`.
    pub fn outbound_from(&self, sender: ActorId) -> Vec<&Request> {
        self.requests
            .values()
            .map(|slot| &slot.request)
            .filter(|request| request.sender == sender)
            .collect()
    }

    /// Ticks until `sender` may send again, or `None` if it may send now.
    pub fn cooldown_remaining(&self, sender: ActorId, now: Tick) -> Option<u64> {
        let last = self.cooldowns.get(&sender)?;
        let elapsed = now.since(*last);
        (elapsed < self.settings.cooldown_ticks).then(|| self.settings.cooldown_ticks - elapsed)
    }

    pub fn request_count(&self) -> usize {
        self.requests.len()
    }

    /// Armed timeout timers. Always equal to [`Self::request_count`].
    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Drops every request and disarms all timers. Cooldowns are kept.
    pub fn clear(&mut self) -> usize {
        let dropped = self.requests.len();
        self.requests.clear();
        self.timers.clear();
        dropped
    }

    fn remove_outbound(&mut self, sender: ActorId) -> Vec<Request> {
        let targets: Vec<ActorId> = self
            .requests
            .iter()
            .filter(|(_, slot)| slot.request.sender == sender)
            .map(|(target, _)| *target)
            .collect();
        targets
            .into_iter()
            .filter_map(|target| self.remove(target))
            .collect()
    }

    /// Removes the slot and disarms its timer in one step.
    fn remove(&mut self, target: ActorId) -> Option<Request> {
        let slot = self.requests.remove(&target)?;
        self.timers.cancel(slot.timer);
        Some(slot.request)
    }
}

#[cfg(test)]
mod tests;
