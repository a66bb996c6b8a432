//! Coordinator worker that owns the [`ActionScheduler`] and [`RequestBroker`].
//!
//! Receives commands from [`crate::RuntimeHandle`], drives both engines from a
//! fixed-rate interval, and publishes lifecycle events to the EventBus.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use waystone_core::{ActorId, RequestKind, Tick};

use super::metrics::CoordinatorMetrics;
use crate::broker::{
    AcceptEffect, AcceptOutcome, DenyOutcome, Request, RequestBroker, SendOutcome,
};
use crate::events::{Event, EventBus, RequestEvent, WarmupEvent};
use crate::outcome::{CancelOutcome, DisconnectReport};
use crate::scheduler::{ActionScheduler, Effect, ScheduleOutcome, WarmupRequest};
use crate::session::{ActorDirectory, Notifier, SessionEnv};

/// Commands handled between two ticks before the worker yields to the clock.
const MAX_COMMANDS_PER_TICK: usize = 1_024;

/// Commands that can be sent to the coordinator worker
pub enum Command {
    Schedule {
        request: WarmupRequest,
        effect: Effect,
        reply: oneshot::Sender<ScheduleOutcome>,
    },
    CancelAction {
        actor: ActorId,
        reply: oneshot::Sender<CancelOutcome>,
    },
    IsPending {
        actor: ActorId,
        reply: oneshot::Sender<bool>,
    },
    Remaining {
        actor: ActorId,
        reply: oneshot::Sender<Option<u64>>,
    },
    SendRequest {
        sender: ActorId,
        target: ActorId,
        kind: RequestKind,
        reply: oneshot::Sender<SendOutcome>,
    },
    Accept {
        target: ActorId,
        effect: AcceptEffect,
        reply: oneshot::Sender<AcceptOutcome>,
    },
    Deny {
        target: ActorId,
        reply: oneshot::Sender<DenyOutcome>,
    },
    CancelRequest {
        target: ActorId,
        reply: oneshot::Sender<CancelOutcome>,
    },
    CancelOutbound {
        sender: ActorId,
        reply: oneshot::Sender<Vec<Request>>,
    },
    PendingRequest {
        target: ActorId,
        reply: oneshot::Sender<Option<Request>>,
    },
    CooldownRemaining {
        sender: ActorId,
        reply: oneshot::Sender<Option<u64>>,
    },
    Disconnect {
        actor: ActorId,
        reply: oneshot::Sender<DisconnectReport>,
    },
    Now {
        reply: oneshot::Sender<Tick>,
    },
    /// Drop every pending entry and stop the loop.
    Shutdown,
}

/// External collaborators consulted by both engines.
#[derive(Clone)]
pub struct Collaborators {
    pub directory: Arc<dyn ActorDirectory>,
    pub notifier: Arc<dyn Notifier>,
}

impl Collaborators {
    pub fn env(&self) -> SessionEnv<'_> {
        SessionEnv::new(self.directory.as_ref(), self.notifier.as_ref())
    }
}

/// Background task that owns the engines and the logical clock.
///
/// Nothing else holds the pending-action, request or cooldown tables, so no
/// lock guards them.
pub struct CoordinatorWorker {
    clock: Tick,
    tick_interval: Duration,
    scheduler: ActionScheduler,
    broker: RequestBroker,
    collaborators: Collaborators,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    metrics: Arc<CoordinatorMetrics>,
}

impl CoordinatorWorker {
    pub fn new(
        scheduler: ActionScheduler,
        broker: RequestBroker,
        collaborators: Collaborators,
        tick_interval: Duration,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
        metrics: Arc<CoordinatorMetrics>,
    ) -> Self {
        info!(
            tick_interval_ms = tick_interval.as_millis() as u64,
            requests_enabled = broker.settings().enabled,
            "CoordinatorWorker initialized"
        );

        Self {
            clock: Tick::ZERO,
            tick_interval,
            scheduler,
            broker,
            collaborators,
            command_rx,
            event_bus,
            metrics,
        }
    }

    /// Main worker loop.
    ///
    /// Runs until a shutdown command arrives or every handle is dropped.
    ///
    /// Commands win over a due tick so a caller observes the clock it was
    /// answered at. After `MAX_COMMANDS_PER_TICK` commands in a row the
    /// command branch is disabled until the next tick, so a full command
    /// channel cannot stall countdowns and expiries.
    pub async fn run(mut self) {
        let start = Instant::now() + self.tick_interval;
        let mut interval = tokio::time::interval_at(start, self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
        let mut handled = 0;

        loop {
            tokio::select! {
                biased;
                cmd = self.command_rx.recv(), if handled < MAX_COMMANDS_PER_TICK => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => {
                        self.handle_command(cmd);
                        handled += 1;
                    }
                },
                _ = interval.tick() => {
                    self.advance();
                    handled = 0;
                }
            }
        }

        self.shutdown();
    }

    /// Advances the clock by one tick and drives both engines.
    pub fn advance(&mut self) {
        self.clock += 1;
        let now = self.clock;
        let env = self.collaborators.env();

        for report in self.scheduler.tick(now, env) {
            self.metrics.record_warmup_end(report.end);
            self.event_bus.publish(Event::Warmup(WarmupEvent::Ended {
                actor: report.actor,
                end: report.end,
                at: now,
            }));
        }

        let expired = self.broker.expire_due(now, env);
        self.metrics.record_requests_expired(expired.len());
        for request in expired {
            self.event_bus
                .publish(Event::Request(RequestEvent::Expired(request)));
        }

        self.metrics.record_tick();
        self.refresh_gauges();
    }

    pub fn now(&self) -> Tick {
        self.clock
    }

    pub fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Schedule {
                request,
                effect,
                reply,
            } => {
                let outcome = self.schedule(request, effect);
                if reply.send(outcome).is_err() {
                    debug!("Schedule reply channel closed (caller dropped)");
                }
            }
            Command::CancelAction { actor, reply } => {
                let outcome = self.scheduler.cancel(actor);
                if outcome.was_cancelled() {
                    self.metrics.record_warmup_dropped();
                    self.event_bus.publish(Event::Warmup(WarmupEvent::Cancelled {
                        actor,
                        at: self.clock,
                    }));
                }
                if reply.send(outcome).is_err() {
                    debug!("CancelAction reply channel closed (caller dropped)");
                }
            }
            Command::IsPending { actor, reply } => {
                if reply.send(self.scheduler.is_pending(actor)).is_err() {
                    debug!("IsPending reply channel closed (caller dropped)");
                }
            }
            Command::Remaining { actor, reply } => {
                if reply.send(self.scheduler.remaining(actor)).is_err() {
                    debug!("Remaining reply channel closed (caller dropped)");
                }
            }
            Command::SendRequest {
                sender,
                target,
                kind,
                reply,
            } => {
                let outcome = self.send_request(sender, target, kind);
                if reply.send(outcome).is_err() {
                    debug!("SendRequest reply channel closed (caller dropped)");
                }
            }
            Command::Accept {
                target,
                effect,
                reply,
            } => {
                let outcome = self.broker.accept(target, effect, self.collaborators.env());
                match &outcome {
                    AcceptOutcome::Accepted(request) => {
                        self.metrics.record_request_accepted();
                        self.event_bus
                            .publish(Event::Request(RequestEvent::Accepted(request.clone())));
                    }
                    AcceptOutcome::SenderOffline(request) => {
                        self.metrics.record_requests_cancelled(1);
                        self.event_bus
                            .publish(Event::Request(RequestEvent::Cancelled(request.clone())));
                    }
                    AcceptOutcome::NoRequest => {}
                }
                if reply.send(outcome).is_err() {
                    debug!("Accept reply channel closed (caller dropped)");
                }
            }
            Command::Deny { target, reply } => {
                let outcome = self.broker.deny(target, self.collaborators.env());
                if let DenyOutcome::Denied(request) = &outcome {
                    self.metrics.record_request_denied();
                    self.event_bus
                        .publish(Event::Request(RequestEvent::Denied(request.clone())));
                }
                if reply.send(outcome).is_err() {
                    debug!("Deny reply channel closed (caller dropped)");
                }
            }
            Command::CancelRequest { target, reply } => {
                let removed = self.broker.pending_for(target).cloned();
                let outcome = self.broker.cancel(target);
                self.publish_cancelled(removed);
                if reply.send(outcome).is_err() {
                    debug!("CancelRequest reply channel closed (caller dropped)");
                }
            }
            Command::CancelOutbound { sender, reply } => {
                let withdrawn = self
                    .broker
                    .cancel_outbound(sender, self.collaborators.env());
                self.publish_cancelled(withdrawn.iter().cloned());
                if reply.send(withdrawn).is_err() {
                    debug!("CancelOutbound reply channel closed (caller dropped)");
                }
            }
            Command::PendingRequest { target, reply } => {
                let pending = self.broker.pending_for(target).cloned();
                if reply.send(pending).is_err() {
                    debug!("PendingRequest reply channel closed (caller dropped)");
                }
            }
            Command::CooldownRemaining { sender, reply } => {
                let remaining = self.broker.cooldown_remaining(sender, self.clock);
                if reply.send(remaining).is_err() {
                    debug!("CooldownRemaining reply channel closed (caller dropped)");
                }
            }
            Command::Disconnect { actor, reply } => {
                let report = self.disconnect(actor);
                if reply.send(report).is_err() {
                    debug!("Disconnect reply channel closed (caller dropped)");
                }
            }
            Command::Now { reply } => {
                if reply.send(self.clock).is_err() {
                    debug!("Now reply channel closed (caller dropped)");
                }
            }
            // Handled by the run loop.
            Command::Shutdown => {}
        }

        self.refresh_gauges();
    }

    fn schedule(&mut self, request: WarmupRequest, effect: Effect) -> ScheduleOutcome {
        let actor = request.actor;
        let outcome = self.scheduler.schedule(request, effect, self.clock);
        match &outcome {
            ScheduleOutcome::WarmupStarted(_) => {
                self.metrics.record_warmup_started();
                self.event_bus.publish(Event::Warmup(WarmupEvent::Started {
                    actor,
                    remaining: self.scheduler.remaining(actor).unwrap_or_default(),
                    at: self.clock,
                }));
            }
            ScheduleOutcome::Success => {
                self.event_bus.publish(Event::Warmup(WarmupEvent::Immediate {
                    actor,
                    at: self.clock,
                }));
            }
            ScheduleOutcome::AlreadyPending => {}
        }
        outcome
    }

    fn send_request(&mut self, sender: ActorId, target: ActorId, kind: RequestKind) -> SendOutcome {
        let outcome = self
            .broker
            .send(sender, target, kind, self.clock, self.collaborators.env());
        if outcome == SendOutcome::Sent {
            self.metrics.record_request_sent();
            if let Some(request) = self.broker.pending_for(target) {
                self.event_bus
                    .publish(Event::Request(RequestEvent::Sent(request.clone())));
            }
        }
        outcome
    }

    fn disconnect(&mut self, actor: ActorId) -> DisconnectReport {
        let action_dropped = self.scheduler.disconnect(actor);
        if action_dropped {
            self.metrics.record_warmup_dropped();
            self.event_bus.publish(Event::Warmup(WarmupEvent::Cancelled {
                actor,
                at: self.clock,
            }));
        }

        let requests_dropped = self.broker.disconnect(actor);
        self.publish_cancelled(requests_dropped.iter().cloned());

        let report = DisconnectReport {
            action_dropped,
            requests_dropped,
        };
        if !report.is_empty() {
            debug!(
                %actor,
                action_dropped,
                requests = report.requests_dropped.len(),
                "actor cleaned up"
            );
        }
        report
    }

    fn publish_cancelled(&self, requests: impl IntoIterator<Item = Request>) {
        let mut count = 0;
        for request in requests {
            count += 1;
            self.event_bus
                .publish(Event::Request(RequestEvent::Cancelled(request)));
        }
        self.metrics.record_requests_cancelled(count);
    }

    fn refresh_gauges(&self) {
        self.metrics
            .set_pending(self.scheduler.pending_count(), self.broker.request_count());
    }

    fn shutdown(&mut self) {
        let actions = self.scheduler.clear();
        let requests = self.broker.clear();
        self.refresh_gauges();
        info!(
            dropped_actions = actions,
            dropped_requests = requests,
            at = %self.clock,
            "CoordinatorWorker stopped"
        );
    }
}
