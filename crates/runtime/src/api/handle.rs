//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for both
//! engines. Every call is answered by the coordinator worker at its current
//! tick, so callers never pass timestamps.
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};

use waystone_core::{ActorId, EffectError, Position, RequestKind, Tick};

use super::errors::{Result, RuntimeError};
use crate::broker::{AcceptOutcome, DenyOutcome, Request, SendOutcome};
use crate::events::{Event, EventBus, Topic};
use crate::outcome::{CancelOutcome, DisconnectReport};
use crate::scheduler::{ScheduleOutcome, WarmupRequest};
use crate::workers::{Command, CoordinatorMetrics, MetricsSnapshot};

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
    metrics: Arc<CoordinatorMetrics>,
}

impl RuntimeHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command>,
        event_bus: EventBus,
        metrics: Arc<CoordinatorMetrics>,
    ) -> Self {
        Self {
            command_tx,
            event_bus,
            metrics,
        }
    }

    async fn call<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Start a delayed action for `request.actor`.
    ///
    /// The effect runs on the worker task, at most once.
    pub async fn schedule<F>(&self, request: WarmupRequest, effect: F) -> Result<ScheduleOutcome>
    where
        F: FnOnce(ActorId, &Position) -> std::result::Result<(), EffectError> + Send + 'static,
    {
        self.call(|reply| Command::Schedule {
            request,
            effect: Box::new(effect),
            reply,
        })
        .await
    }

    /// Cancel the actor's pending action without notifying it.
    pub async fn cancel_action(&self, actor: ActorId) -> Result<CancelOutcome> {
        self.call(|reply| Command::CancelAction { actor, reply }).await
    }

    pub async fn is_pending(&self, actor: ActorId) -> Result<bool> {
        self.call(|reply| Command::IsPending { actor, reply }).await
    }

    /// Countdown steps left for the actor's pending action.
    pub async fn remaining(&self, actor: ActorId) -> Result<Option<u64>> {
        self.call(|reply| Command::Remaining { actor, reply }).await
    }

    pub async fn send_request(
        &self,
        sender: ActorId,
        target: ActorId,
        kind: RequestKind,
    ) -> Result<SendOutcome> {
        self.call(|reply| Command::SendRequest {
            sender,
            target,
            kind,
            reply,
        })
        .await
    }

    /// Accept the inbound request held by `target`, running `effect` on it.
    pub async fn accept<F>(&self, target: ActorId, effect: F) -> Result<AcceptOutcome>
    where
        F: FnOnce(&Request) -> std::result::Result<(), EffectError> + Send + 'static,
    {
        self.call(|reply| Command::Accept {
            target,
            effect: Box::new(effect),
            reply,
        })
        .await
    }

    pub async fn deny(&self, target: ActorId) -> Result<DenyOutcome> {
        self.call(|reply| Command::Deny { target, reply }).await
    }

    /// Silently drop the inbound request held by `target`.
    pub async fn cancel_request(&self, target: ActorId) -> Result<CancelOutcome> {
        self.call(|reply| Command::CancelRequest { target, reply }).await
    }

    /// Withdraw every request sent by `sender`.
    pub async fn cancel_outbound(&self, sender: ActorId) -> Result<Vec<Request>> {
        self.call(|reply| Command::CancelOutbound { sender, reply }).await
    }

    pub async fn pending_request(&self, target: ActorId) -> Result<Option<Request>> {
        self.call(|reply| Command::PendingRequest { target, reply }).await
    }

    /// Ticks until `sender` may send again.
    pub async fn cooldown_remaining(&self, sender: ActorId) -> Result<Option<u64>> {
        self.call(|reply| Command::CooldownRemaining { sender, reply }).await
    }

    /// Cleanup for an actor leaving the session layer.
    pub async fn disconnect(&self, actor: ActorId) -> Result<DisconnectReport> {
        self.call(|reply| Command::Disconnect { actor, reply }).await
    }

    /// Current logical tick of the worker.
    pub async fn now(&self) -> Result<Tick> {
        self.call(|reply| Command::Now { reply }).await
    }

    /// Snapshot of the worker's counters. Does not round-trip the worker.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Warmup` - Pending action lifecycle
    /// - `Topic::Request` - Request lifecycle
    /// - `Topic::Notice` - Notices for individual actors (when the runtime
    ///   uses the default bus notifier)
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> std::collections::HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub(crate) async fn request_shutdown(&self) {
        if self.command_tx.send(Command::Shutdown).await.is_err() {
            tracing::debug!("coordinator worker already stopped");
        }
    }
}
