use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use waystone_core::{ActorId, EffectError, Position};

use crate::timer::TimerHandle;

/// Completion effect of a pending action, e.g. relocating the actor to its
/// target. Invoked at most once.
pub type Effect = Box<dyn FnOnce(ActorId, &Position) -> Result<(), EffectError> + Send>;

/// Parameters of a delayed action.
#[derive(Debug, Clone, PartialEq)]
pub struct WarmupRequest {
    pub actor: ActorId,
    /// Payload handed to the effect on completion.
    pub target: Position,
    /// Delay in driver ticks before the effect runs.
    pub warmup_ticks: u64,
    pub interrupt_on_move: bool,
    /// Position snapshot compared against live positions while waiting.
    pub origin: Position,
}

impl WarmupRequest {
    pub fn new(actor: ActorId, target: Position, warmup_ticks: u64, origin: Position) -> Self {
        Self {
            actor,
            target,
            warmup_ticks,
            interrupt_on_move: true,
            origin,
        }
    }

    #[must_use]
    pub fn interrupt_on_move(mut self, interrupt: bool) -> Self {
        self.interrupt_on_move = interrupt;
        self
    }
}

/// Result of [`super::ActionScheduler::schedule`].
#[derive(Debug, strum::IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleOutcome {
    /// Zero warmup: the effect already ran.
    Success,
    /// A countdown was armed; the ticket yields its single resolution.
    WarmupStarted(Ticket),
    /// The actor already has a pending action. Nothing changed.
    AlreadyPending,
}

impl ScheduleOutcome {
    pub fn code(&self) -> &'static str {
        self.into()
    }

    pub fn into_ticket(self) -> Option<Ticket> {
        match self {
            Self::WarmupStarted(ticket) => Some(ticket),
            _ => None,
        }
    }
}

/// Terminal outcome delivered through a [`Ticket`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The effect ran successfully.
    Completed,
    /// The effect ran but reported a failure (logged and swallowed).
    Failed(EffectError),
    /// The actor moved beyond tolerance during the warmup.
    Interrupted,
}

/// How a pending action left the scheduler table, reported per tick.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum WarmupEnd {
    Completed,
    Failed,
    Interrupted,
    /// The actor was unreachable; removed without a resolution.
    Disconnected,
}

/// State of a [`Ticket`] observed without waiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketStatus {
    Pending,
    Resolved(Resolution),
    /// The action left the table without a resolution (explicit cancel,
    /// disconnect, shutdown), or the resolution was already taken.
    Dropped,
}

/// Receiving side of a pending action's single resolution.
#[derive(Debug)]
pub struct Ticket {
    rx: oneshot::Receiver<Resolution>,
}

impl Ticket {
    pub(crate) fn channel() -> (oneshot::Sender<Resolution>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// Waits for the resolution. `None` means the action was dropped.
    pub async fn resolved(self) -> Option<Resolution> {
        self.rx.await.ok()
    }

    /// Non-blocking check; consumes the resolution if one is ready.
    pub fn status(&mut self) -> TicketStatus {
        match self.rx.try_recv() {
            Ok(resolution) => TicketStatus::Resolved(resolution),
            Err(oneshot::error::TryRecvError::Empty) => TicketStatus::Pending,
            Err(oneshot::error::TryRecvError::Closed) => TicketStatus::Dropped,
        }
    }
}

/// Live table entry. Owned exclusively by the scheduler.
pub(crate) struct PendingAction {
    pub(crate) target: Position,
    pub(crate) remaining: u64,
    pub(crate) interrupt_on_move: bool,
    pub(crate) origin: Position,
    pub(crate) effect: Effect,
    pub(crate) resolver: oneshot::Sender<Resolution>,
    pub(crate) timer: TimerHandle,
}
