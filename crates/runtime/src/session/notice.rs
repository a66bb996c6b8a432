use serde::{Deserialize, Serialize};
use waystone_core::{ActorId, RequestKind};

/// Structured user-facing message emitted by the engines.
///
/// Text is composed by the feature layer; the engines only pick the variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    /// Countdown step of a pending action. `remaining` steps are left before
    /// the effect runs.
    WarmupCountdown { remaining: u64 },
    /// The actor moved and the pending action was cancelled.
    WarmupInterrupted,
    /// The pending action ran its effect.
    WarmupCompleted,

    /// An inbound request arrived.
    RequestReceived {
        from: ActorId,
        kind: RequestKind,
        expires_in_ticks: u64,
    },
    /// The target accepted the sender's request.
    RequestAccepted { by: ActorId },
    /// The target denied the sender's request.
    RequestDenied { by: ActorId },
    /// A request between the actor and `other` timed out. `outgoing` is true
    /// for the sender's copy of the notice.
    RequestExpired { other: ActorId, outgoing: bool },
    /// The sender withdrew a request addressed to the actor.
    RequestCancelled { by: ActorId },
}
