use serde::{Deserialize, Serialize};

use waystone_core::{ActorId, Tick};

use crate::broker::Request;
use crate::scheduler::WarmupEnd;

/// Lifecycle of pending actions, published on [`super::Topic::Warmup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarmupEvent {
    /// A countdown was armed.
    Started {
        actor: ActorId,
        remaining: u64,
        at: Tick,
    },
    /// A zero-warmup action ran immediately.
    Immediate { actor: ActorId, at: Tick },
    /// The action left the table during a tick.
    Ended {
        actor: ActorId,
        end: WarmupEnd,
        at: Tick,
    },
    /// Removed by an explicit cancel or disconnect.
    Cancelled { actor: ActorId, at: Tick },
}

/// Lifecycle of requests, published on [`super::Topic::Request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestEvent {
    Sent(Request),
    Accepted(Request),
    Denied(Request),
    Expired(Request),
    /// Withdrawn by the sender or dropped by cancel/disconnect.
    Cancelled(Request),
}

impl RequestEvent {
    pub fn request(&self) -> &Request {
        match self {
            Self::Sent(request)
            | Self::Accepted(request)
            | Self::Denied(request)
            | Self::Expired(request)
            | Self::Cancelled(request) => request,
        }
    }
}
