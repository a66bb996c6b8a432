use serde::{Deserialize, Serialize};

use waystone_core::{ActorId, CoordConfig, EffectError, RequestKind, Tick};

use crate::session::PolicyDenial;
use crate::timer::TimerHandle;

/// Caller-supplied action run when a request is accepted.
pub type AcceptEffect = Box<dyn FnOnce(&Request) -> Result<(), EffectError> + Send>;

/// A directed proposal from `sender` to `target`, awaiting an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub sender: ActorId,
    pub target: ActorId,
    pub kind: RequestKind,
    pub created_at: Tick,
    pub expires_at: Tick,
}

/// Live table entry: the request plus its timeout timer.
pub(crate) struct Slot {
    pub(crate) request: Request,
    pub(crate) timer: TimerHandle,
}

/// Broker tunables, in driver ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokerSettings {
    pub enabled: bool,
    pub cooldown_ticks: u64,
    pub timeout_ticks: u64,
}

impl BrokerSettings {
    pub fn from_config(config: &CoordConfig) -> Self {
        Self {
            enabled: config.requests.enabled,
            cooldown_ticks: config.request_cooldown_ticks(),
            timeout_ticks: config.request_timeout_ticks(),
        }
    }
}

/// Result of [`super::RequestBroker::send`].
#[derive(Debug, Clone, PartialEq, Eq, strum::IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SendOutcome {
    Sent,
    /// Requests are switched off by configuration.
    Disabled,
    SelfRequest,
    TargetOffline,
    /// The interaction policy refused the pair.
    Rejected(PolicyDenial),
    OnCooldown { remaining_ticks: u64 },
    /// The target already holds an inbound request.
    TargetBusy,
}

/// Result of [`super::RequestBroker::accept`].
#[derive(Debug, Clone, PartialEq, Eq, strum::IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AcceptOutcome {
    Accepted(Request),
    NoRequest,
    /// The sender left before the answer; the request was discarded.
    SenderOffline(Request),
}

/// Result of [`super::RequestBroker::deny`].
#[derive(Debug, Clone, PartialEq, Eq, strum::IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DenyOutcome {
    Denied(Request),
    NoRequest,
}

impl SendOutcome {
    pub fn code(&self) -> &'static str {
        self.into()
    }
}

impl AcceptOutcome {
    pub fn code(&self) -> &'static str {
        self.into()
    }
}

impl DenyOutcome {
    pub fn code(&self) -> &'static str {
        self.into()
    }
}
