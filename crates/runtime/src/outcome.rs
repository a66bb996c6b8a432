use serde::{Deserialize, Serialize};

use crate::broker::Request;

/// Result of an explicit cancel on either engine.
///
/// Cancelling something that does not exist is an ordinary outcome, not an
/// error.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::IntoStaticStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelOutcome {
    Cancelled,
    NothingToCancel,
}

impl CancelOutcome {
    pub fn code(self) -> &'static str {
        self.into()
    }

    pub fn was_cancelled(self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// What a disconnect removed from both engines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisconnectReport {
    /// The actor had a pending action, now dropped without resolution.
    pub action_dropped: bool,
    /// Requests the actor held as target or had sent.
    pub requests_dropped: Vec<Request>,
}

impl DisconnectReport {
    pub fn is_empty(&self) -> bool {
        !self.action_dropped && self.requests_dropped.is_empty()
    }
}
