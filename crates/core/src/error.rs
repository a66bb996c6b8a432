//! Error types shared by the engines and the configuration layer.
//!
//! Expected rejections (busy, cooldown, not found) are outcome values in the
//! runtime crate and never appear here. These types cover genuine faults:
//! invalid tunables and failed collaborator effects.

use std::panic::{self, AssertUnwindSafe};

use crate::types::ActorId;

/// Invalid configuration value detected by [`crate::CoordConfig::validate`].
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("tick_rate must be at least 1 tick per second")]
    ZeroTickRate,

    #[error("tick_rate must be at most {max} ticks per second (got {got})")]
    TickRateTooHigh { max: u32, got: u32 },

    #[error("countdown_period_ticks must be at least 1")]
    ZeroCountdownPeriod,

    #[error("move_tolerance must be finite and non-negative (got {0})")]
    InvalidMoveTolerance(f64),

    #[error("requests.timeout_secs must be at least 1")]
    ZeroRequestTimeout,

    #[error("{field} must be at least 1")]
    ZeroBuffer { field: &'static str },
}

/// Failure reported by a caller-supplied effect (relocation, accept action).
///
/// The engines log and swallow these; they never reach the feature layer as
/// faults.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EffectError {
    #[error("actor {0} is not reachable")]
    Unreachable(ActorId),

    #[error("effect rejected: {0}")]
    Rejected(String),

    #[error("effect panicked: {0}")]
    Panicked(String),
}

impl EffectError {
    /// Runs `effect`, turning a panic into [`EffectError::Panicked`].
    ///
    /// Effects run on the shared coordinator task, so an unwinding effect
    /// must not take the task down with it.
    pub fn catch_panic<F>(effect: F) -> Result<(), EffectError>
    where
        F: FnOnce() -> Result<(), EffectError>,
    {
        panic::catch_unwind(AssertUnwindSafe(effect)).unwrap_or_else(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            Err(EffectError::Panicked(message))
        })
    }
}
