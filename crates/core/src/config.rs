use crate::error::ConfigError;

/// Tunables for the action scheduler, the request broker and their driver.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct CoordConfig {
    /// Driver ticks per real-time second.
    pub tick_rate: u32,
    /// Ticks between two countdown steps of a pending action.
    pub countdown_period_ticks: u32,
    /// Distance in blocks an actor may drift before a movement-interruptible
    /// warmup is cancelled.
    pub move_tolerance: f64,
    /// Default warmup applied by hosts that do not pick their own.
    pub warmup_secs: u32,
    pub requests: RequestConfig,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
}

/// Request broker tunables.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct RequestConfig {
    pub enabled: bool,
    /// Minimum spacing between two requests from the same sender.
    pub cooldown_secs: u32,
    /// Unanswered requests expire after this long.
    pub timeout_secs: u32,
}

impl CoordConfig {
    // ===== runtime-tunable defaults =====
    pub const DEFAULT_TICK_RATE: u32 = 20;
    /// One tick per millisecond; finer rates cannot be driven by a timer.
    pub const MAX_TICK_RATE: u32 = 1_000;
    pub const DEFAULT_MOVE_TOLERANCE: f64 = 0.5;
    pub const DEFAULT_WARMUP_SECS: u32 = 3;

    pub fn new() -> Self {
        Self {
            tick_rate: Self::DEFAULT_TICK_RATE,
            countdown_period_ticks: Self::DEFAULT_TICK_RATE,
            move_tolerance: Self::DEFAULT_MOVE_TOLERANCE,
            warmup_secs: Self::DEFAULT_WARMUP_SECS,
            requests: RequestConfig::default(),
            event_buffer_size: 100,
            command_buffer_size: 32,
        }
    }

    /// Checks every tunable. Called by the config layer before a runtime is
    /// built; the engines assume a validated config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if self.tick_rate > Self::MAX_TICK_RATE {
            return Err(ConfigError::TickRateTooHigh {
                max: Self::MAX_TICK_RATE,
                got: self.tick_rate,
            });
        }
        if self.countdown_period_ticks == 0 {
            return Err(ConfigError::ZeroCountdownPeriod);
        }
        if !self.move_tolerance.is_finite() || self.move_tolerance < 0.0 {
            return Err(ConfigError::InvalidMoveTolerance(self.move_tolerance));
        }
        if self.requests.timeout_secs == 0 {
            return Err(ConfigError::ZeroRequestTimeout);
        }
        if self.event_buffer_size == 0 {
            return Err(ConfigError::ZeroBuffer {
                field: "event_buffer_size",
            });
        }
        if self.command_buffer_size == 0 {
            return Err(ConfigError::ZeroBuffer {
                field: "command_buffer_size",
            });
        }
        Ok(())
    }

    /// Converts whole seconds into driver ticks.
    pub fn secs_to_ticks(&self, secs: u32) -> u64 {
        u64::from(secs) * u64::from(self.tick_rate)
    }

    pub fn warmup_ticks(&self) -> u64 {
        self.secs_to_ticks(self.warmup_secs)
    }

    pub fn request_cooldown_ticks(&self) -> u64 {
        self.secs_to_ticks(self.requests.cooldown_secs)
    }

    pub fn request_timeout_ticks(&self) -> u64 {
        self.secs_to_ticks(self.requests.timeout_secs)
    }

    /// Real-time length of one driver tick. Never zero.
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(1) / self.tick_rate.clamp(1, Self::MAX_TICK_RATE)
    }
}

impl Default for CoordConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_secs: 10,
            timeout_secs: 30,
        }
    }
}
