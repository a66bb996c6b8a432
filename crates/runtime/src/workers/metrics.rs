//! Coordinator counters.
//!
//! Written by the coordinator worker, read by any [`crate::RuntimeHandle`]
//! clone without a round trip through the command channel.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::scheduler::WarmupEnd;

/// Lock-free counters maintained by the coordinator worker.
#[derive(Debug, Default)]
pub struct CoordinatorMetrics {
    ticks: AtomicU64,

    warmups_started: AtomicU64,
    warmups_completed: AtomicU64,
    warmups_failed: AtomicU64,
    warmups_interrupted: AtomicU64,
    /// Removed without resolution: unreachable, cancelled or disconnected.
    warmups_dropped: AtomicU64,

    requests_sent: AtomicU64,
    requests_accepted: AtomicU64,
    requests_denied: AtomicU64,
    requests_expired: AtomicU64,
    requests_cancelled: AtomicU64,

    pending_actions: AtomicU64,
    pending_requests: AtomicU64,
}

fn bump(counter: &AtomicU64, by: u64) {
    counter.fetch_add(by, Ordering::Relaxed);
}

impl CoordinatorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_tick(&self) {
        bump(&self.ticks, 1);
    }

    pub(crate) fn record_warmup_started(&self) {
        bump(&self.warmups_started, 1);
    }

    pub(crate) fn record_warmup_end(&self, end: WarmupEnd) {
        let counter = match end {
            WarmupEnd::Completed => &self.warmups_completed,
            WarmupEnd::Failed => &self.warmups_failed,
            WarmupEnd::Interrupted => &self.warmups_interrupted,
            WarmupEnd::Disconnected => &self.warmups_dropped,
        };
        bump(counter, 1);
    }

    pub(crate) fn record_warmup_dropped(&self) {
        bump(&self.warmups_dropped, 1);
    }

    pub(crate) fn record_request_sent(&self) {
        bump(&self.requests_sent, 1);
    }

    pub(crate) fn record_request_accepted(&self) {
        bump(&self.requests_accepted, 1);
    }

    pub(crate) fn record_request_denied(&self) {
        bump(&self.requests_denied, 1);
    }

    pub(crate) fn record_requests_expired(&self, count: usize) {
        bump(&self.requests_expired, count as u64);
    }

    pub(crate) fn record_requests_cancelled(&self, count: usize) {
        bump(&self.requests_cancelled, count as u64);
    }

    /// Updates the table-size gauges.
    pub(crate) fn set_pending(&self, actions: usize, requests: usize) {
        self.pending_actions.store(actions as u64, Ordering::Relaxed);
        self.pending_requests.store(requests as u64, Ordering::Relaxed);
    }

    /// Creates a snapshot of all metrics for display/logging.
    ///
    /// Fields are read individually; the snapshot as a whole may straddle a
    /// worker update.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        MetricsSnapshot {
            ticks: load(&self.ticks),
            warmups_started: load(&self.warmups_started),
            warmups_completed: load(&self.warmups_completed),
            warmups_failed: load(&self.warmups_failed),
            warmups_interrupted: load(&self.warmups_interrupted),
            warmups_dropped: load(&self.warmups_dropped),
            requests_sent: load(&self.requests_sent),
            requests_accepted: load(&self.requests_accepted),
            requests_denied: load(&self.requests_denied),
            requests_expired: load(&self.requests_expired),
            requests_cancelled: load(&self.requests_cancelled),
            pending_actions: load(&self.pending_actions),
            pending_requests: load(&self.pending_requests),
        }
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub ticks: u64,
    pub warmups_started: u64,
    pub warmups_completed: u64,
    pub warmups_failed: u64,
    pub warmups_interrupted: u64,
    pub warmups_dropped: u64,
    pub requests_sent: u64,
    pub requests_accepted: u64,
    pub requests_denied: u64,
    pub requests_expired: u64,
    pub requests_cancelled: u64,
    pub pending_actions: u64,
    pub pending_requests: u64,
}

impl MetricsSnapshot {
    /// Warmups that reached a terminal state of any kind.
    pub fn warmups_finished(&self) -> u64 {
        self.warmups_completed
            + self.warmups_failed
            + self.warmups_interrupted
            + self.warmups_dropped
    }
}
