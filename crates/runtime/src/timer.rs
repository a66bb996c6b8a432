//! Cancellable timer queue driven by the coordinator clock.
//!
//! Every armed timer gets a fresh [`TimerHandle`] generation that is never
//! reissued. Cancelling removes the handle from the live set, so cancelling
//! twice (or cancelling a one-shot that already fired) is a no-op. Owners keep
//! the handle next to their table entry and compare it when a timer fires,
//! which turns any fire that outlived its entry into a harmless stale event.

use std::collections::{BTreeSet, HashMap};

use waystone_core::Tick;

/// Opaque generation id of one armed timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// A timer that came due during [`TimerQueue::poll`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fired<K> {
    pub handle: TimerHandle,
    pub key: K,
    pub due: Tick,
}

struct Armed<K> {
    key: K,
    due: Tick,
    period: Option<u64>,
}

/// Ordered set of one-shot and repeating timers keyed by `K`.
pub struct TimerQueue<K> {
    next_id: u64,
    order: BTreeSet<(Tick, TimerHandle)>,
    live: HashMap<TimerHandle, Armed<K>>,
}

impl<K: Clone> TimerQueue<K> {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            order: BTreeSet::new(),
            live: HashMap::new(),
        }
    }

    /// Arms a timer that fires once at `due`.
    pub fn schedule_once(&mut self, key: K, due: Tick) -> TimerHandle {
        self.arm(key, due, None)
    }

    /// Arms a timer that first fires at `first_due` and then every `period`
    /// ticks until cancelled. A zero period is treated as one tick.
    pub fn schedule_repeating(&mut self, key: K, first_due: Tick, period: u64) -> TimerHandle {
        self.arm(key, first_due, Some(period.max(1)))
    }

    fn arm(&mut self, key: K, due: Tick, period: Option<u64>) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.order.insert((due, handle));
        self.live.insert(handle, Armed { key, due, period });
        handle
    }

    /// Disarms `handle`. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.live.remove(&handle) {
            Some(armed) => {
                self.order.remove(&(armed.due, handle));
                true
            }
            None => false,
        }
    }

    pub fn is_live(&self, handle: TimerHandle) -> bool {
        self.live.contains_key(&handle)
    }

    /// Pops every live timer due at or before `now`, in due order.
    ///
    /// Repeating timers are re-armed `period` ticks after `now`, so a driver
    /// that skipped ticks does not receive a burst of catch-up fires.
    pub fn poll(&mut self, now: Tick) -> Vec<Fired<K>> {
        let mut fired = Vec::new();
        while let Some(&(due, handle)) = self.order.first() {
            if due > now {
                break;
            }
            self.order.pop_first();
            let Some(armed) = self.live.get_mut(&handle) else {
                continue;
            };
            fired.push(Fired {
                handle,
                key: armed.key.clone(),
                due,
            });
            if let Some(period) = armed.period {
                let next = now + period;
                armed.due = next;
                self.order.insert((next, handle));
            } else {
                self.live.remove(&handle);
            }
        }
        fired
    }

    /// Number of armed timers.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Disarms everything.
    pub fn clear(&mut self) {
        self.order.clear();
        self.live.clear();
    }
}

impl<K: Clone> Default for TimerQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}
