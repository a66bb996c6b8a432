//! Topic-based event bus for coordinator events.
//!
//! The worker publishes lifecycle events for warmups and requests; user-facing
//! notices travel on their own topic so a host can render them without
//! seeing the bookkeeping events.

mod bus;
mod types;

pub use bus::{BusNotifier, Event, EventBus, Topic};
pub use types::{RequestEvent, WarmupEvent};
