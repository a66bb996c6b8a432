//! Worker task that backs the runtime orchestration.
//!
//! The coordinator worker is the single owner of both engines; everything
//! else talks to it through [`Command`]s.

mod coordinator;
mod metrics;

pub use coordinator::{Collaborators, Command, CoordinatorWorker};
pub use metrics::{CoordinatorMetrics, MetricsSnapshot};
