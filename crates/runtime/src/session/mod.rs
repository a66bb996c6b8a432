//! Boundary to the actor-session layer.
//!
//! The engines never own actor state. They ask an [`ActorDirectory`] whether an
//! actor is still connected and where it stands, and hand user-facing
//! [`Notice`]s to a [`Notifier`]. Both calls are synchronous, best-effort and
//! never retried.
mod memory;
mod notice;
mod policy;

pub use memory::{ActorSession, InMemoryDirectory};
pub use notice::Notice;
pub use policy::{AllowAll, InteractionPolicy, PolicyDenial, ToggleablePolicy};

use waystone_core::{ActorId, Position};

/// Live view of connected actors.
pub trait ActorDirectory: Send + Sync {
    /// Returns true while the actor is connected.
    fn is_reachable(&self, actor: ActorId) -> bool;

    /// Current position, or `None` if the actor is unknown.
    fn current_position(&self, actor: ActorId) -> Option<Position>;
}

/// Best-effort delivery of user-facing notices.
///
/// Implementations must not block and must swallow their own failures.
pub trait Notifier: Send + Sync {
    fn notify(&self, actor: ActorId, notice: Notice);
}

/// Notifier that discards everything.
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _actor: ActorId, _notice: Notice) {}
}

/// Collaborators handed to the engines for a single operation or tick.
#[derive(Clone, Copy)]
pub struct SessionEnv<'a> {
    pub directory: &'a dyn ActorDirectory,
    pub notifier: &'a dyn Notifier,
}

impl<'a> SessionEnv<'a> {
    pub fn new(directory: &'a dyn ActorDirectory, notifier: &'a dyn Notifier) -> Self {
        Self {
            directory,
            notifier,
        }
    }

    /// Delivers `notice` only if `actor` is still connected.
    pub fn notify_if_reachable(&self, actor: ActorId, notice: Notice) {
        if self.directory.is_reachable(actor) {
            self.notifier.notify(actor, notice);
        } else {
            tracing::trace!(%actor, "skipping notice for unreachable actor");
        }
    }
}
