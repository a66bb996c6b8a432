//! Interaction policy consulted before a request is stored.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use waystone_core::{ActorId, RequestKind};

/// Reason an [`InteractionPolicy`] refused a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum PolicyDenial {
    #[error("target is not accepting requests")]
    TargetNotAccepting,

    #[error("{0}")]
    Forbidden(String),
}

/// External predicate deciding whether two actors may interact.
pub trait InteractionPolicy: Send + Sync {
    fn check(
        &self,
        sender: ActorId,
        target: ActorId,
        kind: RequestKind,
    ) -> Result<(), PolicyDenial>;
}

/// Policy that allows every request.
pub struct AllowAll;

impl InteractionPolicy for AllowAll {
    fn check(&self, _: ActorId, _: ActorId, _: RequestKind) -> Result<(), PolicyDenial> {
        Ok(())
    }
}

/// Policy where each actor can switch incoming requests off.
#[derive(Default)]
pub struct ToggleablePolicy {
    refusing: RwLock<HashSet<ActorId>>,
}

impl ToggleablePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips the actor's setting. Returns true if the actor now accepts
    /// requests.
    pub fn toggle(&self, actor: ActorId) -> bool {
        let mut refusing = self
            .refusing
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if refusing.remove(&actor) {
            true
        } else {
            refusing.insert(actor);
            false
        }
    }

    pub fn accepts(&self, actor: ActorId) -> bool {
        !self
            .refusing
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&actor)
    }
}

impl InteractionPolicy for ToggleablePolicy {
    fn check(&self, _sender: ActorId, target: ActorId, _: RequestKind) -> Result<(), PolicyDenial> {
        if self.accepts(target) {
            Ok(())
        } else {
            Err(PolicyDenial::TargetNotAccepting)
        }
    }
}
