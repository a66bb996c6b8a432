//! In-memory ActorDirectory implementation for tests and local hosts.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use waystone_core::{ActorId, EffectError, Position};

use super::ActorDirectory;

/// Connected actor as tracked by [`InMemoryDirectory`].
#[derive(Debug, Clone, PartialEq)]
pub struct ActorSession {
    pub name: String,
    pub position: Position,
}

/// Thread-safe table of connected actors.
///
/// Hosts without a real session layer (the console, tests) mutate it directly
/// and hand an `Arc` of it to the runtime.
#[derive(Default)]
pub struct InMemoryDirectory {
    sessions: RwLock<HashMap<ActorId, ActorSession>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connected actor, replacing any previous session.
    pub fn join(&self, actor: ActorId, name: impl Into<String>, position: Position) {
        let session = ActorSession {
            name: name.into(),
            position,
        };
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(actor, session);
    }

    /// Removes the actor. Returns false if it was not connected.
    pub fn leave(&self, actor: ActorId) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&actor)
            .is_some()
    }

    /// Updates the actor's position. Returns false if it is not connected.
    pub fn move_to(&self, actor: ActorId, position: Position) -> bool {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match sessions.get_mut(&actor) {
            Some(session) => {
                session.position = position;
                true
            }
            None => false,
        }
    }

    /// Relocation effect used by warmups and accepted requests.
    pub fn teleport(&self, actor: ActorId, target: &Position) -> Result<(), EffectError> {
        if self.move_to(actor, target.clone()) {
            Ok(())
        } else {
            Err(EffectError::Unreachable(actor))
        }
    }

    pub fn session(&self, actor: ActorId) -> Option<ActorSession> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&actor)
            .cloned()
    }

    /// Case-insensitive lookup by display name.
    pub fn find_by_name(&self, name: &str) -> Option<ActorId> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(_, session)| session.name.eq_ignore_ascii_case(name))
            .map(|(actor, _)| *actor)
    }

    pub fn name_of(&self, actor: ActorId) -> Option<String> {
        self.session(actor).map(|session| session.name)
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ActorDirectory for InMemoryDirectory {
    fn is_reachable(&self, actor: ActorId) -> bool {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&actor)
    }

    fn current_position(&self, actor: ActorId) -> Option<Position> {
        self.session(actor).map(|session| session.position)
    }
}
