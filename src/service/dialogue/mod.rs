pub mod model;

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use dashmap::DashMap;
use model::DialogState;
use teloxide::types::UserId;

// Every `set` stamps a fresh generation, so a guard only clears the entry it acquired.
#[derive(Clone, Copy, Debug)]
struct Entry {
    state: DialogState,
    generation: u64,
}

/// In-memory dialog state per user. Absent entries are `Idle`; nothing survives a restart.
#[derive(Clone, Default)]
pub struct DialogueStore {
    states: Arc<DashMap<UserId, Entry>>,
    generations: Arc<AtomicU64>,
}

impl DialogueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: UserId) -> DialogState {
        self.states.get(&user_id).map(|entry| entry.state).unwrap_or_default()
    }

    pub fn set(&self, user_id: UserId, state: DialogState) {
        if state == DialogState::Idle {
            self.states.remove(&user_id);
        } else {
            let generation = self.generations.fetch_add(1, Ordering::Relaxed);
            self.states.insert(user_id, Entry { state, generation });
        }
    }

    pub fn reset(&self, user_id: UserId) {
        self.states.remove(&user_id);
    }

    /// Takes ownership of a state-specific step. The returned guard puts the user
    /// back to `Idle` when dropped, whatever path the handler leaves through.
    /// Returns `None` if the user is not in `expected`.
    pub fn acquire(&self, user_id: UserId, expected: DialogState) -> Option<DialogueGuard> {
        if expected == DialogState::Idle {
            return None;
        }
        let entry = *self.states.get(&user_id)?;
        if entry.state != expected {
            return None;
        }
        Some(DialogueGuard {
            states: Arc::clone(&self.states),
            user_id,
            generation: entry.generation,
        })
    }
}

#[derive(Debug)]
pub struct DialogueGuard {
    states: Arc<DashMap<UserId, Entry>>,
    user_id: UserId,
    generation: u64,
}

impl Drop for DialogueGuard {
    fn drop(&mut self) {
        // any state set after acquiring, even an equal one, is kept
        let generation = self.generation;
        if self
            .states
            .remove_if(&self.user_id, |_, current| current.generation == generation)
            .is_some()
        {
            debug!("Dialog state of user {} cleared", self.user_id);
        }
    }
}
