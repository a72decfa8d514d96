//! Shared arena: turn-based multi-agent play over one common environment
//! state (spec.md §4.10).

use crate::assistant::{ActionOutcome, Assistant};
use crate::cyber_system::CyberSystem;
use crate::error::{Error, Result};
use crate::model::Action;

/// One participant in a shared arena: an assistant plus the id it acts
/// under.
pub struct Actor {
    pub id: String,
    pub assistant: Assistant,
}

/// Coordinates several [`Actor`]s taking turns against one cyber system,
/// broadcasting every transition to the non-acting actors so each keeps an
/// experience store consistent with the shared state (spec.md §4.10).
pub struct SharedArena {
    actors: Vec<Actor>,
}

impl SharedArena {
    pub fn new(actors: Vec<Actor>) -> Self {
        Self { actors }
    }

    pub fn actor(&self, id: &str) -> Option<&Actor> {
        self.actors.iter().find(|a| a.id == id)
    }

    fn actor_index(&self, id: &str) -> Result<usize> {
        self.actors
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| Error::UnknownAgent(id.to_string()))
    }

    /// Starts a fresh episode for every actor from the system's current
    /// state, `starter` acting first.
    pub fn new_episode(&mut self, system: &mut dyn CyberSystem, starter: &str) -> Result<()> {
        let _ = self.actor_index(starter)?;
        let observed = system.interpret_system_state();
        for actor in &mut self.actors {
            let state = actor.assistant.model().get_stored(observed.clone());
            actor.assistant.start_episode(state);
        }
        Ok(())
    }

    /// `actor` takes `action`; the resulting transition is appended to every
    /// other actor's current episode too, so their experience reflects
    /// moves they did not choose (spec.md §4.10, "shared arena").
    pub fn take_action(
        &mut self,
        system: &mut dyn CyberSystem,
        actor: &str,
        action: Action,
    ) -> Result<ActionOutcome> {
        let idx = self.actor_index(actor)?;
        let action_ref = self.actors[idx].assistant.model().encode_action(action);
        let outcome = self.actors[idx].assistant.take_action(system, action_ref, true)?;

        for (i, other) in self.actors.iter_mut().enumerate() {
            if i == idx {
                continue;
            }
            other.assistant.acquire_transition(action_ref, outcome.state);
        }

        Ok(outcome)
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }
}
