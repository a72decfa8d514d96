//! Training/acting agent: pairs an [`Assistant`] with a [`QLearningAgent`]
//! and drives a cyber system through episodes (spec.md §4.9, §6.3).

use std::collections::HashSet;

use crate::agent::QLearningAgent;
use crate::assistant::{ActionOutcome, Assistant, ErrorTag};
use crate::cyber_system::CyberSystem;
use crate::error::{Error, Result};
use crate::model::{Action, ActionRef, StateRef};

/// Bitflags controlling one `take_action` call (spec.md §6.3). Hand-rolled
/// rather than pulled from a crate: three bits, no need for a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentMode(u8);

impl AgentMode {
    pub const JUST_ACT: AgentMode = AgentMode(0b001);
    pub const LEARN: AgentMode = AgentMode(0b010);
    pub const LOOP_DETECTION: AgentMode = AgentMode(0b100);
    pub const DEFAULT: AgentMode = AgentMode(0b110);

    pub fn contains(self, other: AgentMode) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for AgentMode {
    type Output = AgentMode;
    fn bitor(self, rhs: AgentMode) -> AgentMode {
        AgentMode(self.0 | rhs.0)
    }
}

/// Pairs the episode/experience bookkeeping in [`Assistant`] with the
/// decision/learning logic in [`QLearningAgent`], adding loop detection over
/// states visited within the current episode (spec.md §4.9).
pub struct CyberAgent {
    assistant: Assistant,
    agent: QLearningAgent,
    visited: HashSet<StateRef>,
    deadlocked_actions: HashSet<ActionRef>,
}

impl CyberAgent {
    pub fn new(assistant: Assistant, agent: QLearningAgent) -> Self {
        Self {
            assistant,
            agent,
            visited: HashSet::new(),
            deadlocked_actions: HashSet::new(),
        }
    }

    pub fn assistant(&self) -> &Assistant {
        &self.assistant
    }

    pub fn assistant_mut(&mut self) -> &mut Assistant {
        &mut self.assistant
    }

    pub fn agent(&self) -> &QLearningAgent {
        &self.agent
    }

    pub fn start_episode(&mut self, system: &mut dyn CyberSystem) {
        let observed = system.interpret_system_state();
        let state = self.assistant.model().get_stored(observed);
        self.assistant.start_episode(state);
        self.visited.clear();
        self.visited.insert(state);
        self.deadlocked_actions.clear();
    }

    /// Predicts a candidate action's destination without mutating the live
    /// system, by cloning it (spec.md §4.9). Used to avoid re-entering a
    /// state already visited this episode.
    fn would_revisit(&self, system: &dyn CyberSystem, action: &Action) -> Option<StateRef> {
        let mut probe = system.box_clone();
        if !probe.execute_action(action) {
            return None;
        }
        let observed = probe.interpret_system_state();
        let dest = self.assistant.model().get_stored(observed);
        if self.visited.contains(&dest) {
            Some(dest)
        } else {
            None
        }
    }

    /// One training step: pick an action via the underlying Q-learning
    /// policy — filtering out actions known to lead back into an already
    /// visited state when `mode` requests loop detection — execute it, and
    /// (unless `JUST_ACT` suppresses it) back up the Q-values.
    pub fn take_action(
        &mut self,
        system: &mut dyn CyberSystem,
        mode: AgentMode,
        update_xp: bool,
    ) -> Result<ActionOutcome> {
        let state = self.assistant.last_state().ok_or(Error::NotInitialised)?;
        let role_name = self.assistant.role_name().to_string();
        let candidates = system.get_available_actions(Some(&role_name), false);
        if candidates.is_empty() {
            return Ok(self.assistant.record_deadlock(update_xp));
        }

        let model = self.assistant.model().clone();
        let mut refs: Vec<ActionRef> = candidates.iter().map(|a| model.encode_action(a.clone())).collect();

        if mode.contains(AgentMode::LOOP_DETECTION) {
            let mut filtered = Vec::new();
            for (action, &aref) in candidates.iter().zip(refs.iter()) {
                if !self.deadlocked_actions.contains(&aref) && self.would_revisit(system, action).is_none() {
                    filtered.push(aref);
                }
            }
            if filtered.is_empty() {
                return Ok(self.assistant.record_deadlock(update_xp));
            }
            refs = filtered;
        }

        let choice = self
            .agent
            .choose_action(self.assistant.experience_mut(), &refs, state, !mode.contains(AgentMode::JUST_ACT));
        if choice < 0 {
            return Ok(self.assistant.record_deadlock(update_xp));
        }
        let action_ref = ActionRef(choice as usize);

        let outcome = self.assistant.take_action(system, action_ref, false)?;
        if outcome.error == ErrorTag::NoActionFound {
            return Ok(outcome);
        }

        if outcome.state == state {
            self.deadlocked_actions.insert(action_ref);
        } else {
            self.visited.insert(outcome.state);
        }

        if mode.contains(AgentMode::LEARN) {
            if let Some(transitions) = self.assistant.current_episode().map(|e| e.transitions.clone()) {
                let role = self.assistant.role().clone();
                self.agent
                    .learn(self.assistant.experience_mut(), &model, &role, &transitions, outcome.result);
            }
        }

        if outcome.completed_episode && update_xp {
            self.assistant.store_current_if_completed();
        }

        Ok(outcome)
    }

    /// Runs episodes to completion until `episodes` have been stored, always
    /// learning (spec.md §4.9).
    pub fn train(&mut self, system: &mut dyn CyberSystem, episodes: u32) -> Result<()> {
        for _ in 0..episodes {
            self.start_episode(system);
            loop {
                let outcome = self.take_action(system, AgentMode::DEFAULT, true)?;
                if outcome.completed_episode || outcome.stuck {
                    break;
                }
            }
            system.reset_system();
        }
        Ok(())
    }
}
