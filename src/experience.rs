//! Experience store: episodes, failed transitions, best-per-goal episodes,
//! state-action value table (spec.md §3 "Episode"/"Experience", §4.6).

use std::collections::{HashMap, HashSet};

use crate::model::{ActionRef, StateActionRef, StateRef, Transition};
use crate::role::OutcomeResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum ExperienceLevel {
    None,
    Trainee,
    Assistant,
    Trainer,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Episode {
    pub initial: StateRef,
    pub transitions: Vec<Transition>,
    pub last: StateRef,
    pub performance: i64,
    pub result: OutcomeResult,
    pub repetitions: u32,
}

impl Episode {
    pub fn new(initial: StateRef) -> Self {
        Self {
            initial,
            transitions: Vec::new(),
            last: initial,
            performance: 0,
            result: OutcomeResult::InProgress,
            repetitions: 0,
        }
    }

    /// An episode is completed iff its result is terminal (invariant 4).
    pub fn is_completed(&self) -> bool {
        matches!(
            self.result,
            OutcomeResult::Succeeded | OutcomeResult::Failed | OutcomeResult::Deadlock
        )
    }
}

#[derive(Debug, Default)]
pub struct ValueTable(HashMap<StateActionRef, f64>);

impl ValueTable {
    pub fn defined(&self, sa: StateActionRef) -> bool {
        self.0.contains_key(&sa)
    }

    pub fn get(&self, sa: StateActionRef) -> Option<f64> {
        self.0.get(&sa).copied()
    }

    pub fn set(&mut self, sa: StateActionRef, value: f64) {
        self.0.insert(sa, value);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateActionRef, &f64)> {
        self.0.iter()
    }
}

pub enum StoreOutcome {
    Stored,
    Duplicate,
}

/// Per-(model, role, goal, agent) store of episodes, failed transitions and
/// learned values (spec.md §3 "Experience").
pub struct Experience {
    pub model: String,
    pub role: String,
    pub goal: String,
    pub agent: String,
    pub level: ExperienceLevel,
    pub episodes: Vec<Episode>,
    pub best_episodes: Vec<usize>,
    pub best_episode: Option<usize>,
    pub failed_transitions: HashSet<Transition>,
    pub values: ValueTable,
    pub system_failure_ignored: bool,
    /// Performance discount applied at episode completion. Negative means
    /// "auto-compute from result rewards" (spec.md §4.8, §9 design notes).
    pub discounting_constant: f64,
    pub(crate) visits: HashMap<StateRef, u32>,
    pub(crate) state_action_visits: HashMap<StateActionRef, u32>,
    pub(crate) observed_actions: HashMap<StateRef, HashSet<ActionRef>>,
}

impl Experience {
    pub fn new(model: impl Into<String>, role: impl Into<String>, goal: impl Into<String>, agent: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            role: role.into(),
            goal: goal.into(),
            agent: agent.into(),
            level: ExperienceLevel::None,
            episodes: Vec::new(),
            best_episodes: Vec::new(),
            best_episode: None,
            failed_transitions: HashSet::new(),
            values: ValueTable::default(),
            system_failure_ignored: false,
            discounting_constant: 0.9,
            visits: HashMap::new(),
            state_action_visits: HashMap::new(),
            observed_actions: HashMap::new(),
        }
    }

    pub fn visits(&self, state: StateRef) -> u32 {
        *self.visits.get(&state).unwrap_or(&0)
    }

    pub fn state_action_visits(&self, sa: StateActionRef) -> u32 {
        *self.state_action_visits.get(&sa).unwrap_or(&0)
    }

    pub fn best_episode(&self) -> Option<&Episode> {
        self.best_episode.map(|i| &self.episodes[i])
    }

    /// Store a completed episode, suppressing exact duplicates (spec.md
    /// §4.6, invariant 6). A duplicate (equal initial state and transition
    /// sequence) increments `repetitions` on the existing entry instead of
    /// growing `episodes`.
    pub fn store_episode(&mut self, episode: Episode, check_duplicate: bool) -> StoreOutcome {
        if check_duplicate {
            if let Some(existing) = self
                .episodes
                .iter_mut()
                .find(|e| e.initial == episode.initial && e.transitions == episode.transitions)
            {
                existing.repetitions += 1;
                return StoreOutcome::Duplicate;
            }
        }

        if episode.result == OutcomeResult::Failed {
            if let Some(last) = episode.transitions.last() {
                self.failed_transitions.insert(*last);
            }
        }

        let idx = self.episodes.len();
        if episode.result == OutcomeResult::Succeeded {
            match self.best_episode {
                None => {
                    self.best_episode = Some(idx);
                    self.best_episodes = vec![idx];
                }
                Some(best_idx) => {
                    let best_perf = self.episodes[best_idx].performance;
                    if episode.performance > best_perf {
                        self.best_episode = Some(idx);
                        self.best_episodes = vec![idx];
                    } else if episode.performance == best_perf {
                        self.best_episodes.push(idx);
                    }
                }
            }
        }
        self.episodes.push(episode);
        StoreOutcome::Stored
    }

    /// Clears the value table and all visit/exploration statistics.
    pub fn reset(&mut self) {
        self.values.clear();
        self.reset_stats();
    }

    /// Clears visit/exploration counters only, keeping the value table.
    pub fn reset_stats(&mut self) {
        self.visits.clear();
        self.state_action_visits.clear();
        self.observed_actions.clear();
    }
}
