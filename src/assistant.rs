//! Assistant: drives episode lifecycle; extracts suggestions/warnings from
//! experience (spec.md §4.8).

use std::collections::HashMap;

use crate::cyber_system::CyberSystem;
use crate::error::{Error, Result};
use crate::experience::{Episode, Experience, StoreOutcome};
use crate::model::{ActionRef, Model, StateRef};
use crate::role::{OutcomeResult, Role};

/// Outcome of a single `take_action`/`train` call (spec.md §7).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorTag {
    None,
    UnknownAgent,
    NoActionFound,
    Unknown,
}

#[derive(Debug, Clone, Copy)]
pub struct ActionOutcome {
    pub result: OutcomeResult,
    pub multi_agent: bool,
    pub new_episode: bool,
    pub completed_episode: bool,
    pub stuck: bool,
    pub error: ErrorTag,
    pub reward: i64,
    pub performance: i64,
    pub state: StateRef,
}

impl ActionOutcome {
    pub fn deadlock(state: StateRef) -> Self {
        Self {
            result: OutcomeResult::Deadlock,
            multi_agent: false,
            new_episode: false,
            completed_episode: true,
            stuck: false,
            error: ErrorTag::None,
            reward: 0,
            performance: 0,
            state,
        }
    }

    pub fn denied(state: StateRef) -> Self {
        Self {
            result: OutcomeResult::Denied,
            multi_agent: false,
            new_episode: false,
            completed_episode: false,
            stuck: true,
            error: ErrorTag::NoActionFound,
            reward: 0,
            performance: 0,
            state,
        }
    }
}

pub struct Assistant {
    model: Model,
    role: Role,
    id: String,
    experiences: HashMap<String, Experience>,
    goal: String,
    current: Option<Episode>,
}

impl Assistant {
    pub fn new(model: Model, role: Role, id: impl Into<String>, goal: impl Into<String>) -> Self {
        let id = id.into();
        let goal = goal.into();
        let mut experiences = HashMap::new();
        experiences.insert(goal.clone(), Experience::new(model.name(), role.name.clone(), goal.clone(), id.clone()));
        Self {
            model,
            role,
            id,
            experiences,
            goal,
            current: None,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn role_name(&self) -> &str {
        &self.role.name
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn set_goal(&mut self, goal: impl Into<String>) {
        let goal = goal.into();
        self.experiences
            .entry(goal.clone())
            .or_insert_with(|| Experience::new(self.model.name(), self.role.name.clone(), goal.clone(), self.id.clone()));
        self.goal = goal;
    }

    pub fn experience(&self) -> &Experience {
        self.experiences.get(&self.goal).expect("goal always has an experience entry")
    }

    pub fn experience_mut(&mut self) -> &mut Experience {
        self.experiences.get_mut(&self.goal).expect("goal always has an experience entry")
    }

    pub fn current_episode(&self) -> Option<&Episode> {
        self.current.as_ref()
    }

    pub fn last_state(&self) -> Option<StateRef> {
        self.current.as_ref().map(|e| e.last)
    }

    /// Discards any in-progress current episode — uncompleted episodes are
    /// never stored — and begins a new one from `initial`.
    pub fn start_episode(&mut self, initial: StateRef) {
        self.current = Some(Episode::new(initial));
    }

    pub fn new_episode(&mut self) {
        let initial = self.current.as_ref().map(|e| e.initial);
        if let Some(initial) = initial {
            self.start_episode(initial);
        }
    }

    /// Drive one step: execute `action` through the cyber system, evaluate
    /// the new state against this assistant's role, append the transition,
    /// and (on completion) compute performance and store the episode
    /// (spec.md §4.8).
    pub fn take_action(
        &mut self,
        system: &mut dyn CyberSystem,
        action_ref: ActionRef,
        update_xp: bool,
    ) -> Result<ActionOutcome> {
        let episode = self.current.as_mut().ok_or(Error::NotInitialised)?;
        let prev = episode.last;
        let action = self.model.decode_action(action_ref);
        if !system.execute_action(&action) {
            return Ok(ActionOutcome::denied(prev));
        }
        let observed = system.interpret_system_state();
        let new_state = self.model.get_stored(observed);
        let info = self.model.state_info(&self.role, new_state);

        let episode = self.current.as_mut().expect("checked above");
        episode.transitions.push(crate::model::Transition {
            start: prev,
            action: action_ref,
            end: new_state,
        });
        episode.last = new_state;
        episode.result = info.result;

        let completed = episode.is_completed();
        let mut performance = 0;
        if completed {
            performance = self.compute_performance(info.result);
            self.current.as_mut().unwrap().performance = performance;
            self.promote_experience_level(info.result);
        }

        if update_xp && completed {
            let episode = self.current.take().expect("completed implies Some");
            self.experience_mut().store_episode(episode, true);
        }

        Ok(ActionOutcome {
            result: info.result,
            multi_agent: false,
            new_episode: false,
            completed_episode: completed,
            stuck: false,
            error: ErrorTag::None,
            reward: info.reward,
            performance,
            state: new_state,
        })
    }

    /// Finalizes the current episode as a deadlock with no further
    /// transition — no candidate action was available, or every candidate
    /// led back into an already-visited state (spec.md §4.9 step 4) — and,
    /// when `update_xp`, stores it, same as a deadlock reached by
    /// `take_action`.
    pub fn record_deadlock(&mut self, update_xp: bool) -> ActionOutcome {
        let Some(episode) = self.current.as_mut() else {
            return ActionOutcome::deadlock(StateRef(0));
        };
        let state = episode.last;
        episode.result = OutcomeResult::Deadlock;
        let performance = self.compute_performance(OutcomeResult::Deadlock);
        self.current.as_mut().unwrap().performance = performance;
        self.promote_experience_level(OutcomeResult::Deadlock);
        if update_xp {
            self.store_current_if_completed();
        }
        ActionOutcome {
            performance,
            ..ActionOutcome::deadlock(state)
        }
    }

    /// Appends a transition this assistant did not choose but observed —
    /// another actor's move in a shared arena (spec.md §4.10) — to the
    /// current episode, re-evaluating this assistant's own role against the
    /// resulting state.
    pub fn acquire_transition(&mut self, action: ActionRef, new_state: StateRef) {
        let Some(episode) = self.current.as_mut() else {
            return;
        };
        let start = episode.last;
        episode.transitions.push(crate::model::Transition {
            start,
            action,
            end: new_state,
        });
        episode.last = new_state;
        let info = self.model.state_info(&self.role, new_state);
        episode.result = info.result;
        if episode.is_completed() {
            self.promote_experience_level(info.result);
        }
    }

    fn promote_experience_level(&mut self, result: OutcomeResult) {
        use crate::experience::ExperienceLevel;
        let xp = self.experience_mut();
        if xp.level == ExperienceLevel::None {
            xp.level = ExperienceLevel::Trainee;
        }
        if result == OutcomeResult::Succeeded && xp.level == ExperienceLevel::Trainee {
            xp.level = ExperienceLevel::Assistant;
        }
    }

    /// Performance discounting (spec.md §4.8, §9): non-success results use
    /// the role's raw result reward; successes over one action discount by
    /// `γ^actions_count`, where `γ` is either the configured discounting
    /// constant or, if negative, auto-computed from the in-progress and
    /// succeeded rewards.
    fn compute_performance(&self, result: OutcomeResult) -> i64 {
        let episode = self.current.as_ref().expect("caller checked completion");
        if result != OutcomeResult::Succeeded {
            return self.role.rewards.result_reward(result);
        }
        let reward_succeeded = self.role.rewards.result_reward(OutcomeResult::Succeeded);
        let actions = episode.transitions.len();
        if actions <= 1 {
            return reward_succeeded;
        }
        let gamma = self.effective_gamma();
        (reward_succeeded as f64 * gamma.powi(actions as i32)) as i64
    }

    fn effective_gamma(&self) -> f64 {
        let configured = self.experience().discounting_constant;
        if configured >= 0.0 {
            return configured;
        }
        let r0 = self.role.rewards.result_reward(OutcomeResult::InProgress) as f64;
        let rs = self.role.rewards.result_reward(OutcomeResult::Succeeded) as f64;
        if rs == 0.0 {
            return 0.9;
        }
        let ratio = r0 / rs;
        if ratio <= 0.0 {
            (1.0 - ratio.abs()).clamp(0.0, 1.0)
        } else {
            (1.0 + ratio).clamp(1.0, 2.0)
        }
    }

    /// Actions advised by past best-per-goal episodes from the current
    /// state, in best-episode order, with no cross-episode dedup (spec.md
    /// §4.8). Requires experience level ≥ `assistant`.
    pub fn suggested_actions(&self) -> Vec<ActionRef> {
        use crate::experience::ExperienceLevel;
        let xp = self.experience();
        if xp.level < ExperienceLevel::Assistant {
            return Vec::new();
        }
        let Some(last) = self.last_state() else { return Vec::new() };
        let mut out = Vec::new();
        for &idx in &xp.best_episodes {
            for t in &xp.episodes[idx].transitions {
                if t.start == last {
                    out.push(t.action);
                }
            }
        }
        out
    }

    /// Actions previously observed leading to failure from the current
    /// state (spec.md §4.8).
    pub fn forbidden_actions(&self) -> Vec<ActionRef> {
        let Some(last) = self.last_state() else { return Vec::new() };
        self.experience()
            .failed_transitions
            .iter()
            .filter(|t| t.start == last)
            .map(|t| t.action)
            .collect()
    }

    pub(crate) fn store_current_if_completed(&mut self) -> Option<StoreOutcome> {
        if self.current.as_ref().is_some_and(Episode::is_completed) {
            let episode = self.current.take().unwrap();
            Some(self.experience_mut().store_episode(episode, true))
        } else {
            None
        }
    }
}
