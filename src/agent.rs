//! Tabular Q-learning agent: ε-greedy policy, optimistic initial values,
//! back-up update (spec.md §4.7).

use rand::Rng;

use crate::experience::Experience;
use crate::model::{ActionRef, StateActionRef, StateRef, Transition};
use crate::role::{OutcomeResult, Role};

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct AgentConfig {
    pub initial_value: f64,
    pub fixed_step_size: f64,
    pub sample_average: bool,
    pub discount_rate: f64,
    pub epsilon: f64,
    pub epsilon_reduction: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            initial_value: 0.0,
            fixed_step_size: 0.5,
            sample_average: false,
            discount_rate: 0.9,
            epsilon: 0.1,
            epsilon_reduction: 1.0,
        }
    }
}

#[derive(Debug, Default)]
pub struct QLearningAgent {
    pub config: AgentConfig,
    choice_count: u64,
    exploration_count: u64,
}

impl QLearningAgent {
    pub fn new(config: AgentConfig) -> Self {
        Self {
            config,
            choice_count: 0,
            exploration_count: 0,
        }
    }

    pub fn get_action_choice_count(&self) -> u64 {
        self.choice_count
    }

    pub fn get_exploration_action_count(&self) -> u64 {
        self.exploration_count
    }

    pub fn reset(&mut self, experience: &mut Experience) {
        experience.reset();
        self.reset_stats_only();
    }

    pub fn reset_stats(&mut self, experience: &mut Experience) {
        experience.reset_stats();
        self.reset_stats_only();
    }

    fn reset_stats_only(&mut self) {
        self.choice_count = 0;
        self.exploration_count = 0;
    }

    /// Effective epsilon for a state: decays once the agent has seen the
    /// state at least as often as its branching factor (spec.md §4.7, open
    /// question 3: the difference clamps to zero rather than going negative).
    fn effective_epsilon(&self, visits: u32, branching: usize) -> f64 {
        if self.config.epsilon_reduction <= 0.0 || self.config.epsilon_reduction == 1.0 {
            return self.config.epsilon;
        }
        let over = visits.saturating_sub(branching as u32);
        self.config.epsilon * self.config.epsilon_reduction.powi(over as i32)
    }

    /// Choose an action from `possible`, returning its `ActionRef` index as
    /// `i64`, or `-1` if `possible` is empty (spec.md §4.7, §6.2).
    pub fn choose_action(
        &mut self,
        experience: &mut Experience,
        possible: &[ActionRef],
        state: StateRef,
        update_policy: bool,
    ) -> i64 {
        if possible.is_empty() {
            return -1;
        }
        let visits = experience.visits(state);
        let eps = self.effective_epsilon(visits, possible.len());
        let mut rng = rand::rng();
        let explore = rng.random::<f64>() < eps;

        // Greedy choice uses `initial_value` for any action not yet in the
        // value table, so with `initial_value` optimistic and `epsilon = 0`
        // the first argmax tie visits every action once (in list order)
        // before any of them is revisited (spec.md invariant 7).
        let chosen = if explore {
            rng.random_range(0..possible.len())
        } else {
            let mut best_i = 0usize;
            let mut best_v = experience
                .values
                .get(StateActionRef(state, possible[0]))
                .unwrap_or(self.config.initial_value);
            for (i, a) in possible.iter().enumerate().skip(1) {
                let v = experience
                    .values
                    .get(StateActionRef(state, *a))
                    .unwrap_or(self.config.initial_value);
                if v > best_v {
                    best_v = v;
                    best_i = i;
                }
            }
            best_i
        };

        if update_policy {
            *experience.visits.entry(state).or_insert(0) += 1;
            if explore {
                self.exploration_count += 1;
            }
        }
        self.choice_count += 1;
        possible[chosen].0 as i64
    }

    /// Single back-up step for one transition (spec.md §4.7, invariant 8).
    fn q_learn(&self, experience: &mut Experience, transition: Transition, reward_end: i64) {
        let sa = StateActionRef(transition.start, transition.action);
        let old = experience.values.get(sa).unwrap_or(self.config.initial_value);

        let v_next = match experience.observed_actions.get(&transition.end) {
            Some(actions) if !actions.is_empty() => actions
                .iter()
                .map(|a| {
                    experience
                        .values
                        .get(StateActionRef(transition.end, *a))
                        .unwrap_or(self.config.initial_value)
                })
                .fold(f64::NEG_INFINITY, f64::max),
            _ => self.config.initial_value,
        };

        let target = reward_end as f64 + self.config.discount_rate * v_next;
        let visits = experience.state_action_visits(sa);
        let alpha = if self.config.sample_average {
            1.0 / (1.0 + visits as f64)
        } else {
            self.config.fixed_step_size
        };
        let new_value = old + alpha * (target - old);
        experience.values.set(sa, new_value);
        *experience.state_action_visits.entry(sa).or_insert(0) += 1;
        experience
            .observed_actions
            .entry(transition.start)
            .or_default()
            .insert(transition.action);
    }

    /// Applies `q_learn` to the last transition always, and — on a terminal
    /// result — walks the sequence in reverse, back-propagating the
    /// terminal reward (spec.md §4.7, invariant 9).
    pub fn learn(
        &self,
        experience: &mut Experience,
        model: &crate::model::Model,
        role: &Role,
        transitions: &[Transition],
        last_result: OutcomeResult,
    ) {
        let Some((last, rest)) = transitions.split_last() else {
            return;
        };
        let reward = model.state_info(role, last.end).reward;
        self.q_learn(experience, *last, reward);

        if matches!(
            last_result,
            OutcomeResult::Succeeded | OutcomeResult::Failed | OutcomeResult::Deadlock
        ) {
            for t in rest.iter().rev() {
                let reward = model.state_info(role, t.end).reward;
                self.q_learn(experience, *t, reward);
            }
        }
    }
}
