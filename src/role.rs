//! Role + reward evaluator (spec.md §3 "Role", §4.5).

use std::collections::BTreeMap;

use crate::condition::{Condition, EntityCondition, FeatureCondition, PropertyCondition};
use crate::model::state::EnvState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum OutcomeResult {
    InProgress,
    Succeeded,
    Failed,
    Deadlock,
    Denied,
}

#[derive(Debug, Clone, Copy)]
pub struct StateInfo {
    pub reward: i64,
    pub result: OutcomeResult,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct RewardRules {
    pub result_reward: BTreeMap<OutcomeResult, i64>,
    /// cumulative per-type property rewards: every entity of `type_name`
    /// whose property condition matches adds `reward`.
    pub cumulative: Vec<(String, PropertyCondition, i64)>,
    pub entity_terms: Vec<(EntityCondition, i64)>,
    pub feature_terms: Vec<(FeatureCondition, i64)>,
}

impl RewardRules {
    pub fn result_reward(&self, result: OutcomeResult) -> i64 {
        *self.result_reward.get(&result).unwrap_or(&0)
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Role {
    pub name: String,
    pub model: String,
    pub success: Condition,
    pub failure: Option<Condition>,
    pub deadlock: Option<Condition>,
    pub rewards: RewardRules,
}

impl Role {
    pub fn new(model: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            name: name.into(),
            success: Condition::new(),
            failure: None,
            deadlock: None,
            rewards: RewardRules::default(),
        }
    }

    pub fn has_feature_rewards(&self) -> bool {
        !self.rewards.feature_terms.is_empty()
    }

    /// Order of evaluation (spec.md §4.5): failure precedes success
    /// precedes deadlock. Failure takes precedence over a simultaneously
    /// satisfied success condition.
    pub fn result_for(&self, env: &EnvState) -> OutcomeResult {
        if self.failure.as_ref().is_some_and(|c| c.evaluate(env)) {
            return OutcomeResult::Failed;
        }
        if self.success.evaluate(env) {
            return OutcomeResult::Succeeded;
        }
        if self.deadlock.as_ref().is_some_and(|c| c.evaluate(env)) {
            return OutcomeResult::Deadlock;
        }
        OutcomeResult::InProgress
    }

    /// Reward composition (spec.md §4.5). `in_progress` has no per-state
    /// reward of its own — its `result_reward` entry is only a discounting
    /// ratio input, read elsewhere for performance calculations — so this
    /// returns `0` here. `failed` stops at the fixed result reward; only
    /// `succeeded`/`deadlock` sum in the cumulative, entity-condition and
    /// feature reward terms.
    pub fn reward_for(&self, env: &EnvState, result: OutcomeResult) -> i64 {
        if result == OutcomeResult::InProgress {
            return 0;
        }
        let base = self.rewards.result_reward(result);
        if result == OutcomeResult::Failed {
            return base;
        }
        let mut total = base;
        for (type_name, cond, reward) in &self.rewards.cumulative {
            for entity in env.entities.values() {
                if entity.type_name == *type_name && cond.eval_entity(entity) {
                    total += reward;
                }
            }
        }
        for (cond, reward) in &self.rewards.entity_terms {
            if cond.eval(env) {
                total += reward;
            }
        }
        for (cond, reward) in &self.rewards.feature_terms {
            if cond.eval(env) {
                total += reward * cond.reward_multiplier(env);
            }
        }
        total
    }

    pub fn state_info(&self, env: &EnvState) -> StateInfo {
        let result = self.result_for(env);
        let reward = self.reward_for(env, result);
        StateInfo { reward, result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{CompareOp, EntityCondition, PropertyCondition};
    use std::collections::BTreeMap;

    fn env_with(id: &str, props: &[(&str, &str)]) -> EnvState {
        let mut env = EnvState::new();
        env.entities.insert(
            id.into(),
            crate::model::state::EntityState {
                type_name: "T".into(),
                properties: props.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
                relationships: BTreeMap::new(),
            },
        );
        env
    }

    #[test]
    fn failure_precedes_success_s3() {
        let mut role = Role::new("M", "Player1");
        role.success = Condition::new().with_entity(
            EntityCondition::new("X").with_property(PropertyCondition::new("Ok", CompareOp::Equal, "true")),
        );
        role.failure = Some(Condition::new().with_entity(
            EntityCondition::new("Y").with_property(PropertyCondition::new("Burnt", CompareOp::Equal, "true")),
        ));
        let mut env = env_with("X", &[("Ok", "true")]);
        env.entities.insert(
            "Y".into(),
            crate::model::state::EntityState {
                type_name: "T".into(),
                properties: [("Burnt".to_string(), "true".to_string())].into_iter().collect(),
                relationships: BTreeMap::new(),
            },
        );
        assert_eq!(role.result_for(&env), OutcomeResult::Failed);
    }

    #[test]
    fn reward_composition_adds_matched_terms() {
        let mut role = Role::new("M", "R");
        role.rewards.result_reward.insert(OutcomeResult::Succeeded, 1000);
        role.success =
            Condition::new().with_entity(EntityCondition::new("X").with_property(PropertyCondition::new(
                "Ok",
                CompareOp::Equal,
                "true",
            )));
        role.rewards.entity_terms.push((
            EntityCondition::new("X").with_property(PropertyCondition::new("Bonus", CompareOp::Defined, "")),
            50,
        ));
        let env = env_with("X", &[("Ok", "true"), ("Bonus", "1")]);
        let info = role.state_info(&env);
        assert_eq!(info.result, OutcomeResult::Succeeded);
        assert_eq!(info.reward, 1050);
    }
}
