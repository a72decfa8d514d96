//! JSON persistence for the five document kinds a model/agent accumulates:
//! model definition, model knowledge (interned states/actions), role,
//! experience and agent configuration (spec.md §6.4).

use serde::{Deserialize, Serialize};

use crate::agent::AgentConfig;
use crate::error::{Error, Result};
use crate::experience::{Episode, Experience, ExperienceLevel, ValueTable};
use crate::model::{Action, EntityStateType, EnvState, Model, StateRef, Transition};
use crate::role::Role;

fn wrap_err(path: &str, source: serde_json::Error) -> Error {
    Error::SerializationError {
        path: path.to_string(),
        source,
    }
}

#[derive(Serialize, Deserialize)]
pub struct ModelDefinitionDoc {
    pub name: String,
    pub types: Vec<EntityStateType>,
    pub roles: Vec<Role>,
}

/// Everything that makes a model's symbolic content reproducible: entity
/// types and the roles declared against it. The learned values live in the
/// per-agent experience document instead.
pub fn model_definition_to_json(model: &Model) -> Result<String> {
    let doc = ModelDefinitionDoc {
        name: model.name(),
        types: model.iter_types(),
        roles: model.iter_roles(),
    };
    serde_json::to_string_pretty(&doc).map_err(|e| wrap_err("model_definition", e))
}

pub fn model_definition_from_json(model: &Model, json: &str) -> Result<()> {
    let doc: ModelDefinitionDoc = serde_json::from_str(json).map_err(|e| wrap_err("model_definition", e))?;
    for t in doc.types {
        model.create_type(t.parent.as_deref(), &t.name, t.defaults, t.possibles, t.links)?;
    }
    for role in doc.roles {
        model.add_role(role);
    }
    Ok(())
}

#[derive(Serialize, Deserialize)]
pub struct ModelKnowledgeDoc {
    pub name: String,
    pub states: Vec<(usize, EnvState)>,
    pub actions: Vec<(usize, Action)>,
}

/// The model's interned states/actions, in index order — loading this
/// document back into a fresh model reproduces the same `StateRef`s and
/// `ActionRef`s, since interning is first-seen order (spec.md invariant 1).
pub fn model_knowledge_to_json(model: &Model) -> Result<String> {
    let doc = ModelKnowledgeDoc {
        name: model.name(),
        states: model
            .iter_states()
            .into_iter()
            .map(|(i, s)| (i, (*s).clone()))
            .collect(),
        actions: model.iter_actions(),
    };
    serde_json::to_string_pretty(&doc).map_err(|e| wrap_err("model_knowledge", e))
}

pub fn model_knowledge_from_json(model: &Model, json: &str) -> Result<()> {
    let doc: ModelKnowledgeDoc = serde_json::from_str(json).map_err(|e| wrap_err("model_knowledge", e))?;
    let mut ordered = doc.states;
    ordered.sort_by_key(|(i, _)| *i);
    for (_, state) in ordered {
        model.get_stored(state);
    }
    let mut actions = doc.actions;
    actions.sort_by_key(|(i, _)| *i);
    for (_, action) in actions {
        model.encode_action(action);
    }
    Ok(())
}

pub fn role_to_json(role: &Role) -> Result<String> {
    serde_json::to_string_pretty(role).map_err(|e| wrap_err("role", e))
}

pub fn role_from_json(json: &str) -> Result<Role> {
    serde_json::from_str(json).map_err(|e| wrap_err("role", e))
}

pub fn agent_config_to_json(config: &AgentConfig) -> Result<String> {
    serde_json::to_string_pretty(config).map_err(|e| wrap_err("agent_config", e))
}

pub fn agent_config_from_json(json: &str) -> Result<AgentConfig> {
    serde_json::from_str(json).map_err(|e| wrap_err("agent_config", e))
}

/// On-the-wire shape of a [`Transition`]: actions are written by their
/// canonical string encoding, not the interning-session-local `ActionRef`
/// index (spec.md §6.4, §9 open question 4).
#[derive(Serialize, Deserialize)]
struct TransitionDoc {
    start_state: usize,
    action_taken: String,
    end_state: usize,
}

fn transition_to_doc(model: &Model, t: &Transition) -> TransitionDoc {
    TransitionDoc {
        start_state: t.start.0,
        action_taken: model.decode_action(t.action).encode(),
        end_state: t.end.0,
    }
}

fn transition_from_doc(model: &Model, doc: TransitionDoc) -> Transition {
    Transition {
        start: StateRef(doc.start_state),
        action: model.encode_action(Action::decode(&doc.action_taken)),
        end: StateRef(doc.end_state),
    }
}

/// On-the-wire shape of an [`Episode`] (spec.md §6.4).
#[derive(Serialize, Deserialize)]
struct EpisodeDoc {
    initial_state: usize,
    transitions: Vec<TransitionDoc>,
    last_state: usize,
    performance: i64,
    result: crate::role::OutcomeResult,
    repetitions_count: u32,
}

fn episode_to_doc(model: &Model, e: &Episode) -> EpisodeDoc {
    EpisodeDoc {
        initial_state: e.initial.0,
        transitions: e.transitions.iter().map(|t| transition_to_doc(model, t)).collect(),
        last_state: e.last.0,
        performance: e.performance,
        result: e.result,
        repetitions_count: e.repetitions,
    }
}

fn episode_from_doc(model: &Model, doc: EpisodeDoc) -> Episode {
    Episode {
        initial: StateRef(doc.initial_state),
        transitions: doc.transitions.into_iter().map(|t| transition_from_doc(model, t)).collect(),
        last: StateRef(doc.last_state),
        performance: doc.performance,
        result: doc.result,
        repetitions: doc.repetitions_count,
    }
}

/// On-the-wire shape of one state-action value table entry (spec.md §6.4:
/// `state_action_values:[{state, action, value}]`).
#[derive(Serialize, Deserialize)]
struct StateActionValueDoc {
    state: usize,
    action: String,
    value: f64,
}

#[derive(Serialize, Deserialize)]
struct ExperienceDoc {
    model: String,
    role: String,
    goal: String,
    agent: String,
    level: ExperienceLevel,
    episodes: Vec<EpisodeDoc>,
    best_episodes: Vec<usize>,
    best_episode: Option<usize>,
    failed_transitions: Vec<TransitionDoc>,
    state_action_values: Vec<StateActionValueDoc>,
    system_failure_ignored: bool,
    discounting_constant: f64,
}

pub fn experience_to_json(xp: &Experience, model: &Model) -> Result<String> {
    let doc = ExperienceDoc {
        model: xp.model.clone(),
        role: xp.role.clone(),
        goal: xp.goal.clone(),
        agent: xp.agent.clone(),
        level: xp.level,
        episodes: xp.episodes.iter().map(|e| episode_to_doc(model, e)).collect(),
        best_episodes: xp.best_episodes.clone(),
        best_episode: xp.best_episode,
        failed_transitions: xp.failed_transitions.iter().map(|t| transition_to_doc(model, t)).collect(),
        state_action_values: xp
            .values
            .iter()
            .map(|(sa, v)| StateActionValueDoc {
                state: sa.0 .0,
                action: model.decode_action(sa.1).encode(),
                value: *v,
            })
            .collect(),
        system_failure_ignored: xp.system_failure_ignored,
        discounting_constant: xp.discounting_constant,
    };
    serde_json::to_string_pretty(&doc).map_err(|e| wrap_err("experience", e))
}

pub fn experience_from_json(json: &str, model: &Model) -> Result<Experience> {
    let doc: ExperienceDoc = serde_json::from_str(json).map_err(|e| wrap_err("experience", e))?;
    let mut xp = Experience::new(doc.model, doc.role, doc.goal, doc.agent);
    xp.level = doc.level;
    xp.episodes = doc.episodes.into_iter().map(|e| episode_from_doc(model, e)).collect();
    xp.best_episodes = doc.best_episodes;
    xp.best_episode = doc.best_episode;
    xp.failed_transitions = doc
        .failed_transitions
        .into_iter()
        .map(|t| transition_from_doc(model, t))
        .collect();
    let mut values = ValueTable::default();
    for entry in doc.state_action_values {
        let action = model.encode_action(Action::decode(&entry.action));
        values.set(crate::model::StateActionRef(StateRef(entry.state), action), entry.value);
    }
    xp.values = values;
    xp.system_failure_ignored = doc.system_failure_ignored;
    xp.discounting_constant = doc.discounting_constant;
    Ok(xp)
}

/// Writes both halves of a model's persisted state using the
/// `<base>_<model>_model.json` / `<base>_<model>_model_knowl.json` naming
/// convention.
pub fn write_model_pair(dir: &std::path::Path, base: &str, model: &Model) -> Result<()> {
    let def_path = dir.join(format!("{base}_{}_model.json", model.name()));
    let knowl_path = dir.join(format!("{base}_{}_model_knowl.json", model.name()));
    std::fs::write(&def_path, model_definition_to_json(model)?)
        .map_err(|e| Error::InvalidConfiguration(format!("writing {}: {e}", def_path.display())))?;
    std::fs::write(&knowl_path, model_knowledge_to_json(model)?)
        .map_err(|e| Error::InvalidConfiguration(format!("writing {}: {e}", knowl_path.display())))?;
    Ok(())
}

pub fn read_model_pair(dir: &std::path::Path, base: &str, model: &Model) -> Result<()> {
    let def_path = dir.join(format!("{base}_{}_model.json", model.name()));
    let knowl_path = dir.join(format!("{base}_{}_model_knowl.json", model.name()));
    let def = std::fs::read_to_string(&def_path)
        .map_err(|e| Error::InvalidConfiguration(format!("reading {}: {e}", def_path.display())))?;
    let knowl = std::fs::read_to_string(&knowl_path)
        .map_err(|e| Error::InvalidConfiguration(format!("reading {}: {e}", knowl_path.display())))?;
    model_definition_from_json(model, &def)?;
    model_knowledge_from_json(model, &knowl)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityState;
    use std::collections::BTreeMap;

    #[test]
    fn experience_round_trips() {
        let model = Model::new("M");
        let action = model.encode_action(Action::new("move", vec!["1".into()]));
        let mut xp = Experience::new("M", "R", "G", "A");
        xp.values.set(crate::model::StateActionRef(StateRef(0), action), 0.5);
        xp.level = ExperienceLevel::Trainee;
        let json = experience_to_json(&xp, &model).unwrap();
        let back = experience_from_json(&json, &model).unwrap();
        assert_eq!(back.model, "M");
        assert_eq!(back.level, ExperienceLevel::Trainee);
        assert_eq!(back.values.get(crate::model::StateActionRef(StateRef(0), action)), Some(0.5));
    }

    #[test]
    fn experience_transition_round_trips_via_action_encoding() {
        let model = Model::new("M");
        let action = model.encode_action(Action::new("attack", vec!["target".into()]));
        let mut xp = Experience::new("M", "R", "G", "A");
        let mut ep = Episode::new(StateRef(0));
        ep.transitions = vec![Transition { start: StateRef(0), action, end: StateRef(1) }];
        ep.last = StateRef(1);
        ep.result = crate::role::OutcomeResult::Succeeded;
        ep.performance = 10;
        xp.store_episode(ep, true);

        let json = experience_to_json(&xp, &model).unwrap();
        assert!(json.contains("\"action_taken\": \"attack|target\""));

        let fresh = Model::new("M");
        let back = experience_from_json(&json, &fresh).unwrap();
        let restored = &back.episodes[0].transitions[0];
        assert_eq!(fresh.decode_action(restored.action).encode(), "attack|target");
    }

    #[test]
    fn model_definition_round_trips_types() {
        let model = Model::new("T");
        let mut defaults = BTreeMap::new();
        defaults.insert("hp".to_string(), "10".to_string());
        model.create_type(None, "Unit", defaults, BTreeMap::new(), vec![]).unwrap();
        let json = model_definition_to_json(&model).unwrap();

        let fresh = Model::new("T");
        model_definition_from_json(&fresh, &json).unwrap();
        assert_eq!(fresh.get_type("Unit"), model.get_type("Unit"));
    }

    #[test]
    fn model_knowledge_round_trips_state_order() {
        let model = Model::new("T");
        let mut s1 = EnvState::new();
        s1.features.insert("x".into(), "1".into());
        let r1 = model.get_stored(s1);
        let mut s2 = EnvState::new();
        s2.features.insert("y".into(), "2".into());
        let r2 = model.get_stored(s2);
        let json = model_knowledge_to_json(&model).unwrap();

        let fresh = Model::new("T");
        model_knowledge_from_json(&fresh, &json).unwrap();
        assert_eq!(fresh.num_states(), model.num_states());
        assert_eq!(r1.0, 0);
        assert_eq!(r2.0, 1);
        let _ = EntityState::new("x", &BTreeMap::new());
    }
}
