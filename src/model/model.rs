//! Model registry entry: entity-state types, roles, interned states and
//! actions for one named cyber system (spec.md §4.1, §4.2, §4.3).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::model::action::{Action, ActionRef, StateRef};
use crate::model::state::{EntityDelta, EntityState, EnvState, StateDelta};
use crate::model::types::EntityStateType;
use crate::role::{OutcomeResult, Role, StateInfo};

#[derive(Default)]
struct ModelInner {
    name: String,
    types: Vec<EntityStateType>,
    types_by_name: HashMap<String, usize>,
    roles: Vec<Role>,
    roles_by_name: HashMap<String, usize>,
    states: Vec<Rc<EnvState>>,
    states_by_value: HashMap<EnvState, usize>,
    actions: Vec<Action>,
    actions_by_encoding: HashMap<String, usize>,
    state_info_cache: HashMap<(String, usize), StateInfo>,
}

/// Cheap, shareable handle to one cyber system's model. Lives for process
/// lifetime once created through a [`crate::Context`] (spec.md §9 "Global
/// state": no hidden mutable globals, mutation only behind an explicit
/// handle).
#[derive(Clone)]
pub struct Model {
    inner: Rc<RefCell<ModelInner>>,
}

impl Model {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        let inner = ModelInner {
            name: name.into(),
            ..ModelInner::default()
        };
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    pub fn name(&self) -> String {
        self.inner.borrow().name.clone()
    }

    /// Declare or look up an entity-state type, merging parent contributions.
    /// Fails with `TypeAlreadyDefined` on a mismatched redefinition
    /// (spec.md §4.2).
    pub fn create_type(
        &self,
        parent: Option<&str>,
        name: &str,
        defaults: std::collections::BTreeMap<String, String>,
        possibles: std::collections::BTreeMap<String, Vec<String>>,
        links: Vec<String>,
    ) -> Result<EntityStateType> {
        let model_name = self.name();
        let mut inner = self.inner.borrow_mut();

        let parent_type = match parent {
            Some(p) => {
                let idx = *inner
                    .types_by_name
                    .get(p)
                    .ok_or_else(|| Error::UnknownEntity(p.to_string()))?;
                Some(inner.types[idx].clone())
            }
            None => None,
        };

        let candidate = EntityStateType {
            model: model_name,
            name: name.to_string(),
            parent: parent.map(str::to_string),
            defaults,
            possibles,
            links,
        };
        let merged = match &parent_type {
            Some(p) => candidate.merged_with_parent(p),
            None => candidate,
        };

        if let Some(&idx) = inner.types_by_name.get(name) {
            let existing = inner.types[idx].clone();
            if existing.matches_redefinition(&merged.parent, &merged.defaults, &merged.possibles, &merged.links) {
                return Ok(existing);
            }
            return Err(Error::TypeAlreadyDefined(name.to_string()));
        }

        let idx = inner.types.len();
        inner.types.push(merged.clone());
        inner.types_by_name.insert(name.to_string(), idx);
        log::debug!("defined entity-state type {name}");
        Ok(merged)
    }

    pub fn get_type(&self, name: &str) -> Option<EntityStateType> {
        let inner = self.inner.borrow();
        inner.types_by_name.get(name).map(|&i| inner.types[i].clone())
    }

    /// Transitive ancestry check.
    pub fn is_a(&self, type_name: &str, ancestor_name: &str) -> bool {
        let mut current = self.get_type(type_name);
        while let Some(t) = current {
            if t.name == ancestor_name {
                return true;
            }
            current = t.parent.as_deref().and_then(|p| self.get_type(p));
        }
        false
    }

    /// Seed a fresh entity state from its type's defaults.
    pub fn new_entity(&self, type_name: &str) -> Result<EntityState> {
        let t = self
            .get_type(type_name)
            .ok_or_else(|| Error::UnknownEntity(type_name.to_string()))?;
        Ok(EntityState::new(type_name, &t.defaults))
    }

    pub fn add_role(&self, role: Role) {
        let mut inner = self.inner.borrow_mut();
        if let Some(&idx) = inner.roles_by_name.get(&role.name) {
            inner.roles[idx] = role;
        } else {
            let idx = inner.roles.len();
            inner.roles_by_name.insert(role.name.clone(), idx);
            inner.roles.push(role);
        }
    }

    pub fn get_role(&self, name: &str) -> Option<Role> {
        let inner = self.inner.borrow();
        inner.roles_by_name.get(name).map(|&i| inner.roles[i].clone())
    }

    pub fn role_names(&self) -> Vec<String> {
        self.inner.borrow().roles.iter().map(|r| r.name.clone()).collect()
    }

    /// Canonicalise an environment state: the unique stored value-equal
    /// state, creating it on first encounter (spec.md invariant 1).
    pub fn get_stored(&self, state: EnvState) -> StateRef {
        let mut inner = self.inner.borrow_mut();
        if let Some(&idx) = inner.states_by_value.get(&state) {
            return StateRef(idx);
        }
        let idx = inner.states.len();
        inner.states_by_value.insert(state.clone(), idx);
        inner.states.push(Rc::new(state));
        log::trace!("interned new environment state #{idx}");
        StateRef(idx)
    }

    pub fn get_state(&self, r: StateRef) -> Rc<EnvState> {
        self.inner.borrow().states[r.0].clone()
    }

    pub fn num_states(&self) -> usize {
        self.inner.borrow().states.len()
    }

    /// Intern an action by its canonical encoding.
    pub fn encode_action(&self, action: Action) -> ActionRef {
        let encoded = action.encode();
        let mut inner = self.inner.borrow_mut();
        if let Some(&idx) = inner.actions_by_encoding.get(&encoded) {
            return ActionRef(idx);
        }
        let idx = inner.actions.len();
        inner.actions_by_encoding.insert(encoded, idx);
        inner.actions.push(action);
        ActionRef(idx)
    }

    pub fn decode_action(&self, r: ActionRef) -> Action {
        self.inner.borrow().actions[r.0].clone()
    }

    /// Apply a delta on top of `base`, returning the canonicalised result
    /// (spec.md §4.3).
    pub fn change_state(&self, base: StateRef, delta: &StateDelta) -> StateRef {
        let mut next = (*self.get_state(base)).clone();
        for (id, entity_delta) in &delta.entities {
            match entity_delta {
                EntityDelta::Replace(full) => {
                    next.entities.insert(id.clone(), full.clone());
                }
                EntityDelta::Update { properties, relationships } => {
                    let entry = next.entities.entry(id.clone()).or_insert_with(|| EntityState {
                        type_name: String::new(),
                        properties: Default::default(),
                        relationships: Default::default(),
                    });
                    for (k, v) in properties {
                        entry.properties.insert(k.clone(), v.clone());
                    }
                    entry.relationships = relationships.clone();
                }
            }
        }
        for (k, v) in &delta.features {
            next.features.insert(k.clone(), v.clone());
        }
        self.get_stored(next)
    }

    /// Memoised state info for `(role, state)`; recomputed whenever the
    /// role has feature-based reward terms, since feature values can vary
    /// across structurally identical states (spec.md §4.5, open question 1).
    pub fn state_info(&self, role: &Role, state: StateRef) -> StateInfo {
        if role.has_feature_rewards() {
            let env = self.get_state(state);
            return role.state_info(&env);
        }
        let key = (role.name.clone(), state.0);
        if let Some(info) = self.inner.borrow().state_info_cache.get(&key) {
            return *info;
        }
        let env = self.get_state(state);
        let info = role.state_info(&env);
        self.inner.borrow_mut().state_info_cache.insert(key, info);
        info
    }

    pub fn override_state_result(&self, role: &Role, state: StateRef, result: OutcomeResult) {
        let env = self.get_state(state);
        let reward = role.reward_for(&env, result);
        let key = (role.name.clone(), state.0);
        self.inner
            .borrow_mut()
            .state_info_cache
            .insert(key, StateInfo { reward, result });
    }

    pub fn override_state_reward(&self, role: &Role, state: StateRef, reward: i64) {
        let current = self.state_info(role, state);
        let key = (role.name.clone(), state.0);
        self.inner
            .borrow_mut()
            .state_info_cache
            .insert(key, StateInfo { reward, result: current.result });
    }

    pub(crate) fn iter_states(&self) -> Vec<(usize, Rc<EnvState>)> {
        self.inner
            .borrow()
            .states
            .iter()
            .cloned()
            .enumerate()
            .collect()
    }

    pub(crate) fn iter_types(&self) -> Vec<EntityStateType> {
        self.inner.borrow().types.clone()
    }

    pub(crate) fn iter_roles(&self) -> Vec<Role> {
        self.inner.borrow().roles.clone()
    }

    pub(crate) fn iter_actions(&self) -> Vec<(usize, Action)> {
        self.inner
            .borrow()
            .actions
            .iter()
            .cloned()
            .enumerate()
            .collect()
    }
}
