use std::collections::BTreeMap;

/// Per-entity record of property values and relationship endpoints
/// (spec.md §3 "Entity state"). `BTreeMap` gives deterministic ordering,
/// which in turn lets `EnvState` derive structural equality for free.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct EntityState {
    pub type_name: String,
    pub properties: BTreeMap<String, String>,
    pub relationships: BTreeMap<String, (String, String)>,
}

impl EntityState {
    pub fn new(type_name: impl Into<String>, defaults: &BTreeMap<String, String>) -> Self {
        Self {
            type_name: type_name.into(),
            properties: defaults.clone(),
            relationships: BTreeMap::new(),
        }
    }
}

/// A symbolic snapshot: entity states plus scalar features (spec.md §3
/// "Environment state"). Equality is structural and recursive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct EnvState {
    pub entities: BTreeMap<String, EntityState>,
    pub features: BTreeMap<String, String>,
}

impl EnvState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Per-entity delta applied by `Model::change_state` (spec.md §4.3): either
/// merge named property updates (relationships replaced wholesale), or
/// replace the whole entity state outright.
#[derive(Debug, Clone)]
pub enum EntityDelta {
    Update {
        properties: BTreeMap<String, String>,
        relationships: BTreeMap<String, (String, String)>,
    },
    Replace(EntityState),
}

#[derive(Debug, Clone, Default)]
pub struct StateDelta {
    pub entities: BTreeMap<String, EntityDelta>,
    pub features: BTreeMap<String, String>,
}

impl StateDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, id: impl Into<String>, delta: EntityDelta) -> Self {
        self.entities.insert(id.into(), delta);
        self
    }

    pub fn with_feature(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.features.insert(key.into(), value.into());
        self
    }
}
