//! Condition language: entity/feature/relationship conditions joined by
//! AND/OR (spec.md §3 "Condition", §4.4 "Condition evaluation").

use crate::model::state::{EntityState, EnvState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CompareOp {
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
    Defined,
}

fn eval_compare(actual: Option<&str>, op: CompareOp, value: &str) -> bool {
    match op {
        CompareOp::Defined => actual.map(|v| !v.is_empty()).unwrap_or(false),
        CompareOp::Equal => actual == Some(value),
        CompareOp::NotEqual => actual != Some(value),
        CompareOp::Greater | CompareOp::Less | CompareOp::GreaterOrEqual | CompareOp::LessOrEqual => {
            match (actual.and_then(|a| a.parse::<f64>().ok()), value.parse::<f64>().ok()) {
                (Some(a), Some(b)) => match op {
                    CompareOp::Greater => a > b,
                    CompareOp::Less => a < b,
                    CompareOp::GreaterOrEqual => a >= b,
                    CompareOp::LessOrEqual => a <= b,
                    _ => unreachable!(),
                },
                _ => false,
            }
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PropertyCondition {
    pub property: String,
    pub op: CompareOp,
    pub value: String,
}

impl PropertyCondition {
    pub fn new(property: impl Into<String>, op: CompareOp, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eval_entity(&self, entity: &EntityState) -> bool {
        eval_compare(entity.properties.get(&self.property).map(String::as_str), self.op, &self.value)
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FeatureCondition {
    pub feature: String,
    pub op: CompareOp,
    pub value: String,
}

impl FeatureCondition {
    pub fn new(feature: impl Into<String>, op: CompareOp, value: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eval(&self, env: &EnvState) -> bool {
        eval_compare(env.features.get(&self.feature).map(String::as_str), self.op, &self.value)
    }

    /// The numeric multiplier a feature-condition reward term applies: the
    /// feature's own value when `op == Defined` and it parses as a number,
    /// 1 otherwise (spec.md §3 "Role", reward-rules).
    pub fn reward_multiplier(&self, env: &EnvState) -> i64 {
        if matches!(self.op, CompareOp::Defined) {
            env.features
                .get(&self.feature)
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(1)
        } else {
            1
        }
    }
}

/// Relationship condition: local endpoint (empty = "any link"), target
/// `(entity id, endpoint)`, and an inverting `unrelated` flag.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RelationshipCondition {
    pub local_endpoint: String,
    pub target_entity: String,
    pub target_endpoint: String,
    pub unrelated: bool,
}

impl RelationshipCondition {
    pub fn new(
        local_endpoint: impl Into<String>,
        target_entity: impl Into<String>,
        target_endpoint: impl Into<String>,
        unrelated: bool,
    ) -> Self {
        Self {
            local_endpoint: local_endpoint.into(),
            target_entity: target_entity.into(),
            target_endpoint: target_endpoint.into(),
            unrelated,
        }
    }

    pub fn eval_entity(&self, entity: &EntityState) -> bool {
        let linked = if self.local_endpoint.is_empty() {
            entity
                .relationships
                .values()
                .any(|(id, ep)| *id == self.target_entity && *ep == self.target_endpoint)
        } else {
            entity.relationships.get(&self.local_endpoint)
                == Some(&(self.target_entity.clone(), self.target_endpoint.clone()))
        };
        linked != self.unrelated
    }
}

/// Reserved entity ids for entity conditions.
pub const ANY: &str = "ANY";
pub const ALL: &str = "ALL";

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct EntityCondition {
    pub entity_id: String,
    pub properties: Vec<PropertyCondition>,
    pub relationships: Vec<RelationshipCondition>,
}

impl EntityCondition {
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            properties: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn with_property(mut self, cond: PropertyCondition) -> Self {
        self.properties.push(cond);
        self
    }

    pub fn with_relationship(mut self, cond: RelationshipCondition) -> Self {
        self.relationships.push(cond);
        self
    }

    fn eval_entity(&self, entity: &EntityState) -> bool {
        self.properties.iter().all(|p| p.eval_entity(entity))
            && self.relationships.iter().all(|r| r.eval_entity(entity))
    }

    pub fn eval(&self, env: &EnvState) -> bool {
        match self.entity_id.as_str() {
            ANY => env.entities.values().any(|e| self.eval_entity(e)),
            ALL => env.entities.values().all(|e| self.eval_entity(e)),
            id => env
                .entities
                .get(id)
                .map(|e| self.eval_entity(e))
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LogicalOp {
    And,
    Or,
}

/// Root of a condition tree: entity and feature conditions are implicitly
/// AND-ed, then related sub-conditions fold left-to-right with their
/// operator, so `A AND B OR C` evaluates as `((A ∧ B) ∨ C)`.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Condition {
    pub entities: Vec<EntityCondition>,
    pub features: Vec<FeatureCondition>,
    pub terms: Vec<(LogicalOp, Condition)>,
}

impl Condition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, cond: EntityCondition) -> Self {
        self.entities.push(cond);
        self
    }

    pub fn with_feature(mut self, cond: FeatureCondition) -> Self {
        self.features.push(cond);
        self
    }

    pub fn with_term(mut self, op: LogicalOp, sub: Condition) -> Self {
        self.terms.push((op, sub));
        self
    }

    pub fn evaluate(&self, env: &EnvState) -> bool {
        let mut acc =
            self.entities.iter().all(|e| e.eval(env)) && self.features.iter().all(|f| f.eval(env));
        for (op, sub) in &self.terms {
            let rhs = sub.evaluate(env);
            acc = match op {
                LogicalOp::And => acc && rhs,
                LogicalOp::Or => acc || rhs,
            };
        }
        acc
    }
}
