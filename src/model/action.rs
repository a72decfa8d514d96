/// A named discrete event with string parameters (spec.md §3 "Action").
/// Canonical encoding is `type_id|p1|p2|...`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Action {
    pub type_id: String,
    pub params: Vec<String>,
}

impl Action {
    pub fn new(type_id: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            type_id: type_id.into(),
            params,
        }
    }

    pub fn encode(&self) -> String {
        let mut s = self.type_id.clone();
        for p in &self.params {
            s.push('|');
            s.push_str(p);
        }
        s
    }

    pub fn decode(encoded: &str) -> Self {
        let mut parts = encoded.split('|');
        let type_id = parts.next().unwrap_or_default().to_string();
        let params = parts.map(|p| p.to_string()).collect();
        Self { type_id, params }
    }
}

/// Stable integer reference into a model's interned environment states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct StateRef(pub usize);

/// Stable integer reference into a model's interned actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct ActionRef(pub usize);

/// `(state-ref, action-ref)` pair, totally ordered by identity only, used
/// as a key into the state-action value table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateActionRef(pub StateRef, pub ActionRef);

/// `(start-state, action, end-state)` triple of interned references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Transition {
    pub start: StateRef,
    pub action: ActionRef,
    pub end: StateRef,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_canonical_round_trip() {
        let a = Action::new("move", vec!["1".into(), "2".into()]);
        let encoded = a.encode();
        assert_eq!(encoded, "move|1|2");
        assert_eq!(Action::decode(&encoded), a);
    }

    #[test]
    fn action_with_no_params_round_trips() {
        let a = Action::new("noop", vec![]);
        assert_eq!(Action::decode(&a.encode()), a);
    }
}
