use std::collections::BTreeMap;

/// A named entity-state type, optionally inheriting defaults, possible
/// values and link names from a parent type (spec.md §3 "Entity-state type").
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EntityStateType {
    pub model: String,
    pub name: String,
    pub parent: Option<String>,
    pub defaults: BTreeMap<String, String>,
    pub possibles: BTreeMap<String, Vec<String>>,
    pub links: Vec<String>,
}

impl EntityStateType {
    /// Merge a parent's contribution into a freshly declared type: defaults
    /// and possibles merge with child values overriding, links prepend.
    pub(crate) fn merged_with_parent(mut self, parent: &EntityStateType) -> Self {
        let mut defaults = parent.defaults.clone();
        defaults.extend(self.defaults);
        self.defaults = defaults;

        let mut possibles = parent.possibles.clone();
        possibles.extend(self.possibles);
        self.possibles = possibles;

        let mut links = parent.links.clone();
        links.extend(self.links);
        self.links = links;
        self
    }

    /// Whether redefining this type with the given arguments would produce
    /// an identical type (invariant: equality under redefinition).
    pub(crate) fn matches_redefinition(
        &self,
        parent: &Option<String>,
        defaults: &BTreeMap<String, String>,
        possibles: &BTreeMap<String, Vec<String>>,
        links: &[String],
    ) -> bool {
        &self.parent == parent
            && &self.defaults == defaults
            && &self.possibles == possibles
            && self.links == links
    }
}
