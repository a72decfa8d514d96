//! Process-wide model registry (spec.md §4.1 "Model registry").

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::model::model::Model;

#[derive(Clone, Default)]
pub struct Context {
    inner: Rc<RefCell<Inner>>,
}

#[derive(Default)]
struct Inner {
    models: HashMap<String, Model>,
    most_recent: Option<String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the existing model or constructs an empty one. An empty
    /// `name` resolves to the most recently created/used model.
    pub fn get_or_create(&self, name: &str) -> Model {
        let mut inner = self.inner.borrow_mut();
        let resolved = if name.is_empty() {
            inner.most_recent.clone().unwrap_or_default()
        } else {
            name.to_string()
        };
        let model = inner
            .models
            .entry(resolved.clone())
            .or_insert_with(|| Model::new(resolved.clone()))
            .clone();
        inner.most_recent = Some(resolved);
        model
    }

    pub fn get(&self, name: &str) -> Option<Model> {
        self.inner.borrow().models.get(name).cloned()
    }

    pub fn remove(&self, name: &str) -> Option<Model> {
        self.inner.borrow_mut().models.remove(name)
    }

    pub fn remove_all(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.models.clear();
        inner.most_recent = None;
    }

    pub fn model_names(&self) -> Vec<String> {
        self.inner.borrow().models.keys().cloned().collect()
    }
}
