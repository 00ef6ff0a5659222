//! The variable store.
//!
//! Klang has no lexical scoping: one flat table per evaluator instance,
//! blocks do not create frames, and assignment to an existing name replaces
//! the prior value including its kind tag.

use std::collections::HashMap;

use klang_types::{Binding, Value};

/// Flat variable table owned by one evaluator instance.
#[derive(Debug, Clone, Default)]
pub struct Store {
    vars: HashMap<String, Binding>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a variable's value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name).map(|b| &b.value)
    }

    /// Look up the full binding (value plus its bound name).
    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.vars.get(name)
    }

    /// Bind a value to a name, replacing any existing binding.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        self.vars.insert(name.clone(), Binding::new(name, value));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// All bindings as (name, value) pairs, sorted by name.
    pub fn snapshot(&self) -> Vec<(String, Value)> {
        let mut pairs: Vec<(String, Value)> = self
            .vars
            .values()
            .map(|b| (b.name.clone(), b.value.clone()))
            .collect();
        pairs.sort_by(|(a, _), (b, _)| a.cmp(b));
        pairs
    }
}
