use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashMap, FxHasher};

/// Variable bindings supplied to an evaluation.
///
/// Lookup order at evaluation time is: this environment, then the
/// constant registry, then the imaginary unit `i`, then an
/// undefined-variable error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    vars: FxHashMap<String, f64>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style binding: `Environment::new().with("x", 3.0)`.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.vars.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.vars.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Order-independent hash over the sorted entries, used as the
    /// environment half of the L2 cache key.
    pub fn stable_hash(&self) -> u64 {
        let mut entries: Vec<(&String, &f64)> = self.vars.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let mut hasher = FxHasher::default();
        for (name, value) in entries {
            name.hash(&mut hasher);
            value.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Environment {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut env = Environment::new();
        for (name, value) in iter {
            env.set(name, value);
        }
        env
    }
}
