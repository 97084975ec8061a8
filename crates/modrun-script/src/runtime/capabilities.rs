//! The ambient bindings granted to script code.

use indexmap::IndexMap;

use super::value::Value;
use crate::builtins;

/// An explicit allowlist of global bindings.
///
/// The interpreter's global scope contains exactly the bindings in this set,
/// so the set is fixed before any script runs. There is no way to reach
/// host interop or file loading from script unless the embedder grants it
/// here.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    bindings: IndexMap<String, Value>,
}

impl Capabilities {
    /// An empty capability set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard set: `console` and the `Error` constructors.
    pub fn standard() -> Self {
        Self::new()
            .with("console", builtins::console::console_object())
            .with_error_constructors()
    }

    /// Adds the `Error`, `TypeError` and `RangeError` constructors.
    pub fn with_error_constructors(self) -> Self {
        self.with("Error", builtins::error::constructor("Error"))
            .with("TypeError", builtins::error::constructor("TypeError"))
            .with("RangeError", builtins::error::constructor("RangeError"))
    }

    /// Grants `name`, replacing any earlier binding with that name.
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    /// Grants `name` in place.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    /// Withdraws `name` before the set is handed to an interpreter.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.bindings.shift_remove(name)
    }

    /// Returns true if `name` is granted.
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Granted names, in the order they were added.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// Iterates over the granted bindings.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }
}
