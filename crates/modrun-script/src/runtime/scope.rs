//! Lexical scopes for variable binding.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::value::Value;
use crate::error::{Error, Result};

/// Shared handle to a scope. Closures keep their defining scope alive.
pub type ScopeRef = Rc<RefCell<Scope>>;

/// A lexical scope for variable bindings.
#[derive(Debug, Default)]
pub struct Scope {
    /// The bindings in this scope
    bindings: FxHashMap<String, Binding>,
    /// The enclosing scope
    parent: Option<ScopeRef>,
}

/// A variable binding.
#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    /// false for `const`
    mutable: bool,
}

impl Scope {
    /// Creates a new root scope.
    pub fn root() -> ScopeRef {
        Rc::new(RefCell::new(Scope::default()))
    }

    /// Creates a scope nested inside `parent`.
    pub fn child(parent: &ScopeRef) -> ScopeRef {
        Rc::new(RefCell::new(Scope {
            bindings: FxHashMap::default(),
            parent: Some(Rc::clone(parent)),
        }))
    }

    /// Declares (or redeclares) a binding in this scope.
    pub fn declare(&mut self, name: impl Into<String>, value: Value, mutable: bool) {
        self.bindings.insert(name.into(), Binding { value, mutable });
    }

    /// Returns true if `name` is bound directly in this scope.
    pub fn has_own(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }
}

/// Looks `name` up through the scope chain.
pub fn lookup(scope: &ScopeRef, name: &str) -> Option<Value> {
    let mut current = Rc::clone(scope);
    loop {
        let next = {
            let borrowed = current.borrow();
            if let Some(binding) = borrowed.bindings.get(name) {
                return Some(binding.value.clone());
            }
            borrowed.parent.clone()?
        };
        current = next;
    }
}

/// Assigns to the nearest existing binding of `name`.
pub fn assign(scope: &ScopeRef, name: &str, value: Value) -> Result<()> {
    let mut current = Rc::clone(scope);
    loop {
        let next = {
            let mut borrowed = current.borrow_mut();
            if let Some(binding) = borrowed.bindings.get_mut(name) {
                if !binding.mutable {
                    return Err(Error::type_error("Assignment to constant variable."));
                }
                binding.value = value;
                return Ok(());
            }
            match borrowed.parent.clone() {
                Some(parent) => parent,
                None => return Err(Error::Reference(name.to_string())),
            }
        };
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_parents() {
        let root = Scope::root();
        root.borrow_mut().declare("x", Value::from(1), true);
        let inner = Scope::child(&root);
        assert_eq!(lookup(&inner, "x").map(|v| v.to_number()), Some(1.0));
        assert!(lookup(&inner, "y").is_none());
    }

    #[test]
    fn test_assign_updates_nearest_binding() {
        let root = Scope::root();
        root.borrow_mut().declare("x", Value::from(1), true);
        let inner = Scope::child(&root);
        inner.borrow_mut().declare("x", Value::from(2), true);
        assign(&inner, "x", Value::from(3)).unwrap();
        assert_eq!(lookup(&root, "x").map(|v| v.to_number()), Some(1.0));
        assert_eq!(lookup(&inner, "x").map(|v| v.to_number()), Some(3.0));
    }

    #[test]
    fn test_assign_errors() {
        let root = Scope::root();
        root.borrow_mut().declare("k", Value::from(1), false);
        assert!(matches!(assign(&root, "k", Value::Null), Err(Error::Type(_))));
        assert!(matches!(
            assign(&root, "missing", Value::Null),
            Err(Error::Reference(name)) if name == "missing"
        ));
    }
}
