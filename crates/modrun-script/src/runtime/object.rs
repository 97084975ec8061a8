//! Plain script objects.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use super::value::Value;

/// Shared, mutable object handle.
pub type ObjectRef = Rc<RefCell<Object>>;

/// What kind of object this is, for printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectClass {
    /// An ordinary object
    #[default]
    Plain,
    /// An error object (prints as `name: message`)
    Error,
}

/// A script object: string keys mapped to values in insertion order.
#[derive(Debug, Default)]
pub struct Object {
    properties: IndexMap<String, Value>,
    class: ObjectClass,
}

impl Object {
    /// Creates an empty plain object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an error object with `name` and `message` properties.
    pub fn error(name: &str, message: &str) -> Self {
        let mut object = Self {
            properties: IndexMap::new(),
            class: ObjectClass::Error,
        };
        object.set("name", Value::from(name));
        object.set("message", Value::from(message));
        object
    }

    /// Returns true for error objects.
    pub fn is_error(&self) -> bool {
        self.class == ObjectClass::Error
    }

    /// Gets a property.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Sets a property, keeping the original position of existing keys.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.properties.insert(key.into(), value);
    }

    /// Returns true if the property exists.
    pub fn has(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Removes a property.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.properties.shift_remove(key)
    }

    /// Iterates over property keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns true if the object has no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites_in_place() {
        let mut object = Object::new();
        object.set("a", Value::from(1));
        object.set("b", Value::from(2));
        object.set("a", Value::from(3));
        assert_eq!(object.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(object.get("a").map(Value::to_number), Some(3.0));
    }

    #[test]
    fn test_error_object() {
        let error = Object::error("TypeError", "bad");
        assert!(error.is_error());
        assert_eq!(error.len(), 2);
        assert!(error.has("message"));
    }
}
