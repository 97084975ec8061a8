//! Error constructors.

use crate::runtime::{Object, Value};

/// Builds a constructor producing error objects named `name`.
///
/// Works with and without `new`: `Error("x")` and `new Error("x")` both
/// return a fresh error object.
pub fn constructor(name: &'static str) -> Value {
    Value::native(name, move |_, _, args| {
        let message = match args.first() {
            None | Some(Value::Undefined) => String::new(),
            Some(value) => value.to_string(),
        };
        Ok(Value::from_object(Object::error(name, &message)))
    })
}
