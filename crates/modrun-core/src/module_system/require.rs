// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The require() function handed to module code

use std::rc::{Rc, Weak};

use modrun_script::{Error as ScriptError, Value};

use crate::error::{ModuleError, Result};
use crate::module_system::engine::ModuleEngine;
use crate::module_system::resolver;

/// A request function bound to the canonical id of one module
///
/// Holds only a weak handle to the engine, so closures that capture
/// `require` don't keep a finished session alive.
#[derive(Debug, Clone)]
pub struct Require {
    engine: Weak<ModuleEngine>,
    base_id: String,
}

impl Require {
    /// Create a request function resolving against `base_id`
    pub fn new(engine: Weak<ModuleEngine>, base_id: impl Into<String>) -> Self {
        Self {
            engine,
            base_id: base_id.into(),
        }
    }

    /// The id relative requests are resolved against
    pub fn base_id(&self) -> &str {
        &self.base_id
    }

    /// Load `id` and return its exports
    pub fn call(&self, id: &str) -> Result<Value> {
        let engine = self.engine.upgrade().ok_or(ModuleError::SessionClosed)?;
        engine.load(id, &self.base_id)
    }

    /// The canonical id `id` resolves to, without loading it
    pub fn resolve(&self, id: &str) -> String {
        resolver::resolve(id, &self.base_id)
    }

    /// Expose as a script function with a `resolve` property
    pub fn into_value(self) -> Value {
        let this = Rc::new(self);

        let loader = Rc::clone(&this);
        let require = Value::native("require", move |_, _, args| {
            let id = module_id(args)?;
            loader.call(&id).map_err(ModuleError::into_script_error)
        });

        let resolver = this;
        require.set(
            "resolve",
            Value::native("resolve", move |_, _, args| {
                let id = module_id(args)?;
                Ok(Value::from(resolver.resolve(&id)))
            }),
        );

        require
    }
}

/// Build the script-visible request function for `base_id`
pub fn make(engine: Weak<ModuleEngine>, base_id: &str) -> Value {
    Require::new(engine, base_id).into_value()
}

fn module_id(args: &[Value]) -> std::result::Result<String, ScriptError> {
    match args.first() {
        Some(Value::String(id)) => Ok(id.to_string()),
        Some(other) => Err(ScriptError::type_error(format!(
            "The \"id\" argument must be of type string. Received {}",
            other.type_of()
        ))),
        None => Err(ScriptError::type_error(
            "The \"id\" argument must be of type string. Received undefined",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_session() {
        let require = Require::new(Weak::new(), "");
        assert!(matches!(require.call("x"), Err(ModuleError::SessionClosed)));
    }

    #[test]
    fn test_resolve_uses_base() {
        let require = Require::new(Weak::new(), "lib/util");
        assert_eq!(require.resolve("./helper"), "lib/helper");
        assert_eq!(require.resolve("top"), "top");
    }

    #[test]
    fn test_script_value_shape() {
        let value = make(Weak::new(), "lib/util");
        assert!(value.is_callable());
        assert!(value.get("resolve").is_callable());
    }

    #[test]
    fn test_id_must_be_string() {
        assert!(module_id(&[Value::from(1)]).is_err());
        assert!(module_id(&[]).is_err());
        assert_eq!(module_id(&[Value::from("a")]).unwrap(), "a");
    }
}
