// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Execution contexts - compile module source and call into it

use std::rc::Rc;

use modrun_script::{Capabilities, Interpreter, Value};

use crate::error::Result;
use crate::module_system::locator::ModuleResource;

/// Parameters every module body receives, in order
pub const MODULE_PARAMS: [&str; 3] = ["require", "module", "exports"];

/// Compiles module source into something the engine can invoke
pub trait ExecutionContext {
    /// Compile `resource.content` as the body of a function taking
    /// `(require, module, exports)`.
    fn compile(&self, resource: &ModuleResource) -> Result<Box<dyn CompiledModule>>;

    /// Call a function value produced by module code.
    fn call(&self, function: &Value, this: &Value, args: &[Value]) -> Result<Value>;
}

/// A compiled module body
pub trait CompiledModule {
    /// Run the module body once.
    fn invoke(&self, require: Value, module: &Value, exports: Value) -> Result<()>;
}

/// Execution context backed by a [`modrun_script::Interpreter`]
///
/// All modules of a session share one interpreter, so they see the same
/// global bindings.
#[derive(Debug, Clone)]
pub struct ScriptContext {
    interpreter: Rc<Interpreter>,
}

impl ScriptContext {
    /// Create a context whose globals are exactly `capabilities`
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            interpreter: Rc::new(Interpreter::new(capabilities)),
        }
    }

    /// Wrap an existing interpreter
    pub fn with_interpreter(interpreter: Rc<Interpreter>) -> Self {
        Self { interpreter }
    }

    /// The underlying interpreter
    pub fn interpreter(&self) -> &Rc<Interpreter> {
        &self.interpreter
    }
}

impl Default for ScriptContext {
    fn default() -> Self {
        Self::new(Capabilities::standard())
    }
}

impl ExecutionContext for ScriptContext {
    fn compile(&self, resource: &ModuleResource) -> Result<Box<dyn CompiledModule>> {
        let function =
            self.interpreter
                .compile_function(&resource.id, &MODULE_PARAMS, &resource.content)?;
        Ok(Box::new(ScriptModule {
            interpreter: Rc::clone(&self.interpreter),
            function,
        }))
    }

    fn call(&self, function: &Value, this: &Value, args: &[Value]) -> Result<Value> {
        Ok(self.interpreter.call(function, this, args)?)
    }
}

/// A module body compiled to a script function
struct ScriptModule {
    interpreter: Rc<Interpreter>,
    function: Value,
}

impl CompiledModule for ScriptModule {
    fn invoke(&self, require: Value, module: &Value, exports: Value) -> Result<()> {
        // `this` at module top level is the initial exports object
        let this = exports.clone();
        self.interpreter
            .call(&self.function, &this, &[require, module.clone(), exports])?;
        Ok(())
    }
}
