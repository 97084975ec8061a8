// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Runner - the host-facing entry point

use std::rc::Rc;

use modrun_script::{Capabilities, Value};
use tracing::debug;

use crate::config::RunnerConfig;
use crate::error::{ModuleError, Result};
use crate::json;
use crate::module_system::{
    ExecutionContext, ModuleEngine, Registry, RemoteOptions, Require, ResourceLocator,
    ScriptContext, from_base,
};

/// A module session
///
/// Owns the registry; every module loaded through a runner is executed at
/// most once for the runner's lifetime.
#[derive(Debug)]
pub struct Runner {
    engine: Rc<ModuleEngine>,
    root: Require,
    entry_function: String,
}

impl Runner {
    /// Create a runner over `base` with the standard capabilities
    pub fn new(base: &str) -> Result<Self> {
        Self::builder().base(base).build()
    }

    /// Start building a runner
    pub fn builder() -> RunnerBuilder {
        RunnerBuilder::new()
    }

    /// Create a runner from configuration
    pub fn from_config(config: &RunnerConfig) -> Result<Self> {
        RunnerBuilder::from_config(config).build()
    }

    /// Load a module through the root request function and return its exports
    pub fn require(&self, module_id: &str) -> Result<Value> {
        self.root.call(module_id)
    }

    /// Load `module_id` and call its exported `function_name` with `args`
    ///
    /// The exports value is the receiver of the call.
    pub fn run_entry_point(&self, module_id: &str, function_name: &str, args: Value) -> Result<Value> {
        let exports = self.require(module_id)?;
        let function = exports.get(function_name);
        if !function.is_callable() {
            return Err(ModuleError::EntryPointNotFound {
                module: module_id.to_string(),
                function: function_name.to_string(),
            });
        }
        debug!(module = module_id, function = function_name, "calling entry point");
        self.engine.context().call(&function, &exports, &[args])
    }

    /// [`run_entry_point`](Self::run_entry_point) with the configured entry
    /// function (`main` by default)
    pub fn run_main(&self, module_id: &str, args: Value) -> Result<Value> {
        self.run_entry_point(module_id, &self.entry_function, args)
    }

    /// Register a host module; takes effect unless the id is already cached
    pub fn register_module(&self, id: impl Into<String>, value: Value) {
        self.engine.registry_mut().register(id, value);
    }

    /// Register a native module provider
    pub fn register_native<F>(&self, id: impl Into<String>, provider: F)
    where
        F: Fn() -> std::result::Result<Value, Box<dyn std::error::Error>> + 'static,
    {
        self.engine.registry_mut().register_native(id, provider);
    }

    /// Check if a module is cached under `id`
    pub fn is_cached(&self, id: &str) -> bool {
        self.engine.registry().contains(id)
    }

    /// Identifiers of all cached modules, sorted
    pub fn cached_ids(&self) -> Vec<String> {
        self.engine.registry().ids()
    }

    /// The underlying engine
    pub fn engine(&self) -> &Rc<ModuleEngine> {
        &self.engine
    }
}

/// Builder for [`Runner`]
pub struct RunnerBuilder {
    base: String,
    locator: Option<Box<dyn ResourceLocator>>,
    context: Option<Box<dyn ExecutionContext>>,
    capabilities: Capabilities,
    registry: Registry,
    remote: RemoteOptions,
    entry_function: String,
}

impl RunnerBuilder {
    /// A builder with base `"."` and the standard capabilities
    pub fn new() -> Self {
        Self {
            base: ".".to_string(),
            locator: None,
            context: None,
            capabilities: Capabilities::standard(),
            registry: Registry::new(),
            remote: RemoteOptions::default(),
            entry_function: "main".to_string(),
        }
    }

    /// A builder preset from configuration
    pub fn from_config(config: &RunnerConfig) -> Self {
        let mut builder = Self::new()
            .base(&config.base)
            .remote_options(config.remote_options())
            .entry_function(&config.entry_function);
        if !config.console {
            builder = builder.without_capability("console");
        }
        for (id, value) in &config.modules {
            builder = builder.module(id.as_str(), json::from_json(value));
        }
        builder
    }

    /// Set the base location
    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    /// Use a custom locator instead of one derived from the base
    pub fn locator(mut self, locator: impl ResourceLocator + 'static) -> Self {
        self.locator = Some(Box::new(locator));
        self
    }

    /// Use a custom execution context; capabilities are then ignored
    pub fn context(mut self, context: impl ExecutionContext + 'static) -> Self {
        self.context = Some(Box::new(context));
        self
    }

    /// Replace the capability set
    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Grant a global binding
    pub fn capability(mut self, name: impl Into<String>, value: Value) -> Self {
        self.capabilities.insert(name, value);
        self
    }

    /// Withdraw a global binding
    pub fn without_capability(mut self, name: &str) -> Self {
        self.capabilities.remove(name);
        self
    }

    /// Preregister a host module
    pub fn module(mut self, id: impl Into<String>, value: Value) -> Self {
        self.registry.register(id, value);
        self
    }

    /// Register a native module provider
    pub fn native<F>(mut self, id: impl Into<String>, provider: F) -> Self
    where
        F: Fn() -> std::result::Result<Value, Box<dyn std::error::Error>> + 'static,
    {
        self.registry.register_native(id, provider);
        self
    }

    /// HTTP options for remote bases
    pub fn remote_options(mut self, options: RemoteOptions) -> Self {
        self.remote = options;
        self
    }

    /// Function `run_main` calls
    pub fn entry_function(mut self, name: impl Into<String>) -> Self {
        self.entry_function = name.into();
        self
    }

    /// Build the runner
    pub fn build(self) -> Result<Runner> {
        let locator = match self.locator {
            Some(locator) => locator,
            None => from_base(&self.base, &self.remote)?,
        };
        let context = match self.context {
            Some(context) => context,
            None => Box::new(ScriptContext::new(self.capabilities)),
        };
        let engine = ModuleEngine::new(locator, context, self.registry);
        let root = Require::new(Rc::downgrade(&engine), "");
        Ok(Runner {
            engine,
            root,
            entry_function: self.entry_function,
        })
    }
}

impl Default for RunnerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }
        dir
    }

    fn runner(dir: &TempDir) -> Runner {
        Runner::new(dir.path().to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_run_main() {
        let dir = fixture(&[(
            "greeter.js",
            "exports.main = function (ctx) { return 'Hello, ' + ctx.name; };",
        )]);
        let args = Value::object_from([("name", Value::from("modrun"))]);
        let result = runner(&dir).run_main("greeter", args).unwrap();
        assert_eq!(result, Value::from("Hello, modrun"));
    }

    #[test]
    fn test_entry_point_receiver_is_exports() {
        let dir = fixture(&[(
            "counter.js",
            "exports.step = 2; exports.next = function (n) { return n + this.step; };",
        )]);
        let result = runner(&dir)
            .run_entry_point("counter", "next", Value::from(40))
            .unwrap();
        assert_eq!(result, Value::from(42));
    }

    #[test]
    fn test_entry_point_not_found() {
        let dir = fixture(&[("lib.js", "exports.value = 1;")]);
        let runner = runner(&dir);
        for name in ["main", "value"] {
            let err = runner.run_entry_point("lib", name, Value::Undefined).unwrap_err();
            assert!(matches!(
                err,
                ModuleError::EntryPointNotFound { ref module, ref function }
                    if module == "lib" && function == name
            ));
        }
    }

    #[test]
    fn test_configured_entry_function() {
        let dir = fixture(&[("app.js", "exports.start = function () { return 'started'; };")]);
        let config = RunnerConfig {
            base: dir.path().to_str().unwrap().to_string(),
            entry_function: "start".to_string(),
            ..RunnerConfig::default()
        };
        let runner = Runner::from_config(&config).unwrap();
        assert_eq!(runner.run_main("app", Value::Undefined).unwrap(), Value::from("started"));
    }

    #[test]
    fn test_config_without_console() {
        let dir = fixture(&[("app.js", "exports.main = function () { return typeof console; };")]);
        let config = RunnerConfig {
            base: dir.path().to_str().unwrap().to_string(),
            console: false,
            ..RunnerConfig::default()
        };
        let runner = Runner::from_config(&config).unwrap();
        assert_eq!(runner.run_main("app", Value::Undefined).unwrap(), Value::from("undefined"));
    }

    #[test]
    fn test_config_modules() {
        let dir = fixture(&[(
            "app.js",
            "exports.main = function () { return require('settings').level; };",
        )]);
        let mut config = RunnerConfig {
            base: dir.path().to_str().unwrap().to_string(),
            ..RunnerConfig::default()
        };
        config
            .modules
            .insert("settings".to_string(), serde_json::json!({"level": 3}));
        let runner = Runner::from_config(&config).unwrap();
        assert_eq!(runner.run_main("app", Value::Undefined).unwrap(), Value::from(3));
    }

    #[test]
    fn test_invalid_base() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = Runner::new(missing.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ModuleError::InvalidBase(_)));
    }

    #[test]
    fn test_require_after_runner_dropped() {
        let dir = fixture(&[("keeper.js", "exports.later = function () { return require('other'); };")]);
        let later = {
            let runner = runner(&dir);
            runner.require("keeper").unwrap().get("later")
        };
        let interp = modrun_script::Interpreter::new(Capabilities::new());
        let err = interp.call(&later, &Value::Undefined, &[]).unwrap_err();
        assert!(matches!(ModuleError::from(err), ModuleError::SessionClosed));
    }

    #[test]
    fn test_capability_granted_by_builder() {
        let dir = fixture(&[("app.js", "exports.main = function () { return twice(21); };")]);
        let runner = Runner::builder()
            .base(dir.path().to_str().unwrap())
            .capability(
                "twice",
                Value::native("twice", |_, _, args| {
                    Ok(Value::Number(args.first().map_or(0.0, Value::to_number) * 2.0))
                }),
            )
            .build()
            .unwrap();
        assert_eq!(runner.run_main("app", Value::Undefined).unwrap(), Value::from(42));
    }
}
