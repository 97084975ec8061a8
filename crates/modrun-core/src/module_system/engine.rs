// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module engine - locates, executes and caches modules

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use modrun_script::Value;
use tracing::{debug, instrument, warn};

use crate::error::{ModuleError, Result};
use crate::module_system::context::ExecutionContext;
use crate::module_system::locator::{ModuleResource, ResourceLocator};
use crate::module_system::registry::{ModuleRecord, NativeProvider, Registry};
use crate::module_system::require;
use crate::module_system::resolver;

/// One module session: a locator, an execution context and the registry
/// of everything loaded through them.
///
/// The engine is always held in an `Rc`; request functions keep a weak
/// handle back to it.
pub struct ModuleEngine {
    registry: RefCell<Registry>,
    locator: Box<dyn ResourceLocator>,
    context: Box<dyn ExecutionContext>,
    this: Weak<ModuleEngine>,
}

impl ModuleEngine {
    /// Create a session
    pub fn new(
        locator: Box<dyn ResourceLocator>,
        context: Box<dyn ExecutionContext>,
        registry: Registry,
    ) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            registry: RefCell::new(registry),
            locator,
            context,
            this: this.clone(),
        })
    }

    /// The execution context modules run in
    pub fn context(&self) -> &dyn ExecutionContext {
        self.context.as_ref()
    }

    /// Borrow the registry
    ///
    /// Must not be held across a call to [`ModuleEngine::load`].
    pub fn registry(&self) -> Ref<'_, Registry> {
        self.registry.borrow()
    }

    /// Borrow the registry mutably
    ///
    /// Must not be held across a call to [`ModuleEngine::load`].
    pub fn registry_mut(&self) -> RefMut<'_, Registry> {
        self.registry.borrow_mut()
    }

    /// A script request function resolving against `base_id`
    pub fn require_fn(&self, base_id: &str) -> Value {
        require::make(self.this.clone(), base_id)
    }

    /// Load `id` as requested by the module whose canonical id is `base_id`
    /// and return its exports.
    ///
    /// A module is executed at most once per session. It is cached under the
    /// id exactly as requested, before it runs, so a cycle back to it sees
    /// its partial exports. If compiling or running it fails the entry is
    /// removed again and the failure returned unchanged.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, id: &str, base_id: &str) -> Result<Value> {
        let cached = self.registry.borrow_mut().get(id);
        if let Some(record) = cached {
            debug!(id, "module cache hit");
            return Ok(record.exports());
        }

        let provider = self.registry.borrow_mut().take_provider(id);
        if let Some(provider) = provider {
            return self.build_native(id, provider);
        }

        let canonical = resolver::resolve(id, base_id);
        let Some(resource) = self.locator.locate(&canonical)? else {
            warn!(id, canonical = %canonical, "module not found");
            return Err(ModuleError::ModuleNotFound(id.to_string()));
        };

        let record = self.registry.borrow_mut().create(id, &resource);
        debug!(id, canonical = %resource.id, origin = %resource.origin, "executing module");

        match self.execute(&record, &resource) {
            Ok(()) => Ok(record.exports()),
            Err(e) => {
                self.registry.borrow_mut().remove(id);
                warn!(id, error = %e, "module failed, evicted from cache");
                Err(e)
            }
        }
    }

    /// Runs a native provider with the registry released, so the provider
    /// may itself load modules through this engine.
    fn build_native(&self, id: &str, provider: NativeProvider) -> Result<Value> {
        debug!(id, "invoking native module provider");
        match provider() {
            Ok(value) => Ok(self.registry.borrow_mut().insert_native(id, value).exports()),
            Err(e) => {
                self.registry.borrow_mut().restore_provider(id, provider);
                Err(ModuleError::NativeModule {
                    id: id.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    fn execute(&self, record: &ModuleRecord, resource: &ModuleResource) -> Result<()> {
        let compiled = self.context.compile(resource)?;
        let require = self.require_fn(&resource.id);
        require.set("main", record.module().clone());
        compiled.invoke(require, record.module(), record.exports())
    }
}

impl fmt::Debug for ModuleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleEngine")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_system::context::ScriptContext;
    use rustc_hash::FxHashMap;

    /// Serves modules from memory.
    struct MemoryLocator(FxHashMap<&'static str, &'static str>);

    impl ResourceLocator for MemoryLocator {
        fn locate(&self, id: &str) -> Result<Option<ModuleResource>> {
            Ok(self.0.get(id).map(|content| ModuleResource {
                id: id.to_string(),
                origin: format!("memory:{}", id),
                content: content.to_string(),
            }))
        }
    }

    fn engine(modules: &[(&'static str, &'static str)]) -> Rc<ModuleEngine> {
        let locator = MemoryLocator(modules.iter().copied().collect());
        ModuleEngine::new(
            Box::new(locator),
            Box::new(ScriptContext::default()),
            Registry::new(),
        )
    }

    #[test]
    fn test_load_and_cache() {
        let engine = engine(&[("a", "exports.n = 1;")]);
        let first = engine.load("a", "").unwrap();
        let second = engine.load("a", "").unwrap();
        assert!(first.strict_equals(&second));
        assert_eq!(first.get("n"), Value::from(1));
        assert!(engine.registry().contains("a"));
    }

    #[test]
    fn test_module_exports_replacement() {
        let engine = engine(&[("f", "module.exports = function () { return 'called'; };")]);
        let exports = engine.load("f", "").unwrap();
        assert!(exports.is_callable());
    }

    #[test]
    fn test_not_found_leaves_no_entry() {
        let engine = engine(&[]);
        let err = engine.load("missing", "").unwrap_err();
        assert!(matches!(err, ModuleError::ModuleNotFound(ref id) if id == "missing"));
        assert!(engine.registry().is_empty());
    }

    #[test]
    fn test_failure_evicts() {
        let engine = engine(&[("bad", "exports.x = 1; throw new Error('nope');")]);
        let err = engine.load("bad", "").unwrap_err();
        assert!(matches!(err, ModuleError::Script(modrun_script::Error::Thrown(_))));
        assert!(!engine.registry().contains("bad"));
    }

    #[test]
    fn test_relative_require_from_module() {
        let engine = engine(&[
            ("lib/util", "exports.helper = require('./helper').name;"),
            ("lib/helper", "exports.name = 'helper';"),
        ]);
        let exports = engine.load("lib/util", "").unwrap();
        assert_eq!(exports.get("helper"), Value::from("helper"));
    }

    #[test]
    fn test_native_provider_may_load_modules() {
        let engine = engine(&[("config", "exports.level = 3;")]);
        let weak = Rc::downgrade(&engine);
        engine.registry_mut().register_native("settings", move || {
            let engine = weak.upgrade().ok_or("engine dropped")?;
            let config = engine.load("config", "")?;
            let cached = engine.registry().contains("config");
            Ok(Value::object_from([
                ("level", config.get("level")),
                ("cached", Value::from(cached)),
            ]))
        });

        let exports = engine.load("settings", "").unwrap();
        assert_eq!(exports.get("level"), Value::from(3));
        assert_eq!(exports.get("cached"), Value::Boolean(true));
        assert!(engine.registry().contains("settings"));
    }

    #[test]
    fn test_failed_native_provider_is_retried() {
        let engine = engine(&[]);
        let attempts = Rc::new(std::cell::Cell::new(0));
        let counter = Rc::clone(&attempts);
        engine.registry_mut().register_native("device", move || {
            counter.set(counter.get() + 1);
            if counter.get() == 1 {
                Err("warming up".into())
            } else {
                Ok(Value::from("ready"))
            }
        });

        let err = engine.load("device", "").unwrap_err();
        assert!(matches!(err, ModuleError::NativeModule { ref id, .. } if id == "device"));
        assert!(!engine.registry().contains("device"));

        assert_eq!(engine.load("device", "").unwrap(), Value::from("ready"));
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn test_require_main_is_own_module() {
        let engine = engine(&[("m", "exports.same = require.main === module;")]);
        let exports = engine.load("m", "").unwrap();
        assert_eq!(exports.get("same"), Value::Boolean(true));
    }
}
