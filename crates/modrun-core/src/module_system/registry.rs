// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module registry for require()

use std::fmt;
use std::rc::Rc;

use modrun_script::Value;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::module_system::locator::ModuleResource;

/// Factory for a native module, invoked the first time the module is required
pub type NativeProvider = Rc<dyn Fn() -> std::result::Result<Value, Box<dyn std::error::Error>>>;

/// A loaded (or loading) module
///
/// The record shares its `module` object with the running script, so a
/// module re-required during its own execution sees the exports assigned
/// so far.
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    id: String,
    origin: String,
    module: Value,
}

impl ModuleRecord {
    fn new(id: &str, origin: &str, exports: Value) -> Self {
        let module = Value::object_from([
            ("id", Value::from(id)),
            ("origin", Value::from(origin)),
            ("exports", exports),
        ]);
        Self {
            id: id.to_string(),
            origin: origin.to_string(),
            module,
        }
    }

    /// Canonical identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// File path, URL, or host marker the module came from
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The `module` object handed to the module's code
    pub fn module(&self) -> &Value {
        &self.module
    }

    /// Current value of `module.exports`
    pub fn exports(&self) -> Value {
        self.module.get("exports")
    }
}

/// Per-session module cache
///
/// Keys are the identifiers as requested. Host-supplied modules wait in
/// their own tables until first requested and are then materialized as
/// ordinary records.
#[derive(Default)]
pub struct Registry {
    records: FxHashMap<String, ModuleRecord>,
    preregistered: FxHashMap<String, Value>,
    providers: FxHashMap<String, NativeProvider>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a module, materializing a preregistered value on first request
    ///
    /// Native providers are not invoked here; see [`Registry::take_provider`].
    pub fn get(&mut self, id: &str) -> Option<ModuleRecord> {
        if let Some(record) = self.records.get(id) {
            return Some(record.clone());
        }

        let value = self.preregistered.remove(id)?;
        debug!(id, "materializing preregistered module");
        let record = ModuleRecord::new(id, &format!("host:{}", id), value);
        self.records.insert(id.to_string(), record.clone());
        Some(record)
    }

    /// Remove the native provider for `id` so it can run without the
    /// registry borrowed. Hand it back with [`Registry::restore_provider`]
    /// if it fails.
    pub fn take_provider(&mut self, id: &str) -> Option<NativeProvider> {
        self.providers.remove(id)
    }

    /// Put back a provider that failed, unless one was registered meanwhile
    pub fn restore_provider(&mut self, id: &str, provider: NativeProvider) {
        self.providers.entry(id.to_string()).or_insert(provider);
    }

    /// Record the value a native provider built for `id`
    pub fn insert_native(&mut self, id: &str, value: Value) -> ModuleRecord {
        let record = ModuleRecord::new(id, &format!("native:{}", id), value);
        self.records.insert(id.to_string(), record.clone());
        record
    }

    /// Create a record with empty exports under `key`, replacing any
    /// existing one
    pub fn create(&mut self, key: &str, resource: &ModuleResource) -> ModuleRecord {
        let record = ModuleRecord::new(&resource.id, &resource.origin, Value::object());
        self.records.insert(key.to_string(), record.clone());
        record
    }

    /// Remove a record
    pub fn remove(&mut self, id: &str) -> Option<ModuleRecord> {
        self.records.remove(id)
    }

    /// Check if a record exists (host modules not yet requested don't count)
    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if there are no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Identifiers of all records, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.records.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Add a host module value
    pub fn register(&mut self, id: impl Into<String>, value: Value) {
        self.preregistered.insert(id.into(), value);
    }

    /// Add a native module provider
    pub fn register_native<F>(&mut self, id: impl Into<String>, provider: F)
    where
        F: Fn() -> std::result::Result<Value, Box<dyn std::error::Error>> + 'static,
    {
        self.providers.insert(id.into(), Rc::new(provider));
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("records", &self.ids())
            .field("preregistered", &self.preregistered.len())
            .field("providers", &self.providers.len())
            .finish()
    }
}
