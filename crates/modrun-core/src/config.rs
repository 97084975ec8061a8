// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Configuration management for module sessions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::error::{ModuleError, Result};
use crate::module_system::RemoteOptions;

/// Prefix of environment variables that override configuration
pub const ENV_PREFIX: &str = "MODRUN_";

/// Configuration for a [`Runner`](crate::Runner).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Base location: directory, `file:` URL or `http(s)` URL
    pub base: String,

    /// Function `run_main` calls
    pub entry_function: String,

    /// Whether scripts get the `console` binding
    pub console: bool,

    /// HTTP request timeout in seconds
    pub timeout: u64,

    /// HTTP user agent
    pub user_agent: String,

    /// Preregistered host modules (id -> value)
    pub modules: BTreeMap<String, serde_json::Value>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base: ".".to_string(),
            entry_function: "main".to_string(),
            console: true,
            timeout: 30,
            user_agent: concat!("modrun/", env!("CARGO_PKG_VERSION")).to_string(),
            modules: BTreeMap::new(),
        }
    }
}

impl RunnerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ModuleError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ModuleError::Config(e.to_string()))
    }

    /// Apply `MODRUN_*` environment variables.
    pub fn apply_env(&mut self) {
        self.apply_env_vars(std::env::vars());
    }

    /// Apply `MODRUN_*` overrides from the given variables.
    pub fn apply_env_vars<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix(ENV_PREFIX) {
                let config_key = config_key.to_lowercase().replace('_', "-");
                self.set(&config_key, &value);
            }
        }
    }

    /// Set a configuration value. Returns false for unknown keys and values
    /// that don't parse.
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        match key {
            "base" => self.base = value.to_string(),
            "entry-function" => self.entry_function = value.to_string(),
            "console" => self.console = value == "true",
            "timeout" => match value.parse() {
                Ok(n) => self.timeout = n,
                Err(_) => return false,
            },
            "user-agent" => self.user_agent = value.to_string(),
            _ => return false,
        }
        true
    }

    /// HTTP options for remote bases.
    pub fn remote_options(&self) -> RemoteOptions {
        RemoteOptions {
            timeout: Duration::from_secs(self.timeout),
            user_agent: self.user_agent.clone(),
        }
    }
}
