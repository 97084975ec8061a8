// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for module loading

use std::string::FromUtf8Error;

use modrun_script::Error as ScriptError;
use thiserror::Error;

/// Result type for module operations
pub type Result<T> = std::result::Result<T, ModuleError>;

/// Errors that can occur while locating, loading or running modules
#[derive(Debug, Error)]
pub enum ModuleError {
    /// No resource exists for the requested identifier
    #[error("Cannot find module '{0}'")]
    ModuleNotFound(String),

    /// File system error other than absence
    #[error("Failed to read module '{id}': {source}")]
    Io {
        /// Requested identifier
        id: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// HTTP transport failure or unexpected status
    #[error("Failed to fetch module '{id}' from {url}: {reason}")]
    Fetch {
        /// Requested identifier
        id: String,
        /// URL that was fetched
        url: String,
        /// Reason for failure
        reason: String,
    },

    /// Module source is not valid UTF-8
    #[error("Module '{id}' is not valid UTF-8: {source}")]
    Decode {
        /// Requested identifier
        id: String,
        /// Underlying error
        #[source]
        source: FromUtf8Error,
    },

    /// The identifier cannot be turned into a location
    #[error("Invalid module id '{id}': {reason}")]
    MalformedIdentifier {
        /// Requested identifier
        id: String,
        /// Reason for failure
        reason: String,
    },

    /// The configured base location is unusable
    #[error("Invalid base location: {0}")]
    InvalidBase(String),

    /// Configuration could not be read or parsed
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Compilation or execution of module code failed
    #[error(transparent)]
    Script(ScriptError),

    /// A native module provider failed
    #[error("Native module '{id}' failed: {reason}")]
    NativeModule {
        /// Module identifier
        id: String,
        /// Reason for failure
        reason: String,
    },

    /// The entry point is missing from the module's exports or not callable
    #[error("Module '{module}' does not export a function named '{function}'")]
    EntryPointNotFound {
        /// Module identifier
        module: String,
        /// Function name
        function: String,
    },

    /// A require function was called after its runner was dropped
    #[error("Module session has been closed")]
    SessionClosed,
}

impl ModuleError {
    /// Converts the error so it can travel through script frames.
    ///
    /// Script failures keep their script form; everything else is carried as
    /// a host error and recovered by `From<ScriptError>` on the way out.
    pub fn into_script_error(self) -> ScriptError {
        match self {
            ModuleError::Script(error) => error,
            other => ScriptError::host(other),
        }
    }

    /// Returns true if this is a [`ModuleError::ModuleNotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, ModuleError::ModuleNotFound(_))
    }
}

impl From<ScriptError> for ModuleError {
    fn from(error: ScriptError) -> Self {
        match error {
            ScriptError::Host(host) => match host.downcast::<ModuleError>() {
                Ok(inner) => inner,
                Err(host) => ModuleError::Script(ScriptError::Host(host)),
            },
            other => ModuleError::Script(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = ModuleError::ModuleNotFound("lib/missing".to_string());
        assert_eq!(err.to_string(), "Cannot find module 'lib/missing'");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_round_trip_through_script_error() {
        let original = ModuleError::ModuleNotFound("x".to_string());
        let carried = original.into_script_error();
        assert!(matches!(carried, ScriptError::Host(_)));
        let recovered = ModuleError::from(carried);
        assert!(matches!(recovered, ModuleError::ModuleNotFound(id) if id == "x"));
    }

    #[test]
    fn test_script_errors_stay_script_errors() {
        let original = ModuleError::Script(ScriptError::type_error("bad"));
        let carried = original.into_script_error();
        assert!(matches!(carried, ScriptError::Type(_)));
        assert!(matches!(ModuleError::from(carried), ModuleError::Script(_)));
    }
}
