//! Error types for script parsing and execution.

use std::fmt;

use thiserror::Error;

use crate::runtime::object::Object;
use crate::runtime::value::Value;

/// Result type for script operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while parsing or running script code.
#[derive(Debug, Error)]
pub enum Error {
    /// Syntax error during parsing
    #[error("SyntaxError: {message} ({line}:{column})")]
    Syntax {
        /// What went wrong
        message: String,
        /// 1-based line
        line: usize,
        /// 1-based column
        column: usize,
    },

    /// Type error during execution
    #[error("TypeError: {0}")]
    Type(String),

    /// Reference to an undeclared binding
    #[error("ReferenceError: {0} is not defined")]
    Reference(String),

    /// Range error (call depth or array length exceeded)
    #[error("RangeError: {0}")]
    Range(String),

    /// A value raised with `throw`
    #[error("Uncaught {0}")]
    Thrown(Value),

    /// A failure raised by host code called from script
    #[error("{0}")]
    Host(HostError),
}

impl Error {
    /// Create a new TypeError
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::Type(msg.into())
    }

    /// Create a new RangeError
    pub fn range_error(msg: impl Into<String>) -> Self {
        Self::Range(msg.into())
    }

    /// Wrap a host failure so it can travel through script frames.
    pub fn host<E>(error: E) -> Self
    where
        E: std::error::Error + 'static,
    {
        Self::Host(HostError::new(error))
    }

    /// The script-visible error name (`TypeError`, `Error`, ...).
    pub fn name(&self) -> String {
        match self {
            Error::Syntax { .. } => "SyntaxError".to_string(),
            Error::Type(_) => "TypeError".to_string(),
            Error::Reference(_) => "ReferenceError".to_string(),
            Error::Range(_) => "RangeError".to_string(),
            Error::Host(_) => "Error".to_string(),
            Error::Thrown(value) => match value.get("name") {
                Value::String(name) => name.to_string(),
                _ => "Error".to_string(),
            },
        }
    }

    /// The message without the error name prefix.
    pub fn message(&self) -> String {
        match self {
            Error::Syntax {
                message,
                line,
                column,
            } => format!("{} ({}:{})", message, line, column),
            Error::Type(msg) | Error::Range(msg) => msg.clone(),
            Error::Reference(name) => format!("{} is not defined", name),
            Error::Host(host) => host.to_string(),
            Error::Thrown(value) => match value.get("message") {
                Value::String(message) => message.to_string(),
                _ => value.to_string(),
            },
        }
    }

    /// Converts the error into the value a `catch` clause binds.
    ///
    /// Thrown values are returned as-is; every other error becomes an error
    /// object carrying `name` and `message`.
    pub fn into_value(self) -> Value {
        match self {
            Error::Thrown(value) => value,
            other => Value::from_object(Object::error(&other.name(), &other.message())),
        }
    }
}

/// A host failure carried through the interpreter.
///
/// The original error is kept boxed so the embedder can recover it with
/// [`HostError::downcast`] once it leaves script code.
pub struct HostError(Box<dyn std::error::Error + 'static>);

impl HostError {
    /// Wraps a host error.
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + 'static,
    {
        Self(Box::new(error))
    }

    /// Recovers the original error if it has type `E`.
    pub fn downcast<E>(self) -> std::result::Result<E, Self>
    where
        E: std::error::Error + 'static,
    {
        self.0.downcast::<E>().map(|boxed| *boxed).map_err(Self)
    }

    /// Borrows the original error if it has type `E`.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        self.0.downcast_ref::<E>()
    }
}

impl fmt::Debug for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HostError").field(&self.0).finish()
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("disk on fire")]
    struct DiskError;

    #[test]
    fn test_host_error_round_trip() {
        let err = Error::host(DiskError);
        assert_eq!(err.to_string(), "disk on fire");
        let Error::Host(host) = err else {
            panic!("expected host error");
        };
        assert!(host.downcast_ref::<DiskError>().is_some());
        assert!(host.downcast::<DiskError>().is_ok());
    }

    #[test]
    fn test_into_value_builds_error_object() {
        let value = Error::type_error("x is not a function").into_value();
        assert_eq!(value.get("name").to_string(), "TypeError");
        assert_eq!(value.get("message").to_string(), "x is not a function");
        assert_eq!(value.to_string(), "TypeError: x is not a function");
    }

    #[test]
    fn test_thrown_value_keeps_identity() {
        let thrown = Value::from("plain");
        let err = Error::Thrown(thrown.clone());
        assert_eq!(err.to_string(), "Uncaught plain");
        assert!(err.into_value().strict_equals(&thrown));
    }
}
