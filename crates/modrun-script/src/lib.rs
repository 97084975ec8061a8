// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # modrun-script
//!
//! A small embeddable script interpreter for CommonJS-style modules.
//!
//! ## Overview
//!
//! This crate provides the execution half of modrun:
//! - Lexer and recursive descent parser for a JavaScript subset
//! - Tree-walking interpreter with closures, `this` binding and exceptions
//! - Reference-counted values shared freely between host and script
//! - An explicit [`Capabilities`] allowlist for the global scope
//!
//! The global scope holds exactly what the embedder grants. Nothing else
//! (no file access, no host reflection, no `eval`) is reachable from script.
//!
//! ## Quick Start
//!
//! ```rust
//! use modrun_script::{Capabilities, Interpreter, Value};
//!
//! let interp = Interpreter::new(Capabilities::standard());
//! let result = interp.eval("var x = 40; x + 2").expect("Should evaluate");
//! assert_eq!(result, Value::Number(42.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod builtins;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod runtime;

// Re-exports for convenience
pub use error::{Error, HostError, Result};
pub use interpreter::Interpreter;
pub use runtime::{Capabilities, Function, NativeFn, Object, Value};
