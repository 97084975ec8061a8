// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # modrun-core
//!
//! Loads CommonJS-style script modules from a directory or a URL, runs
//! each one at most once per session, and hands back what it exports.
//!
//! - `require()` with `./` and `../` identifiers relative to the caller
//! - `<id>.js` files, or `<id>/main.js` for directories
//! - HTTP(S) bases fetched with a blocking client
//! - Circular requires see the partial exports of the module in progress
//! - Host modules, as plain values or lazily built native providers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use modrun_core::Runner;
//! use modrun_script::Value;
//!
//! let runner = Runner::new("./modules")?;
//! let result = runner.run_main("greeter", Value::object())?;
//! println!("{}", result);
//! # Ok::<(), modrun_core::ModuleError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod json;
pub mod module_system;
pub mod runner;

pub use config::RunnerConfig;
pub use error::{ModuleError, Result};
pub use runner::{Runner, RunnerBuilder};
