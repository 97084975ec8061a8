// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! CommonJS-style module system
//!
//! - `resolver` - relative identifier resolution
//! - `locator` - finding module source in a directory or behind a URL
//! - `registry` - the per-session module cache
//! - `context` - compiling and invoking module bodies
//! - `engine` - the load algorithm tying the above together
//! - `require` - the request function handed to module code

mod context;
mod engine;
mod locator;
mod registry;
mod require;
mod resolver;

pub use context::{CompiledModule, ExecutionContext, MODULE_PARAMS, ScriptContext};
pub use engine::ModuleEngine;
pub use locator::{
    FileSystemLocator, ModuleResource, RemoteLocator, RemoteOptions, ResourceLocator, from_base,
};
pub use registry::{ModuleRecord, NativeProvider, Registry};
pub use require::{Require, make as make_require};
pub use resolver::{is_relative, resolve};
