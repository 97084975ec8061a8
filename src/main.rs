// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! modrun - run a function exported by a script module
//!
//! Loads `<MODULE>` from a directory or URL, calls one of its exported
//! functions with a JSON argument, and prints the result as JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, anyhow};
use clap::Parser;
use modrun_core::{Runner, RunnerConfig, json};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "modrun",
    about = "Run CommonJS-style script modules from a directory or URL",
    version,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// Module to load (e.g. `greeter` or `lib/util`)
    module: String,

    /// Base directory or URL modules are loaded from
    #[arg(short, long)]
    base: Option<String>,

    /// TOML configuration file
    #[arg(short, long, env = "MODRUN_CONFIG")]
    config: Option<PathBuf>,

    /// Exported function to call [default: main]
    #[arg(short, long)]
    function: Option<String>,

    /// JSON value passed as the sole argument
    #[arg(short, long, default_value = "{}")]
    args: String,

    /// Preregister a host module from JSON (repeatable)
    #[arg(short = 'D', long = "define", value_name = "ID=JSON")]
    define: Vec<String>,

    /// Withhold the `console` binding from scripts
    #[arg(long)]
    no_console: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr so stdout carries only the result. `RUST_LOG` wins over
/// `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "modrun=debug,modrun_core=debug,modrun_script=debug"
    } else {
        "modrun=warn,modrun_core=warn,modrun_script=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<String> {
    let config = build_config(cli)?;
    tracing::debug!(?config, "resolved configuration");

    let args: serde_json::Value = serde_json::from_str(&cli.args)
        .with_context(|| format!("--args is not valid JSON: {}", cli.args))?;

    // Module errors carry script values, which are not Send; report them by message
    let runner = Runner::from_config(&config).map_err(|e| anyhow!("{}", e))?;
    let result = runner
        .run_main(&cli.module, json::from_json(&args))
        .map_err(|e| anyhow!("{}", e))?;

    Ok(serde_json::to_string_pretty(&json::to_json(&result))?)
}

/// Defaults, then the config file, then `MODRUN_*` variables, then flags.
fn build_config(cli: &Cli) -> anyhow::Result<RunnerConfig> {
    let mut config = match &cli.config {
        Some(path) => RunnerConfig::from_file(path).map_err(|e| anyhow!("{}", e))?,
        None => RunnerConfig::default(),
    };
    config.apply_env();

    if let Some(base) = &cli.base {
        config.base = base.clone();
    }
    if let Some(function) = &cli.function {
        config.entry_function = function.clone();
    }
    if cli.no_console {
        config.console = false;
    }
    for definition in &cli.define {
        let (id, value) = parse_define(definition)?;
        config.modules.insert(id, value);
    }
    Ok(config)
}

/// Parse `ID=JSON`.
fn parse_define(definition: &str) -> anyhow::Result<(String, serde_json::Value)> {
    let (id, json) = definition
        .split_once('=')
        .ok_or_else(|| anyhow!("expected ID=JSON, got '{}'", definition))?;
    if id.is_empty() {
        return Err(anyhow!("module id is empty in '{}'", definition));
    }
    let value = serde_json::from_str(json)
        .with_context(|| format!("value for module '{}' is not valid JSON", id))?;
    Ok((id.to_string(), value))
}
