//! # Command-Line Interface
//!
//! The `tinyscript` binary: the demo application of [`demo`], configured from
//! [`AppConfig`] and logging through [`logging`].
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `build` | fetch and compile |
//! | `release` | build, render the manifest and package |
//! | `stage` | copy files into a staging directory |
//! | `task` | run any single task |
//! | `tasks` | list tasks and their dependencies |
//! | `interface` | describe the application as JSON |
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

pub mod demo;
pub mod logging;

use anyhow::{Context, Result};

use crate::app::AppConfig;
use crate::exitcode;
use crate::output::Output;

pub const APP_NAME: &str = "tinyscript";

/// Runs the demo application on the process arguments and returns the exit code
pub fn run() -> Result<i32> {
    logging::setup_logging();

    let config = match AppConfig::discover(APP_NAME) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            return Ok(exitcode::CONFIG);
        }
    };

    let app = demo::app(config.params()).context("Failed to declare the application")?;
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let status = app.run(&argv, &Output::stdio())?;
    Ok(status.exit_code())
}
