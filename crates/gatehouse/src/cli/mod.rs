//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the gatehouse binary.

mod call;
mod commands;
mod config;

pub use call::run_call;
pub use commands::{CallArgs, Cli, Commands};
pub use config::{load_config, show_config};
