//! Command-line interface
//!
//! `start` mines with a configuration file, `benchmark` measures the local
//! hashrate without talking to the authority, `config` writes a template.

/// Clap command and option definitions
pub mod commands;

pub use commands::{Action, BenchmarkOptions, Commands, ConfigOptions, StartOptions};
