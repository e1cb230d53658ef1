// src/config/mod.rs
//! Configuration management for the XenBlocks miner
//!
//! This module handles all configuration-related functionality including:
//! - Loading and parsing configuration files
//! - Generating configuration templates
//! - Account validation and salt derivation
//!
//! The configuration uses TOML format.

/// Core configuration implementation
///
/// Contains the [`Config`] file structure and the [`MiningConfig`] a pool
/// is started with.
pub mod config;

// Re-export key items for easy access
pub use config::{Config, MiningConfig, account_salt, validate_account};

use crate::utils::error::MinerError;
use std::path::PathBuf;

/// Loads miner configuration from a TOML file
///
/// # Arguments
/// * `path` - Path to the configuration file (anything convertible to PathBuf)
///
/// # Returns
/// * `Ok(Config)` - Successfully loaded configuration
/// * `Err(MinerError)` - If the file couldn't be read or parsed
pub fn load(path: impl Into<PathBuf>) -> Result<Config, MinerError> {
    Config::load(path)
}

/// Generates a commented configuration template
///
/// # Arguments
/// * `account` - Account to pre-fill in the template
pub fn generate_template(account: Option<&str>) -> String {
    Config::generate_template(account)
}
