// src/utils/mod.rs
//! Utilities module for common functionality
//!
//! This module contains shared utilities used throughout the mining application,
//! including error handling and logging infrastructure.

/// Error types and handling utilities
///
/// Contains the [`MinerError`] enum which defines all possible error conditions
/// for the mining application, along with conversion implementations.
pub mod error;

/// Logging configuration and status formatting helpers
pub mod logging;

// Re-export for easier access
pub use error::MinerError;
pub use logging::{format_count, format_elapsed, init_bench_logging, init_logging};
