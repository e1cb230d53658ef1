//! XenBlocks Miner - Argon2id proof-of-work miner in Rust
//!
//! This crate provides a client-side XenBlocks miner with support for:
//! - Multi-threaded Argon2id hashing against the authority's memory cost
//! - XEN11 / superblock / XUNI match detection
//! - Verification, Merkle proof construction and submission with retries
//! - Performance benchmarking
//! - Hardware monitoring

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Miner core implementation including hashing, workers and the pool controller
pub mod miner;

/// Network communication with the block authority
pub mod network;

/// Statistics collection and reporting functionality
pub mod stats;

/// Verification and submission of found blocks
pub mod submission;

/// Utility functions and error handling
pub mod utils;

/// Command-line interface definitions
pub mod cli;

/// Configuration management
pub mod config;

/// Shared type definitions
pub mod types;

// Core exports
pub use cli::Commands;
pub use config::{Config, MiningConfig};
pub use miner::{Algorithm, Argon2idEngine, Scheduler, Worker};
pub use network::{Authority, DifficultyMonitor, HttpAuthority, RetryPolicy};
pub use stats::{HardwareStats, PoolSnapshot, RateTracker, StatsReporter};
pub use submission::SubmissionPipeline;
pub use types::{BlockRecord, HashEncoding, Match};
pub use utils::{MinerError, init_logging};
