// src/miner/mod.rs
//! Core mining functionality
//!
//! This module contains all components related to the mining process:
//! - The Argon2id hash engine
//! - Nonce generation and match detection
//! - Worker threads and the pool controller

/// Mining algorithm implementations
///
/// Contains the Argon2id engine and the [`Algorithm`] trait the rest of the
/// miner programs against.
pub mod algorithm;

/// Random nonces and the SHA-256 keys derived from them
pub mod nonce;

/// Target pattern detection on rendered hashes
pub mod matcher;

/// Worker pool and controller
///
/// Starts and stops workers, aggregates their progress and hands found
/// matches to the submission pipeline.
pub mod scheduler;

/// Worker thread implementation
///
/// Contains the worker thread logic that performs actual hash computations.
/// Workers report progress and matches to the controller.
pub mod worker;

// Re-export main components for cleaner imports
pub use self::algorithm::{Algorithm, Argon2idEngine, HashResult};
pub use self::matcher::{Detection, MatchDetector};
pub use self::nonce::NonceGenerator;
pub use self::scheduler::{Scheduler, StopReason, StopReport, WorkerCommand, WorkerEvent};
pub use self::worker::{Worker, WorkerConfig, WorkerHandle};
