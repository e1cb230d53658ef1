// src/miner/algorithm/mod.rs
//! Mining algorithm implementations
//!
//! This module contains the memory-hard hash used for mining and the common
//! interface the workers and the submission pipeline program against.
//! Currently implements:
//! - Argon2id with protocol-fixed time cost and parallelism

/// Argon2id implementation
///
/// Time cost and parallelism are fixed at 1; memory cost is supplied per call
/// so that a refreshed difficulty reaches newly started workers.
pub mod argon2id;

pub use argon2id::Argon2idEngine;

use crate::utils::error::MinerError;
use std::fmt;

/// Rendered output of a single hash invocation
///
/// Immutable once produced. The text is either lowercase hex or a PHC string,
/// depending on the engine's configured encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashResult(String);

impl HashResult {
    /// Wraps already rendered hash text
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The rendered hash text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the result, returning the owned text
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for HashResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Common interface for the mining hash
///
/// Implementations must be shareable across worker threads; every call is
/// independent and may block for as long as the memory cost demands.
pub trait Algorithm: Send + Sync {
    /// Compute the hash of `key` under `salt` with the given memory cost (KB)
    ///
    /// # Returns
    /// The rendered hash, or [`MinerError::HashComputeError`] if the engine
    /// cannot run with these parameters
    fn hash(&self, key: &str, salt: &[u8], memory_cost: u32) -> Result<HashResult, MinerError>;

    /// Check that `hash` was produced from `key`
    ///
    /// Only used to re-verify records fetched from the authority. Hashes that
    /// cannot be parsed are reported as not verified.
    fn verify(&self, hash: &str, key: &str) -> bool;
}
