// src/submission/mod.rs
//! Proof-of-work submission
//!
//! Turns a found hash into a submission: the authority verifies it, the last
//! mined records are re-verified locally and folded into a Merkle root, and
//! the root is submitted together with the found hash.

/// Merkle reduction in the authority's format
pub mod merkle;

/// Per-match verify and submit state machine
pub mod pipeline;

pub use merkle::reduce as merkle_root;
pub use pipeline::{LeafSet, SubmissionContext, SubmissionPipeline, SubmissionState};
