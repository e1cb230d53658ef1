// src/network/mod.rs
//! Network communication components
//!
//! This module handles all interaction with the remote block authority:
//! - `Authority` / `HttpAuthority`: difficulty, verify, last-block and submit endpoints
//! - `RetryPolicy`: the fixed-delay retry wrapped around every request
//! - `DifficultyMonitor`: periodic memory-cost refresh

/// Authority endpoints and request/response shapes
pub mod authority;

/// Periodic difficulty refresh
pub mod difficulty;

/// Bounded fixed-delay retry
pub mod retry;

// Re-export main components for cleaner imports
pub use authority::{Authority, AuthorityConfig, HttpAuthority, SubmitRequest, VerifyReply, VerifyRequest};
pub use difficulty::DifficultyMonitor;
pub use retry::{RetryConfig, RetryPolicy};
