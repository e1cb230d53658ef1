//! Statistics collection and reporting module
//!
//! This module provides functionality for tracking and reporting mining statistics,
//! including:
//! - Per-worker attempt counts and hashrates
//! - Accepted/failed submission counts
//! - Hardware monitoring (CPU, memory, temperature)
//!
//! The controller owns a [`RateTracker`] and publishes [`PoolSnapshot`]s;
//! [`StatsReporter`] reads those snapshots and logs them periodically.

/// Controller-owned rate aggregation
pub mod tracker;

/// Submodule containing the statistics reporter implementation
///
/// The reporter handles:
/// - Reading the published pool snapshot
/// - Hardware monitoring
/// - Periodic reporting of stats
pub mod reporter;

// Re-export main components
pub use reporter::{HardwareStats, ReporterHandle, StatsReporter};
pub use tracker::{PoolSnapshot, RateTracker, WorkerStats};
