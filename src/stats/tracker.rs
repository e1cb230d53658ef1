// src/stats/tracker.rs
//! Per-worker attempt counters and pool totals
//!
//! Owned by the pool controller and updated only from worker progress
//! events. Readers get immutable [`PoolSnapshot`]s.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Counters for one worker
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WorkerStats {
    /// Hashes computed since the pool started
    pub attempts: u64,
    /// Hashes per second since the pool started
    pub speed: f64,
}

/// Point-in-time view of the pool, published for reporters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolSnapshot {
    /// Sum of all workers' attempts
    pub total_attempts: u64,
    /// Sum of all workers' speeds
    pub hashes_per_second: f64,
    /// Workers that have reported at least once
    pub active_workers: usize,
    /// Time since the pool started
    pub elapsed: Duration,
    /// Submissions the authority accepted
    pub accepted: u64,
    /// Submissions that ended in failure
    pub rejected: u64,
}

/// Aggregates worker progress into per-worker and total rates
#[derive(Debug)]
pub struct RateTracker {
    started: Instant,
    workers: BTreeMap<usize, WorkerStats>,
}

impl Default for RateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RateTracker {
    /// Creates a tracker whose clock starts now
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            workers: BTreeMap::new(),
        }
    }

    /// Records a worker's attempt count, measuring elapsed time from pool start
    pub fn record(&mut self, worker_id: usize, attempts: u64) {
        let elapsed = self.started.elapsed();
        self.record_at(worker_id, attempts, elapsed);
    }

    /// Records a worker's attempt count as of `elapsed` since pool start
    pub fn record_at(&mut self, worker_id: usize, attempts: u64, elapsed: Duration) {
        let secs = elapsed.as_secs_f64();
        let speed = if secs > 0.0 { attempts as f64 / secs } else { 0.0 };
        self.workers
            .insert(worker_id, WorkerStats { attempts, speed });
    }

    /// Stats of one worker, if it has reported
    pub fn worker(&self, worker_id: usize) -> Option<WorkerStats> {
        self.workers.get(&worker_id).copied()
    }

    /// Sum of attempts over all workers
    pub fn total_attempts(&self) -> u64 {
        self.workers.values().map(|w| w.attempts).sum()
    }

    /// Sum of speeds over all workers
    pub fn total_speed(&self) -> f64 {
        self.workers.values().map(|w| w.speed).sum()
    }

    /// Time since the pool started
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Drops every worker's stats and restarts the clock
    pub fn reset(&mut self) {
        self.workers.clear();
        self.started = Instant::now();
    }

    /// Snapshot of the totals; submission counters are filled by the caller
    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            total_attempts: self.total_attempts(),
            hashes_per_second: self.total_speed(),
            active_workers: self.workers.len(),
            elapsed: self.elapsed(),
            ..PoolSnapshot::default()
        }
    }
}
