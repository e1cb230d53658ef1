// src/network/difficulty.rs
//! Difficulty tracking
//!
//! The authority's difficulty is the Argon2id memory cost in KB. The monitor
//! polls it on an interval and overwrites `memory_cost` in the shared mining
//! config; running workers keep the value they were started with.

use crate::config::MiningConfig;
use crate::network::authority::Authority;
use crate::utils::error::MinerError;
use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Polls the authority's difficulty and publishes changes
pub struct DifficultyMonitor {
    authority: Arc<dyn Authority>,
    config: Arc<ArcSwap<MiningConfig>>,
    interval: Duration,
}

impl DifficultyMonitor {
    /// Creates a monitor writing into `config`
    ///
    /// # Arguments
    /// * `authority` - Source of the difficulty
    /// * `config` - Shared mining config whose `memory_cost` is overwritten
    /// * `interval` - Time between polls
    pub fn new(
        authority: Arc<dyn Authority>,
        config: Arc<ArcSwap<MiningConfig>>,
        interval: Duration,
    ) -> Self {
        Self {
            authority,
            config,
            interval,
        }
    }

    /// Fetches the difficulty once and stores it
    ///
    /// # Returns
    /// * `Ok(Some(cost))` - The memory cost changed to `cost`
    /// * `Ok(None)` - Unchanged
    /// * `Err(MinerError)` - The authority could not be reached
    pub async fn refresh(&self) -> Result<Option<u32>, MinerError> {
        let difficulty = self.authority.difficulty().await?;
        let previous = self.config.load().memory_cost;
        if difficulty == previous {
            return Ok(None);
        }

        self.config.rcu(|current| {
            let mut next = MiningConfig::clone(current);
            next.memory_cost = difficulty;
            next
        });
        log::info!("Difficulty changed: memory cost {} KB -> {} KB", previous, difficulty);
        Ok(Some(difficulty))
    }

    /// Polls forever, sending each new memory cost to `changes`
    ///
    /// A failed poll is logged and the previous value kept. Returns once the
    /// receiving side of `changes` is gone.
    pub async fn run(self, changes: UnboundedSender<u32>) {
        let mut interval = tokio::time::interval(self.interval);
        // The first tick completes immediately; the caller already fetched once
        interval.tick().await;

        loop {
            interval.tick().await;
            match self.refresh().await {
                Ok(Some(cost)) => {
                    if changes.send(cost).is_err() {
                        return;
                    }
                }
                Ok(None) => log::debug!("Difficulty unchanged"),
                Err(e) => log::warn!("Difficulty refresh failed: {}", e),
            }
        }
    }
}
