// src/stats/reporter.rs
use crate::stats::tracker::PoolSnapshot;
use crate::utils::logging::{format_count, format_elapsed};
use arc_swap::ArcSwap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use sysinfo::{Components, System};

/// Statistics related to hardware performance
#[derive(Debug, Clone)]
pub struct HardwareStats {
    /// Current CPU usage percentage (0-100)
    pub cpu_usage: f32,
    /// Memory currently used by the system (in bytes)
    pub memory_used: u64,
    /// Current CPU temperature in Celsius
    pub temperature: f32,
}

/// Periodically logs the pool snapshot together with hardware statistics
pub struct StatsReporter {
    /// Latest snapshot published by the pool controller
    snapshot: Arc<ArcSwap<PoolSnapshot>>,
    /// System information collector
    system: System,
    /// Hardware component information collector
    components: Components,
    /// Interval at which stats are reported
    report_interval: Duration,
    /// Cleared to stop the reporting thread
    active: Arc<AtomicBool>,
}

impl StatsReporter {
    /// Creates a reporter for the given snapshot source
    ///
    /// # Arguments
    /// * `snapshot` - Snapshot cell the controller publishes into
    /// * `report_interval` - How often to log statistics
    pub fn new(snapshot: Arc<ArcSwap<PoolSnapshot>>, report_interval: Duration) -> Self {
        StatsReporter {
            snapshot,
            system: System::new_all(),
            components: Components::new_with_refreshed_list(),
            report_interval,
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Gets the latest pool statistics
    pub fn get_stats(&self) -> PoolSnapshot {
        PoolSnapshot::clone(&self.snapshot.load())
    }

    /// Gets the current hardware statistics
    ///
    /// This refreshes system information before returning the stats.
    pub fn get_hardware_stats(&mut self) -> HardwareStats {
        self.system.refresh_cpu_all();
        self.system.refresh_memory();
        self.components.refresh(true);

        let cpus = self.system.cpus();
        let cpu_usage = if cpus.is_empty() {
            0.0
        } else {
            cpus.iter().map(|c| c.cpu_usage()).sum::<f32>() / cpus.len() as f32
        };

        let temperature = self
            .components
            .iter()
            .find(|c| c.label().contains("CPU"))
            .and_then(|c| c.temperature())
            .unwrap_or(0.0);

        HardwareStats {
            cpu_usage,
            memory_used: self.system.used_memory(),
            temperature,
        }
    }

    /// Renders the status line for a snapshot
    pub fn status_line(stats: &PoolSnapshot) -> String {
        format!(
            "Mining Hashes: {}, Speed: {:.2} H/s, Total Mining Time: {} | Workers: {} | Accepted/Failed: {}/{}",
            format_count(stats.total_attempts),
            stats.hashes_per_second,
            format_elapsed(stats.elapsed),
            stats.active_workers,
            stats.accepted,
            stats.rejected
        )
    }

    /// Starts the periodic reporting of statistics
    ///
    /// This spawns a background thread that logs stats at the configured
    /// interval until [`ReporterHandle::stop`] is called.
    pub fn start_reporting(mut self) -> ReporterHandle {
        let active = self.active.clone();
        let handle = ReporterHandle {
            active: active.clone(),
        };

        std::thread::spawn(move || {
            while active.load(Ordering::Relaxed) {
                std::thread::sleep(self.report_interval);
                if !active.load(Ordering::Relaxed) {
                    break;
                }
                let stats = self.get_stats();
                let hw_stats = self.get_hardware_stats();

                log::info!(
                    "{} | CPU: {:.1}% | Mem: {} MB | Temp: {:.1}°C",
                    Self::status_line(&stats),
                    hw_stats.cpu_usage,
                    hw_stats.memory_used / (1024 * 1024),
                    hw_stats.temperature
                );
            }
        });

        handle
    }
}

/// Handle used to stop a running reporter thread
#[derive(Debug, Clone)]
pub struct ReporterHandle {
    active: Arc<AtomicBool>,
}

impl ReporterHandle {
    /// Stops reporting after the current sleep
    pub fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}
