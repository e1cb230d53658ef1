// src/main.rs
use arc_swap::ArcSwap;
use clap::Parser;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use xen_miner_rs::miner::{NonceGenerator, StopReason};
use xen_miner_rs::utils::{format_count, format_elapsed, init_bench_logging};
use xen_miner_rs::{self, *};

/// Salt used by the benchmark, the bytes of a fixed placeholder account
const BENCH_SALT: [u8; 20] = [0x24; 20];

/// Main entry point for the XenBlocks miner
///
/// # Returns
/// - `Ok(())` on successful execution
/// - `Err(MinerError)` if any operation fails
///
/// # Flow
/// 1. Parses command line arguments
/// 2. Delegates to appropriate subcommand handler
/// 3. Propagates any errors upward
fn main() -> Result<(), MinerError> {
    let cli = cli::Commands::parse();

    match cli.action {
        cli::Action::Start(opts) => start_mining(opts),
        cli::Action::Benchmark(opts) => run_benchmark(opts),
        cli::Action::Config(opts) => generate_config(opts),
    }
}

/// Starts the mining operation with given configuration options
///
/// # Arguments
/// * `opts` - Command line options for mining operation
///
/// # Operations
/// 1. Initializes logging
/// 2. Loads, overrides and validates configuration
/// 3. Runs the pool until Ctrl-C or a worker failure
fn start_mining(opts: cli::StartOptions) -> Result<(), MinerError> {
    utils::init_logging();

    let mut config = config::load(&opts.config)?;
    // Apply CLI overrides
    if let Some(account) = opts.account {
        config.account = account;
    }
    if let Some(workers) = opts.workers {
        config.worker_threads = workers;
    }
    config.validate()?;

    let rt = Runtime::new()?;
    rt.block_on(mine(config))
}

/// Runs the pool, the difficulty monitor and the stats reporter
///
/// A difficulty change restarts the pool so new workers pick up the new
/// memory cost. On exit, submissions still in flight are awaited.
async fn mine(config: Config) -> Result<(), MinerError> {
    let authority: Arc<dyn Authority> = Arc::new(HttpAuthority::new(config.authority.clone()));

    let mut mining = config.mining_config()?;
    match authority.difficulty().await {
        Ok(cost) => mining.memory_cost = cost,
        Err(e) => log::warn!(
            "Could not fetch difficulty, using memory cost {} KB: {}",
            mining.memory_cost,
            e
        ),
    }
    log::info!(
        "Mining for {} with {} workers",
        mining.account,
        mining.worker_count()
    );
    let shared = Arc::new(ArcSwap::from_pointee(mining));

    let algorithm: Arc<dyn Algorithm> =
        Arc::new(Argon2idEngine::new(config.hash_length, config.encoding)?);
    let mut scheduler = Scheduler::new(
        Arc::clone(&shared),
        algorithm,
        Arc::clone(&authority),
        RetryPolicy::from(config.retry),
    );
    scheduler.start()?;

    // Statistics reporting
    let reporter = StatsReporter::new(
        scheduler.snapshot_cell(),
        Duration::from_secs(config.report_interval_secs),
    )
    .start_reporting();

    let (changes_tx, mut changes_rx) = mpsc::unbounded_channel();
    if config.difficulty_refresh_secs > 0 {
        let monitor = DifficultyMonitor::new(
            authority,
            shared,
            Duration::from_secs(config.difficulty_refresh_secs),
        );
        tokio::spawn(monitor.run(changes_tx));
    } else {
        drop(changes_tx);
    }

    let mut pending = Vec::new();
    let outcome = loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                log::info!("Shutting down");
                scheduler.stop();
                pending.extend(scheduler.wait().await?.pending_submissions);
                break Ok(());
            }
            Some(cost) = changes_rx.recv() => {
                log::info!("Restarting workers with memory cost {} KB", cost);
                pending.extend(scheduler.restart().await?);
            }
            report = scheduler.wait() => {
                let report = report?;
                pending.extend(report.pending_submissions);
                break match report.reason {
                    StopReason::Requested => Ok(()),
                    reason => Err(MinerError::TaskError(format!("Mining stopped: {}", reason))),
                };
            }
        }
    };
    reporter.stop();

    pending.retain(|task| !task.is_finished());
    if !pending.is_empty() {
        log::info!("Waiting for {} submissions to finish", pending.len());
    }
    for result in join_all(pending).await {
        if let Err(e) = result {
            log::error!("Submission task failed: {}", e);
        }
    }

    let stats = scheduler.snapshot();
    log::info!(
        "Submissions accepted: {}, failed: {}",
        stats.accepted,
        stats.rejected
    );
    outcome
}

/// Runs the Argon2id hashing benchmark
///
/// # Arguments
/// * `opts` - Benchmark configuration options
///
/// # Operations
/// 1. Initializes benchmark-specific logging
/// 2. Creates the engine with the requested parameters
/// 3. Spawns worker threads
/// 4. Collects and reports performance statistics
fn run_benchmark(opts: cli::BenchmarkOptions) -> Result<(), MinerError> {
    init_bench_logging();

    let engine = Arc::new(Argon2idEngine::new(opts.hash_length, opts.encoding)?);
    let threads = opts.threads.max(1);
    let duration = Duration::from_secs(opts.duration);

    log::info!(
        "Starting Argon2id benchmark for {} seconds: {} threads, memory cost {} KB",
        opts.duration,
        threads,
        opts.memory_cost
    );

    let (progress_tx, progress_rx) = crossbeam_channel::unbounded();
    let start_time = Instant::now();
    let handles: Vec<_> = (0..threads)
        .map(|id| {
            let engine = Arc::clone(&engine);
            let sender = progress_tx.clone();
            let memory_cost = opts.memory_cost;
            std::thread::spawn(move || -> Result<(), MinerError> {
                let mut nonces = NonceGenerator::new();
                let mut attempts: u64 = 0;
                while start_time.elapsed() < duration {
                    engine.hash(&nonces.generate(), &BENCH_SALT, memory_cost)?;
                    attempts += 1;
                    if sender.send((id, attempts)).is_err() {
                        break;
                    }
                }
                Ok(())
            })
        })
        .collect();
    drop(progress_tx);

    let mut tracker = RateTracker::new();
    let mut last_log = Instant::now();
    for (id, attempts) in progress_rx {
        tracker.record(id, attempts);

        // Log progress every second
        if last_log.elapsed().as_secs() >= 1 {
            log::debug!(
                "{} hashes, {:.1} H/s",
                format_count(tracker.total_attempts()),
                tracker.total_speed()
            );
            last_log = Instant::now();
        }
    }

    // Wait for all threads to complete
    for handle in handles {
        handle
            .join()
            .map_err(|_| MinerError::TaskError("Benchmark thread panicked".into()))??;
    }

    // Report final results
    log::info!("Benchmark results:");
    log::info!("Total hashes: {}", format_count(tracker.total_attempts()));
    log::info!("Average hashrate: {:.2} H/s", tracker.total_speed());
    log::info!("Elapsed: {}", format_elapsed(tracker.elapsed()));
    log::logger().flush(); // Ensure final results appear

    Ok(())
}

/// Generates configuration template file
///
/// # Arguments
/// * `opts` - Configuration generation options
///
/// # Operations
/// 1. Validates the account, if one was given
/// 2. Writes the template to the specified output file
fn generate_config(opts: cli::ConfigOptions) -> Result<(), MinerError> {
    if let Some(account) = &opts.account {
        config::validate_account(account)?;
    }
    let template = config::generate_template(opts.account.as_deref());
    std::fs::write(opts.output, template)?;
    Ok(())
}
