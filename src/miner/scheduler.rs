// src/miner/scheduler.rs
//! Worker pool and controller
//!
//! The [`Scheduler`] spawns one worker thread per configured slot and a
//! controller task that owns every piece of pool-wide state. Workers talk to
//! the controller only through [`WorkerEvent`]s; the controller aggregates
//! progress, hands found matches to submission tasks and stops the whole pool
//! as soon as one worker fails.

use crate::config::MiningConfig;
use crate::miner::algorithm::Algorithm;
use crate::miner::worker::{Worker, WorkerConfig, WorkerHandle};
use crate::network::authority::Authority;
use crate::network::retry::RetryPolicy;
use crate::stats::tracker::{PoolSnapshot, RateTracker};
use crate::submission::{SubmissionContext, SubmissionPipeline};
use crate::types::{Match, Target};
use crate::utils::error::MinerError;
use arc_swap::ArcSwap;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

/// Commands sent from the controller to a worker
#[derive(Debug, Clone)]
pub enum WorkerCommand {
    /// Begin mining with the given parameters
    Start(WorkerConfig),
    /// Leave the mining loop at the next attempt
    Stop,
}

/// Events sent from a worker to the controller
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// Total attempts of the worker so far
    Progress {
        /// Reporting worker
        worker_id: usize,
        /// Attempts since the worker started
        attempts: u64,
    },
    /// A hash matched a target
    Found {
        /// Reporting worker
        worker_id: usize,
        /// The match
        found: Match,
    },
    /// The hash engine failed; the worker has exited
    Error {
        /// Reporting worker
        worker_id: usize,
        /// Engine error message
        reason: String,
    },
}

/// Why a pool run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// [`Scheduler::stop`] was called
    Requested,
    /// A worker reported an engine failure
    WorkerFailed {
        /// Failing worker
        worker_id: usize,
        /// Engine error message
        reason: String,
    },
    /// Every worker exited without reporting an error
    WorkersExited,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Requested => f.write_str("stop requested"),
            StopReason::WorkerFailed { worker_id, reason } => {
                write!(f, "worker {} failed: {}", worker_id, reason)
            }
            StopReason::WorkersExited => f.write_str("all workers exited"),
        }
    }
}

/// Outcome of a finished pool run
#[derive(Debug)]
pub struct StopReport {
    /// Why the run ended
    pub reason: StopReason,
    /// Submissions still in flight; they keep running independently
    pub pending_submissions: Vec<JoinHandle<()>>,
}

/// Messages to the controller from outside the worker pool
#[derive(Debug)]
enum ControlMessage {
    Stop,
    SubmissionFinished { match_id: String },
}

/// Submission outcome counters, shared across pool restarts
#[derive(Debug, Default)]
struct SubmissionTally {
    accepted: AtomicU64,
    rejected: AtomicU64,
}

impl SubmissionTally {
    fn record(&self, accepted: bool) {
        let counter = if accepted {
            &self.accepted
        } else {
            &self.rejected
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Pool-wide state; lives inside the controller task only
struct Controller {
    workers: Vec<WorkerHandle>,
    tracker: RateTracker,
    submissions: HashMap<String, JoinHandle<()>>,
    seen: HashSet<String>,
    ctx: SubmissionContext,
    submit_xuni: bool,
    tally: Arc<SubmissionTally>,
    snapshot: Arc<ArcSwap<PoolSnapshot>>,
    control: UnboundedSender<ControlMessage>,
}

impl Controller {
    async fn run(
        mut self,
        mut events: UnboundedReceiver<WorkerEvent>,
        mut control: UnboundedReceiver<ControlMessage>,
    ) -> StopReport {
        let reason = loop {
            tokio::select! {
                Some(message) = control.recv() => match message {
                    ControlMessage::Stop => break StopReason::Requested,
                    ControlMessage::SubmissionFinished { match_id } => {
                        self.submissions.remove(&match_id);
                        self.publish();
                    }
                },
                event = events.recv() => match event {
                    Some(WorkerEvent::Progress { worker_id, attempts }) => {
                        self.tracker.record(worker_id, attempts);
                        self.publish();
                    }
                    Some(WorkerEvent::Found { worker_id, found }) => {
                        log::info!(
                            "Worker {} found {} {} after {} attempts: {}",
                            worker_id,
                            found.kind,
                            found.target,
                            found.attempts,
                            found.short_id()
                        );
                        self.on_found(found);
                    }
                    Some(WorkerEvent::Error { worker_id, reason }) => {
                        log::error!("Worker {} failed, stopping the pool: {}", worker_id, reason);
                        break StopReason::WorkerFailed { worker_id, reason };
                    }
                    None => break StopReason::WorkersExited,
                },
            }
        };

        self.shutdown();
        log::info!("Mining pool stopped: {}", reason);
        StopReport {
            reason,
            pending_submissions: self.submissions.into_values().collect(),
        }
    }

    /// Spawns a submission task unless the match is filtered or was seen before
    fn on_found(&mut self, found: Match) {
        if found.target == Target::Xuni && !self.submit_xuni {
            log::info!("Xuni match {} not submitted", found.short_id());
            return;
        }

        let match_id = found.id().to_string();
        if !self.seen.insert(match_id.clone()) {
            log::debug!("Match {} already submitted", found.short_id());
            return;
        }

        let pipeline = SubmissionPipeline::new(self.ctx.clone(), found, self.tracker.total_speed());
        let tally = Arc::clone(&self.tally);
        let control = self.control.clone();
        let finished_id = match_id.clone();
        let task = tokio::spawn(async move {
            tally.record(pipeline.run().await.is_ok());
            // The controller may already be gone after a stop
            let _ = control.send(ControlMessage::SubmissionFinished {
                match_id: finished_id,
            });
        });
        self.submissions.insert(match_id, task);
    }

    /// Signals every worker and zeroes the aggregate
    ///
    /// Worker threads are not joined; a worker in the middle of a hash exits
    /// once that hash completes.
    fn shutdown(&mut self) {
        for worker in self.workers.drain(..) {
            worker.stop();
        }
        self.tracker.reset();
        self.publish();
    }

    fn publish(&self) {
        let mut snapshot = self.tracker.snapshot();
        snapshot.accepted = self.tally.accepted.load(Ordering::Relaxed);
        snapshot.rejected = self.tally.rejected.load(Ordering::Relaxed);
        self.snapshot.store(Arc::new(snapshot));
    }
}

/// A started pool: the controller task and its control channel
struct RunningPool {
    control: UnboundedSender<ControlMessage>,
    controller: JoinHandle<StopReport>,
}

/// Coordinates the worker pool and its controller task
pub struct Scheduler {
    /// Shared configuration; memory_cost is overwritten by the difficulty refresher
    config: Arc<ArcSwap<MiningConfig>>,
    /// Hash engine shared by all workers and the submission pipeline
    algorithm: Arc<dyn Algorithm>,
    /// Remote authority used for submissions
    authority: Arc<dyn Authority>,
    /// Retry policy for submission requests
    retry: RetryPolicy,
    /// Latest pool statistics
    snapshot: Arc<ArcSwap<PoolSnapshot>>,
    /// Accepted/rejected counts across restarts
    tally: Arc<SubmissionTally>,
    /// Present while the pool is running
    running: Option<RunningPool>,
}

impl Scheduler {
    /// Creates a stopped scheduler
    ///
    /// # Arguments
    /// * `config` - Shared mining configuration
    /// * `algorithm` - The hash engine
    /// * `authority` - Where matches are verified and submitted
    /// * `retry` - Retry policy for submission requests
    pub fn new(
        config: Arc<ArcSwap<MiningConfig>>,
        algorithm: Arc<dyn Algorithm>,
        authority: Arc<dyn Authority>,
        retry: RetryPolicy,
    ) -> Self {
        Scheduler {
            config,
            algorithm,
            authority,
            retry,
            snapshot: Arc::new(ArcSwap::from_pointee(PoolSnapshot::default())),
            tally: Arc::new(SubmissionTally::default()),
            running: None,
        }
    }

    /// Whether a pool run is in progress
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Latest published statistics
    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot::clone(&self.snapshot.load())
    }

    /// The cell statistics are published into, for reporters
    pub fn snapshot_cell(&self) -> Arc<ArcSwap<PoolSnapshot>> {
        Arc::clone(&self.snapshot)
    }

    /// Spawns the workers and the controller
    ///
    /// Every worker gets the configuration as it is right now; later changes
    /// only reach workers started by a subsequent call. Must be called from
    /// within a tokio runtime.
    pub fn start(&mut self) -> Result<(), MinerError> {
        if self.running.is_some() {
            return Err(MinerError::TaskError("Mining pool already running".into()));
        }

        let config = self.config.load_full();
        let salt = config.salt()?;
        let count = config.worker_count();

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut workers = Vec::with_capacity(count);
        for worker_id in 0..count {
            let handle = Worker::spawn(worker_id, Arc::clone(&self.algorithm), event_tx.clone())?;
            let started = handle.start(WorkerConfig {
                worker_id,
                account: config.account.clone(),
                salt: salt.clone(),
                memory_cost: config.memory_cost,
            });
            workers.push(handle);
            if let Err(e) = started {
                workers.iter().for_each(WorkerHandle::stop);
                return Err(e);
            }
        }
        // Only workers hold event senders, so the channel closes when all exit
        drop(event_tx);

        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let controller = Controller {
            workers,
            tracker: RateTracker::new(),
            submissions: HashMap::new(),
            seen: HashSet::new(),
            ctx: SubmissionContext {
                authority: Arc::clone(&self.authority),
                algorithm: Arc::clone(&self.algorithm),
                retry: self.retry,
                account: config.account.clone(),
            },
            submit_xuni: config.submit_xuni,
            tally: Arc::clone(&self.tally),
            snapshot: Arc::clone(&self.snapshot),
            control: control_tx.clone(),
        };
        controller.publish();

        log::info!(
            "Mining pool started: {} workers, memory cost {} KB",
            count,
            config.memory_cost
        );
        self.running = Some(RunningPool {
            control: control_tx,
            controller: tokio::spawn(controller.run(event_rx, control_rx)),
        });
        Ok(())
    }

    /// Asks the controller to stop all workers
    ///
    /// Returns immediately; use [`Scheduler::wait`] for the outcome.
    pub fn stop(&self) {
        if let Some(pool) = &self.running {
            let _ = pool.control.send(ControlMessage::Stop);
        }
    }

    /// Waits for the current run to end
    ///
    /// Never completes while no pool is running. Cancel safe: dropping the
    /// future leaves the pool untouched.
    pub async fn wait(&mut self) -> Result<StopReport, MinerError> {
        let Some(pool) = self.running.as_mut() else {
            return std::future::pending().await;
        };
        let report = (&mut pool.controller).await;
        self.running = None;
        Ok(report?)
    }

    /// Stops the running pool and starts a new one with the current config
    ///
    /// # Returns
    /// Submissions that were still in flight in the previous run
    pub async fn restart(&mut self) -> Result<Vec<JoinHandle<()>>, MinerError> {
        let mut pending = Vec::new();
        if self.is_running() {
            self.stop();
            pending = self.wait().await?.pending_submissions;
        }
        self.start()?;
        Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miner::algorithm::HashResult;
    use crate::network::authority::{SubmitRequest, VerifyReply, VerifyRequest};
    use crate::types::{BlockRecord, MatchKind};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use futures::future::join_all;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Barrier;

    const ACCOUNT: &str = "0x1234567890123456789012345678901234567890";

    /// Returns the same text for every key, or fails
    struct FixedHash(Option<&'static str>);

    impl Algorithm for FixedHash {
        fn hash(&self, _: &str, _: &[u8], _: u32) -> Result<HashResult, MinerError> {
            std::thread::sleep(Duration::from_millis(1));
            self.0
                .map(HashResult::new)
                .ok_or_else(|| MinerError::HashComputeError("out of memory".into()))
        }
        fn verify(&self, _: &str, _: &str) -> bool {
            true
        }
    }

    /// Returns the memory cost it was called with, and remembers it
    #[derive(Default)]
    struct EchoCost {
        costs: Mutex<Vec<u32>>,
    }

    impl Algorithm for EchoCost {
        fn hash(&self, _: &str, _: &[u8], memory_cost: u32) -> Result<HashResult, MinerError> {
            std::thread::sleep(Duration::from_millis(1));
            self.costs.lock().unwrap().push(memory_cost);
            Ok(HashResult::new(format!("m={}", memory_cost)))
        }
        fn verify(&self, _: &str, _: &str) -> bool {
            true
        }
    }

    #[derive(Default)]
    struct CountingAuthority {
        verified: Mutex<Vec<String>>,
        /// When set, every verify waits for the others to arrive
        barrier: Option<Barrier>,
    }

    #[async_trait]
    impl Authority for CountingAuthority {
        async fn difficulty(&self) -> Result<u32, MinerError> {
            Ok(8)
        }
        async fn verify(&self, request: &VerifyRequest) -> Result<VerifyReply, MinerError> {
            self.verified
                .lock()
                .unwrap()
                .push(request.hash_to_verify.clone());
            if let Some(barrier) = &self.barrier {
                barrier.wait().await;
            }
            Ok(VerifyReply {
                status: 200,
                body: json!({"success": true}),
            })
        }
        async fn last_blocks(&self) -> Result<Vec<BlockRecord>, MinerError> {
            Ok(vec![BlockRecord {
                block_id: 700,
                hash_to_verify: "h".into(),
                key: "k".into(),
                account: ACCOUNT.into(),
            }])
        }
        async fn submit(&self, _: &SubmitRequest) -> Result<Value, MinerError> {
            Ok(json!({"status": "ok"}))
        }
    }

    fn scheduler(hash: Option<&'static str>, authority: Arc<CountingAuthority>) -> Scheduler {
        let mut config = MiningConfig::new(ACCOUNT, 8).unwrap();
        config.worker_threads = 2;
        Scheduler::new(
            Arc::new(ArcSwap::from_pointee(config)),
            Arc::new(FixedHash(hash)),
            authority,
            RetryPolicy::new(0, Duration::ZERO),
        )
    }

    fn controller(authority: Arc<CountingAuthority>, submit_xuni: bool) -> Controller {
        let (control, _) = mpsc::unbounded_channel();
        Controller {
            workers: Vec::new(),
            tracker: RateTracker::new(),
            submissions: HashMap::new(),
            seen: HashSet::new(),
            ctx: SubmissionContext {
                authority,
                algorithm: Arc::new(FixedHash(Some("h"))),
                retry: RetryPolicy::new(0, Duration::ZERO),
                account: ACCOUNT.into(),
            },
            submit_xuni,
            tally: Arc::default(),
            snapshot: Arc::new(ArcSwap::from_pointee(PoolSnapshot::default())),
            control,
        }
    }

    fn xen11(hash: &str, worker_id: usize) -> Match {
        Match {
            target: Target::Xen11,
            kind: MatchKind::Standard,
            hash: hash.into(),
            key: "k".into(),
            attempts: 1,
            worker_id,
        }
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..500 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_progress_is_aggregated_and_zeroed_on_stop() {
        let mut pool = scheduler(Some("00ff00ff"), Arc::default());
        pool.start().unwrap();
        assert!(pool.is_running());

        wait_until(|| pool.snapshot().total_attempts >= 5).await;
        assert!(pool.snapshot().active_workers >= 1);

        pool.stop();
        let report = pool.wait().await.unwrap();
        assert_eq!(report.reason, StopReason::Requested);
        assert!(!pool.is_running());
        assert_eq!(pool.snapshot().total_attempts, 0);
    }

    #[tokio::test]
    async fn test_worker_error_stops_the_pool() {
        let mut pool = scheduler(None, Arc::default());
        pool.start().unwrap();

        let report = pool.wait().await.unwrap();
        match report.reason {
            StopReason::WorkerFailed { reason, .. } => assert!(reason.contains("out of memory")),
            other => panic!("unexpected stop reason: {:?}", other),
        }
        assert!(!pool.is_running());
    }

    #[tokio::test]
    async fn test_repeated_match_is_submitted_once() {
        let authority = Arc::new(CountingAuthority::default());
        let mut pool = scheduler(Some("0000XEN11ffff"), Arc::clone(&authority));
        pool.start().unwrap();

        wait_until(|| pool.snapshot().accepted == 1).await;
        wait_until(|| pool.snapshot().total_attempts >= 10).await;
        pool.stop();
        let report = pool.wait().await.unwrap();
        for task in report.pending_submissions {
            task.await.unwrap();
        }

        assert_eq!(*authority.verified.lock().unwrap(), vec!["0000XEN11ffff"]);
        assert_eq!(pool.snapshot().accepted, 1);
        assert_eq!(pool.snapshot().rejected, 0);
    }

    #[tokio::test]
    async fn test_xuni_match_is_dropped_unless_enabled() {
        let authority = Arc::new(CountingAuthority::default());
        let mut controller = controller(Arc::clone(&authority), false);
        let xuni = Match {
            target: Target::Xuni,
            kind: MatchKind::Standard,
            hash: "abcXUNI7def".into(),
            key: "k".into(),
            attempts: 4,
            worker_id: 0,
        };

        controller.on_found(xuni.clone());
        assert!(controller.submissions.is_empty());

        controller.submit_xuni = true;
        controller.on_found(xuni);
        assert_eq!(controller.submissions.len(), 1);
        for (_, task) in controller.submissions.drain() {
            task.await.unwrap();
        }
        assert_eq!(*authority.verified.lock().unwrap(), vec!["abcXUNI7def"]);
    }

    #[tokio::test]
    async fn test_restart_while_stopped_starts() {
        let mut pool = scheduler(Some("00"), Arc::default());
        let pending = pool.restart().await.unwrap();
        assert!(pending.is_empty());
        assert!(pool.is_running());
        assert!(pool.start().is_err());
        pool.stop();
        pool.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_distinct_matches_submit_concurrently() {
        // Both verifies must be in flight at once for either to finish
        let authority = Arc::new(CountingAuthority {
            barrier: Some(Barrier::new(2)),
            ..Default::default()
        });
        let mut controller = controller(Arc::clone(&authority), false);

        controller.on_found(xen11("aaaaXEN11one", 0));
        controller.on_found(xen11("bbbbXEN11two", 1));
        assert_eq!(controller.submissions.len(), 2);

        let tasks: Vec<_> = controller.submissions.drain().map(|(_, task)| task).collect();
        let results = tokio::time::timeout(Duration::from_secs(5), join_all(tasks))
            .await
            .expect("submissions ran one after the other");
        assert!(results.iter().all(Result::is_ok));

        let mut verified = authority.verified.lock().unwrap().clone();
        verified.sort();
        assert_eq!(verified, vec!["aaaaXEN11one", "bbbbXEN11two"]);
        assert_eq!(controller.tally.accepted.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_memory_cost_change_reaches_only_restarted_workers() {
        let algorithm = Arc::new(EchoCost::default());
        let mut config = MiningConfig::new(ACCOUNT, 8).unwrap();
        config.worker_threads = 1;
        let shared = Arc::new(ArcSwap::from_pointee(config));
        let mut pool = Scheduler::new(
            Arc::clone(&shared),
            algorithm.clone(),
            Arc::new(CountingAuthority::default()),
            RetryPolicy::new(0, Duration::ZERO),
        );
        pool.start().unwrap();
        wait_until(|| pool.snapshot().total_attempts >= 3).await;

        shared.rcu(|current| {
            let mut next = MiningConfig::clone(current);
            next.memory_cost = 16;
            next
        });
        let before = algorithm.costs.lock().unwrap().len();
        wait_until(|| algorithm.costs.lock().unwrap().len() >= before + 5).await;
        assert!(algorithm.costs.lock().unwrap().iter().all(|&cost| cost == 8));

        let pending = pool.restart().await.unwrap();
        assert!(pending.is_empty());
        wait_until(|| algorithm.costs.lock().unwrap().contains(&16)).await;

        pool.stop();
        assert_eq!(pool.wait().await.unwrap().reason, StopReason::Requested);
    }
}
