// src/miner/worker.rs
//! Worker thread implementation
//!
//! Each worker owns one OS thread. It waits for a start command, then hashes
//! random nonces until told to stop, reporting progress and found matches
//! back to the pool controller as typed events.

use crate::miner::algorithm::Algorithm;
use crate::miner::matcher::MatchDetector;
use crate::miner::nonce::NonceGenerator;
use crate::miner::scheduler::{WorkerCommand, WorkerEvent};
use crate::types::Match;
use crate::utils::error::MinerError;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::mpsc::UnboundedSender;

/// Parameters a worker mines with, fixed for the lifetime of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Identifier unique within the pool
    pub worker_id: usize,
    /// Account the work is credited to
    pub account: String,
    /// Salt derived from the account address
    pub salt: Vec<u8>,
    /// Argon2 memory cost in KB, snapshotted when the pool started
    pub memory_cost: u32,
}

/// Worker thread that performs mining computations
pub struct Worker {
    /// Identifier used in every event
    id: usize,
    /// The mining algorithm implementation to use
    algorithm: Arc<dyn Algorithm>,
    /// Commands from the controller
    commands: Receiver<WorkerCommand>,
    /// Events back to the controller
    events: UnboundedSender<WorkerEvent>,
}

impl Worker {
    /// Spawns an idle worker thread
    ///
    /// # Arguments
    /// * `id` - Worker identifier
    /// * `algorithm` - The mining algorithm to use
    /// * `events` - Channel the worker reports on
    ///
    /// # Returns
    /// A handle used to start and stop the worker
    pub fn spawn(
        id: usize,
        algorithm: Arc<dyn Algorithm>,
        events: UnboundedSender<WorkerEvent>,
    ) -> Result<WorkerHandle, MinerError> {
        let (commands_tx, commands_rx) = crossbeam_channel::unbounded();
        let worker = Worker {
            id,
            algorithm,
            commands: commands_rx,
            events,
        };

        let thread = std::thread::Builder::new()
            .name(format!("worker-{}", id))
            .spawn(move || worker.run())?;

        Ok(WorkerHandle {
            id,
            commands: commands_tx,
            thread,
        })
    }

    /// Waits for a start command, then mines until stopped
    fn run(self) {
        match self.commands.recv() {
            Ok(WorkerCommand::Start(config)) => self.mine(config),
            Ok(WorkerCommand::Stop) | Err(_) => {
                log::debug!("Worker {} stopped before starting", self.id);
            }
        }
    }

    /// The mining loop; Stop is observed at the top of every attempt
    fn mine(&self, config: WorkerConfig) {
        log::debug!(
            "Worker {} mining for {} at memory cost {} KB",
            self.id,
            config.account,
            config.memory_cost
        );

        let mut nonces = NonceGenerator::new();
        let detector = MatchDetector::new();
        let mut attempts: u64 = 0;

        loop {
            match self.commands.try_recv() {
                Ok(WorkerCommand::Stop) | Err(TryRecvError::Disconnected) => break,
                Ok(WorkerCommand::Start(_)) => {
                    log::warn!("Worker {} is already running, start ignored", self.id);
                }
                Err(TryRecvError::Empty) => {}
            }

            attempts += 1;
            let key = nonces.generate();
            let hash = match self.algorithm.hash(&key, &config.salt, config.memory_cost) {
                Ok(hash) => hash.into_string(),
                Err(e) => {
                    let _ = self.events.send(WorkerEvent::Error {
                        worker_id: self.id,
                        reason: e.to_string(),
                    });
                    return;
                }
            };

            // The controller is gone; nobody is left to report to
            if self
                .events
                .send(WorkerEvent::Progress {
                    worker_id: self.id,
                    attempts,
                })
                .is_err()
            {
                break;
            }

            if let Some(detection) = detector.check(&hash) {
                let found = Match {
                    target: detection.target,
                    kind: detection.kind,
                    hash,
                    key,
                    attempts,
                    worker_id: self.id,
                };
                if self
                    .events
                    .send(WorkerEvent::Found {
                        worker_id: self.id,
                        found,
                    })
                    .is_err()
                {
                    break;
                }
            }
        }

        log::debug!("Worker {} stopped after {} attempts", self.id, attempts);
    }
}

/// Controller-side handle to a worker thread
#[derive(Debug)]
pub struct WorkerHandle {
    id: usize,
    commands: Sender<WorkerCommand>,
    thread: JoinHandle<()>,
}

impl WorkerHandle {
    /// Starts mining with the given configuration
    pub fn start(&self, config: WorkerConfig) -> Result<(), MinerError> {
        self.commands.send(WorkerCommand::Start(config))?;
        Ok(())
    }

    /// Asks the worker to stop at the top of its next attempt
    ///
    /// A worker that already exited is not an error.
    pub fn stop(&self) {
        let _ = self.commands.send(WorkerCommand::Stop);
    }

    /// Blocks until the worker thread exits
    pub fn join(self) {
        if self.thread.join().is_err() {
            log::error!("Worker {} panicked", self.id);
        }
    }
}
