// src/submission/pipeline.rs
//! Verify-and-submit pipeline for a found hash
//!
//! One [`SubmissionPipeline`] is created per match and consumed by
//! [`SubmissionPipeline::run`]. It walks
//! `Idle -> Verifying -> FetchingRecords -> BuildingMerkle -> Submitting`
//! and ends in `Done` or `Failed`. Every request goes through the retry
//! policy; no error leaves the pipeline other than as its return value.

use crate::miner::algorithm::Algorithm;
use crate::miner::nonce::sha256_hex;
use crate::network::authority::{Authority, SubmitRequest, VerifyRequest};
use crate::network::retry::RetryPolicy;
use crate::submission::merkle;
use crate::types::{BlockRecord, Match};
use crate::utils::error::MinerError;
use rayon::prelude::*;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Stage a submission is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    /// Created, not yet run
    Idle,
    /// Asking the authority to verify the found hash
    Verifying,
    /// Fetching the last mined records
    FetchingRecords,
    /// Re-verifying records and folding the leaves
    BuildingMerkle,
    /// Posting the proof of work
    Submitting,
    /// The authority took the submission
    Done,
    /// Some stage failed; nothing more is attempted
    Failed,
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubmissionState::Idle => "idle",
            SubmissionState::Verifying => "verifying",
            SubmissionState::FetchingRecords => "fetching records",
            SubmissionState::BuildingMerkle => "building merkle root",
            SubmissionState::Submitting => "submitting",
            SubmissionState::Done => "done",
            SubmissionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Shared, read-only collaborators of every pipeline instance
#[derive(Clone)]
pub struct SubmissionContext {
    /// Remote authority
    pub authority: Arc<dyn Authority>,
    /// Hash engine, used for record re-verification
    pub algorithm: Arc<dyn Algorithm>,
    /// Retry wrapped around each request
    pub retry: RetryPolicy,
    /// Account submitting the proof of work
    pub account: String,
}

/// Threads re-verifying fetched records, per submission
pub const VERIFY_THREADS: usize = 2;

/// Leaves derived from a record snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafSet {
    /// Leaves of records that passed verification, in record order
    pub leaves: Vec<String>,
    /// `block_id / 100` of the last record in the snapshot, verified or not
    pub output_block_id: Option<u64>,
}

impl LeafSet {
    /// Re-verifies every record and derives leaves from those that pass
    ///
    /// Each verification is a full Argon2 run at the record's own memory
    /// cost. They run on a dedicated pool of [`VERIFY_THREADS`] threads so
    /// the mining workers keep their cores and peak memory stays bounded;
    /// the result keeps record order.
    pub fn derive(records: &[BlockRecord], algorithm: &dyn Algorithm) -> Result<Self, MinerError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(VERIFY_THREADS)
            .thread_name(|i| format!("verify-{}", i))
            .build()
            .map_err(|e| MinerError::TaskError(format!("Verification pool: {}", e)))?;
        let verified: Vec<bool> = pool.install(|| {
            records
                .par_iter()
                .map(|record| algorithm.verify(&record.hash_to_verify, &record.key))
                .collect()
        });

        let leaves = records
            .iter()
            .zip(verified)
            .filter_map(|(record, ok)| {
                if ok {
                    Some(leaf_hash(record))
                } else {
                    log::debug!("Record {} failed verification, dropped", record.block_id);
                    None
                }
            })
            .collect();

        Ok(LeafSet {
            leaves,
            output_block_id: records.last().map(|record| record.block_id / 100),
        })
    }
}

/// Leaf for a verified record: SHA-256 hex of the concatenated field text
pub fn leaf_hash(record: &BlockRecord) -> String {
    sha256_hex(&format!(
        "{}{}{}{}",
        record.block_id, record.hash_to_verify, record.key, record.account
    ))
}

/// State machine carrying one match from verification to submission
pub struct SubmissionPipeline {
    ctx: SubmissionContext,
    found: Match,
    hashes_per_second: f64,
    state: SubmissionState,
}

impl SubmissionPipeline {
    /// Creates an idle pipeline for `found`
    ///
    /// # Arguments
    /// * `ctx` - Authority, engine, retry policy and account
    /// * `found` - The match to submit
    /// * `hashes_per_second` - Pool speed reported with the verify request
    pub fn new(ctx: SubmissionContext, found: Match, hashes_per_second: f64) -> Self {
        Self {
            ctx,
            found,
            hashes_per_second,
            state: SubmissionState::Idle,
        }
    }

    /// Current stage
    pub fn state(&self) -> SubmissionState {
        self.state
    }

    /// Runs the pipeline to completion
    ///
    /// # Returns
    /// * `Ok(Value)` - The authority's answer to the submission (`Done`)
    /// * `Err(MinerError)` - Why the pipeline ended in `Failed`
    pub async fn run(mut self) -> Result<Value, MinerError> {
        let result = self.execute().await;
        match &result {
            Ok(answer) => {
                self.transition(SubmissionState::Done);
                log::info!(
                    "Block {} submitted by worker {}: {}",
                    self.found.short_id(),
                    self.found.worker_id,
                    answer
                );
            }
            Err(e) => {
                let stage = self.state;
                self.transition(SubmissionState::Failed);
                log::warn!(
                    "Submission of {} failed while {}: {}",
                    self.found.short_id(),
                    stage,
                    e
                );
            }
        }
        result
    }

    async fn execute(&mut self) -> Result<Value, MinerError> {
        self.verify_found().await?;
        let records = self.fetch_records().await?;

        self.transition(SubmissionState::BuildingMerkle);
        let algorithm = Arc::clone(&self.ctx.algorithm);
        let leaf_set =
            tokio::task::spawn_blocking(move || LeafSet::derive(&records, algorithm.as_ref()))
                .await??;

        let merkle_root = merkle::reduce(&leaf_set.leaves).ok_or_else(|| {
            MinerError::SubmissionError("no block record passed verification".into())
        })?;
        let block_id = leaf_set
            .output_block_id
            .ok_or_else(|| MinerError::SubmissionError("authority returned no records".into()))?;
        log::debug!(
            "Merkle root {} over {} leaves, block id {}",
            merkle_root,
            leaf_set.leaves.len(),
            block_id
        );

        self.transition(SubmissionState::Submitting);
        let request = SubmitRequest {
            account_address: self.ctx.account.clone(),
            block_id,
            merkle_root,
            key: self.found.key.clone(),
            hash_to_verify: self.found.hash.clone(),
        };
        let authority = Arc::clone(&self.ctx.authority);
        self.ctx
            .retry
            .run("send_pow", || {
                let authority = Arc::clone(&authority);
                let request = request.clone();
                async move { authority.submit(&request).await }
            })
            .await
    }

    async fn verify_found(&mut self) -> Result<(), MinerError> {
        self.transition(SubmissionState::Verifying);
        let request = VerifyRequest {
            hash_to_verify: self.found.hash.clone(),
            key: self.found.key.clone(),
            account: self.ctx.account.clone(),
            attempts: self.found.attempts,
            hashes_per_second: self.hashes_per_second,
            worker: self.found.worker_id,
        };
        let authority = Arc::clone(&self.ctx.authority);
        let reply = self
            .ctx
            .retry
            .run("verify", || {
                let authority = Arc::clone(&authority);
                let request = request.clone();
                async move { authority.verify(&request).await }
            })
            .await?;

        if !reply.accepted() {
            return Err(MinerError::SubmissionError(format!(
                "verification rejected (HTTP {}): {}",
                reply.status, reply.body
            )));
        }
        log::info!("Hash {} verified", self.found.short_id());
        Ok(())
    }

    async fn fetch_records(&mut self) -> Result<Vec<BlockRecord>, MinerError> {
        self.transition(SubmissionState::FetchingRecords);
        let authority = Arc::clone(&self.ctx.authority);
        let records = self
            .ctx
            .retry
            .run("lastblock", || {
                let authority = Arc::clone(&authority);
                async move { authority.last_blocks().await }
            })
            .await?;
        log::debug!("Fetched {} block records", records.len());
        Ok(records)
    }

    fn transition(&mut self, next: SubmissionState) {
        log::debug!(
            "Submission {}: {} -> {}",
            self.found.short_id(),
            self.state,
            next
        );
        self.state = next;
    }
}
