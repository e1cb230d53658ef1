// src/utils/error.rs
use crate::miner::scheduler::WorkerCommand;
use serde_json;
use std::io;
use thiserror::Error;
use url;

/// Main error type for the mining application
///
/// This enum represents all possible error conditions that can occur
/// during mining operations, including hashing, network, I/O and
/// configuration errors.
#[derive(Error, Debug)]
pub enum MinerError {
    /// The hash engine failed (e.g. the configured memory cost could not be allocated).
    /// Fatal to the originating worker and, through the controller, to the pool.
    #[error("Hash computation error: {0}")]
    HashComputeError(String),

    /// A request to the remote authority failed or returned an unusable response
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Errors in protocol handling or invalid protocol messages
    #[error("Protocol violation: {0}")]
    ProtocolError(String),

    /// Malformed account address or other rejected user input
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Standard I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    /// HTTP request/response errors
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Configuration file or parameter errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Thread communication channel errors
    #[error("Thread communication error: {0}")]
    ChannelError(String),

    /// A submission could not be completed
    #[error("Submission failed: {0}")]
    SubmissionError(String),

    /// Async task execution errors
    #[error("Task execution error: {0}")]
    TaskError(String),
}

/// Converts crossbeam channel send errors for worker commands into MinerError
///
/// Raised when a worker thread has already exited and dropped its command receiver.
impl From<crossbeam_channel::SendError<WorkerCommand>> for MinerError {
    fn from(e: crossbeam_channel::SendError<WorkerCommand>) -> Self {
        MinerError::ChannelError(format!("Worker command send failed: {}", e))
    }
}

/// Converts hex decoding errors into MinerError
///
/// Used when the account address cannot be turned into salt bytes.
impl From<hex::FromHexError> for MinerError {
    fn from(e: hex::FromHexError) -> Self {
        MinerError::ValidationError(format!("Hex conversion failed: {}", e))
    }
}

/// Converts Argon2 parameter and hashing errors into MinerError
impl From<argon2::Error> for MinerError {
    fn from(e: argon2::Error) -> Self {
        MinerError::HashComputeError(e.to_string())
    }
}

/// Converts PHC string encoding errors into MinerError
impl From<argon2::password_hash::Error> for MinerError {
    fn from(e: argon2::password_hash::Error) -> Self {
        MinerError::HashComputeError(e.to_string())
    }
}

/// Converts async task join errors into MinerError
///
/// Used when background tasks fail unexpectedly, including:
/// - Record verification on the blocking pool
/// - Submission tasks
/// - The controller task
impl From<tokio::task::JoinError> for MinerError {
    fn from(e: tokio::task::JoinError) -> Self {
        MinerError::TaskError(format!("Async task failed: {}", e))
    }
}
