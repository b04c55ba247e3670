//! Error types and classification for parquet-queue.
//!
//! This crate provides:
//! - [`PqError`] - Top-level error enum for all pipeline errors
//! - Domain-specific errors ([`SourceError`], [`PublishError`], [`FetchError`])
//! - [`ErrorKind`] - The failure taxonomy reported to callers
//!
//! A pipeline run surfaces exactly one [`PqError`] per file. Callers use
//! [`PqError::kind`] to tell a total transport failure apart from a partial
//! publish, or a missing file apart from a broken range read.

use std::time::Duration;
use thiserror::Error;

/// Top-level error type for parquet-queue.
#[derive(Error, Debug)]
pub enum PqError {
    /// Row source errors (open, count, range read)
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Publisher errors (encoding, transport, partial rejection)
    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    /// Remote object retrieval errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Work stopped because the shared cancellation signal fired
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// The overall deadline passed before the work finished
    #[error("Deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),

    /// A worker task panicked or was aborted
    #[error("Worker task failed: {0}")]
    Task(String),

    /// Generic errors (wrapped anyhow)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Row source errors.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The file cannot be opened as a row source
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// Total row count could not be determined
    #[error("Row count failed: {0}")]
    Count(String),

    /// A ranged read failed
    #[error("Range query failed: {0}")]
    Query(String),

    /// Rows were read but could not be decoded into records
    #[error("Row decode failed: {0}")]
    Decode(String),

    /// A ranged read returned fewer rows than requested
    #[error("Short read: expected {expected} rows, got {actual}")]
    ShortRead { expected: u64, actual: u64 },
}

/// A single record rejected by the downstream queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    /// Entry id within the batch call
    pub id: String,

    /// Error code reported by the queue
    pub code: String,

    /// Optional human-readable reason
    pub message: Option<String>,
}

impl std::fmt::Display for RejectedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{} ({}: {})", self.id, self.code, msg),
            None => write!(f, "{} ({})", self.id, self.code),
        }
    }
}

/// Publisher errors.
#[derive(Error, Debug)]
pub enum PublishError {
    /// A record could not be serialized into a message body
    #[error("Encoding failed for record {record}: {message}")]
    Encoding { record: usize, message: String },

    /// The batch call itself failed
    #[error("Transport failed: {0}")]
    Transport(String),

    /// The call succeeded but some records were rejected
    #[error("Partial failure: {succeeded} succeeded, {failed} failed")]
    PartialFailure {
        succeeded: u64,
        failed: u64,
        rejected: Vec<RejectedRecord>,
    },
}

/// Remote object retrieval errors.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Object does not exist
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Access denied
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Local I/O failure while writing the object
    #[error("I/O error: {0}")]
    Io(String),

    /// Any other S3 failure
    #[error("S3 error: {0}")]
    S3(String),
}

/// Failure taxonomy reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The row source cannot be opened (fatal for the whole file)
    SourceUnavailable,

    /// A range read or row count failed
    QueryFailure,

    /// A record could not be serialized for publishing
    EncodingFailure,

    /// The publish call itself failed
    TransportFailure,

    /// The publish call succeeded but rejected some records
    PartialPublishFailure,

    /// Stopped by the shared cancellation signal
    Cancelled,

    /// Stopped by the overall deadline
    Timeout,

    /// Invalid configuration
    Config,

    /// Panics, aborted tasks and anything unclassified
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::SourceUnavailable => "SourceUnavailable",
            Self::QueryFailure => "QueryFailure",
            Self::EncodingFailure => "EncodingFailure",
            Self::TransportFailure => "TransportFailure",
            Self::PartialPublishFailure => "PartialPublishFailure",
            Self::Cancelled => "Cancelled",
            Self::Timeout => "Timeout",
            Self::Config => "Config",
            Self::Internal => "Internal",
        };
        f.write_str(name)
    }
}

impl PqError {
    /// Classifies this error into the caller-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PqError::Source(SourceError::Unavailable(_)) => ErrorKind::SourceUnavailable,
            PqError::Source(_) => ErrorKind::QueryFailure,
            PqError::Publish(e) => match e {
                PublishError::Encoding { .. } => ErrorKind::EncodingFailure,
                PublishError::Transport(_) => ErrorKind::TransportFailure,
                PublishError::PartialFailure { .. } => ErrorKind::PartialPublishFailure,
            },
            PqError::Fetch(_) => ErrorKind::SourceUnavailable,
            PqError::Config(_) => ErrorKind::Config,
            PqError::Cancelled(_) => ErrorKind::Cancelled,
            PqError::DeadlineExceeded(_) => ErrorKind::Timeout,
            PqError::Task(_) | PqError::Other(_) => ErrorKind::Internal,
        }
    }

    /// Returns true if this error only reflects a stop signal, not a fault.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, PqError::Cancelled(_))
    }

    /// Returns true if the error was a partial publish (some records accepted).
    pub fn is_partial(&self) -> bool {
        self.kind() == ErrorKind::PartialPublishFailure
    }
}

/// Result type alias using PqError.
pub type Result<T> = std::result::Result<T, PqError>;
