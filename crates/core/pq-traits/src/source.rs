//! Row source traits.

use async_trait::async_trait;
use pq_error::Result;
use pq_types::{Record, RowRange};
use std::path::Path;
use std::sync::Arc;

/// Opens local files as row readers.
///
/// # Implementations
///
/// - Parquet source: footer-based row count, offset/limit decoding per range
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Opens a local file.
    ///
    /// Fails with `SourceError::Unavailable` if the file cannot be opened.
    async fn open(&self, path: &Path) -> Result<Arc<dyn RowReader>>;
}

/// A read-only handle bound to one opened file.
///
/// Every call is an independent range query, so a single handle is safely
/// shared by all range workers of a file without locking.
#[async_trait]
pub trait RowReader: Send + Sync {
    /// Location of the underlying file, for logging.
    fn location(&self) -> &str;

    /// Total number of rows in the file.
    async fn count(&self) -> Result<u64>;

    /// Reads exactly `range.len()` rows starting at `range.start`, in row order.
    async fn read_range(&self, range: RowRange) -> Result<Vec<Record>>;
}
