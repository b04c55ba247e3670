//! Parquet row source over local files.
//!
//! The footer is read once when a file is opened. Every range read after
//! that builds its own decoder from the cached footer, so any number of
//! range workers can read from one [`ParquetFile`] at the same time.

use crate::decode::batch_to_records;
use async_trait::async_trait;
use futures::StreamExt;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectMeta, ObjectStore};
use parquet::arrow::arrow_reader::{ArrowReaderMetadata, ArrowReaderOptions};
use parquet::arrow::async_reader::{ParquetObjectReader, ParquetRecordBatchStreamBuilder};
use pq_error::{PqError, Result, SourceError};
use pq_traits::{RowReader, RowSource};
use pq_types::{Record, RowRange};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Configuration for the Parquet row source.
#[derive(Debug, Clone)]
pub struct ParquetSourceConfig {
    /// Rows decoded per read step within a range
    pub read_batch_size: usize,
}

impl Default for ParquetSourceConfig {
    fn default() -> Self {
        Self {
            read_batch_size: 1_000,
        }
    }
}

impl ParquetSourceConfig {
    /// Set the number of rows decoded per read step.
    pub fn with_read_batch_size(mut self, size: usize) -> Self {
        self.read_batch_size = size.max(1);
        self
    }
}

/// Opens local Parquet files.
pub struct ParquetSource {
    config: ParquetSourceConfig,
    store: Arc<dyn ObjectStore>,
}

impl ParquetSource {
    /// Create a new source with the given configuration.
    pub fn new(config: ParquetSourceConfig) -> Self {
        Self {
            config,
            store: Arc::new(LocalFileSystem::new()),
        }
    }

    /// Opens a file, returning the concrete handle.
    pub async fn open_file(&self, path: &Path) -> Result<ParquetFile> {
        let location = path.display().to_string();
        info!(file = %location, "Opening Parquet file");

        let absolute = tokio::fs::canonicalize(path).await.map_err(|e| {
            PqError::Source(SourceError::Unavailable(format!("{}: {}", location, e)))
        })?;
        let object_path = ObjectPath::from_absolute_path(&absolute).map_err(|e| {
            PqError::Source(SourceError::Unavailable(format!(
                "Invalid local path '{}': {}",
                location, e
            )))
        })?;

        let meta = self.store.head(&object_path).await.map_err(|e| match e {
            object_store::Error::NotFound { .. } => {
                PqError::Source(SourceError::Unavailable(format!("{}: not found", location)))
            }
            e => PqError::Source(SourceError::Unavailable(format!("{}: {}", location, e))),
        })?;

        debug!(file = %location, size = meta.size, "Reading Parquet footer");

        let mut reader = ParquetObjectReader::new(Arc::clone(&self.store), meta.clone());
        let metadata = ArrowReaderMetadata::load_async(&mut reader, ArrowReaderOptions::new())
            .await
            .map_err(|e| {
                PqError::Source(SourceError::Unavailable(format!(
                    "Not a readable Parquet file '{}': {}",
                    location, e
                )))
            })?;

        Ok(ParquetFile {
            location,
            store: Arc::clone(&self.store),
            meta,
            metadata,
            read_batch_size: self.config.read_batch_size,
        })
    }
}

impl Default for ParquetSource {
    fn default() -> Self {
        Self::new(ParquetSourceConfig::default())
    }
}

#[async_trait]
impl RowSource for ParquetSource {
    async fn open(&self, path: &Path) -> Result<Arc<dyn RowReader>> {
        Ok(Arc::new(self.open_file(path).await?))
    }
}

/// A read-only handle on one opened Parquet file.
pub struct ParquetFile {
    location: String,
    store: Arc<dyn ObjectStore>,
    meta: ObjectMeta,
    metadata: ArrowReaderMetadata,
    read_batch_size: usize,
}

impl ParquetFile {
    /// Size of the file in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.meta.size as u64
    }

    /// Number of row groups in the file.
    pub fn num_row_groups(&self) -> usize {
        self.metadata.metadata().num_row_groups()
    }

    fn total_rows(&self) -> Result<u64> {
        let rows: i64 = self
            .metadata
            .metadata()
            .row_groups()
            .iter()
            .map(|rg| rg.num_rows())
            .sum();
        u64::try_from(rows).map_err(|_| {
            PqError::Source(SourceError::Count(format!(
                "Negative row count {} in '{}'",
                rows, self.location
            )))
        })
    }
}

#[async_trait]
impl RowReader for ParquetFile {
    fn location(&self) -> &str {
        &self.location
    }

    async fn count(&self) -> Result<u64> {
        let rows = self.total_rows()?;
        debug!(file = %self.location, rows = rows, "Counted rows");
        Ok(rows)
    }

    async fn read_range(&self, range: RowRange) -> Result<Vec<Record>> {
        let expected = range.len();
        let offset = usize::try_from(range.offset())
            .map_err(|_| PqError::Source(SourceError::Query(format!("Offset out of range: {}", range))))?;
        let limit = usize::try_from(range.limit())
            .map_err(|_| PqError::Source(SourceError::Query(format!("Limit out of range: {}", range))))?;

        trace!(file = %self.location, range = %range, "Reading row range");

        let reader = ParquetObjectReader::new(Arc::clone(&self.store), self.meta.clone());
        let mut stream = ParquetRecordBatchStreamBuilder::new_with_metadata(reader, self.metadata.clone())
            .with_batch_size(self.read_batch_size)
            .with_offset(offset)
            .with_limit(limit)
            .build()
            .map_err(|e| {
                PqError::Source(SourceError::Query(format!(
                    "Failed to build reader for {} of '{}': {}",
                    range, self.location, e
                )))
            })?;

        let mut records = Vec::with_capacity(limit);
        while let Some(batch) = stream.next().await {
            let batch = batch.map_err(|e| {
                PqError::Source(SourceError::Query(format!(
                    "Failed to read {} of '{}': {}",
                    range, self.location, e
                )))
            })?;
            records.extend(batch_to_records(&batch)?);
        }

        let actual = records.len() as u64;
        if actual != expected {
            return Err(PqError::Source(SourceError::ShortRead { expected, actual }));
        }

        trace!(file = %self.location, range = %range, rows = actual, "Read row range");
        Ok(records)
    }
}
