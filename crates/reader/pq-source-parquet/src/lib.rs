//! Parquet row source and object fetchers for parquet-queue.
//!
//! - [`ParquetSource`] opens local Parquet files as shared, read-only
//!   [`RowReader`](pq_traits::RowReader)s. Each range read decodes only the
//!   requested rows using offset/limit selection over the file's row groups.
//! - [`S3Fetcher`] downloads objects from S3 (or LocalStack) to local disk.
//! - [`LocalFetcher`] copies objects from a local directory tree laid out as
//!   `<root>/<bucket>/<key>`.

mod decode;
mod local;
mod s3;
mod source;

pub use decode::batch_to_records;
pub use local::LocalFetcher;
pub use s3::{S3Fetcher, S3FetcherConfig};
pub use source::{ParquetFile, ParquetSource, ParquetSourceConfig};
