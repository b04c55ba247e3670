//! Remote object retrieval.

use async_trait::async_trait;
use pq_error::Result;
use std::path::Path;

/// Copies a remote object onto local storage so it can be opened as a row source.
#[async_trait]
pub trait ObjectFetcher: Send + Sync {
    /// Downloads `bucket/key` into `dest`, returning the number of bytes written.
    async fn fetch(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64>;
}
