//! Local directory object fetcher.

use async_trait::async_trait;
use pq_error::{FetchError, PqError, Result};
use pq_traits::ObjectFetcher;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Serves objects from `<root>/<bucket>/<key>`.
#[derive(Debug, Clone)]
pub struct LocalFetcher {
    root: PathBuf,
}

impl LocalFetcher {
    /// Create a fetcher rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Local path of an object.
    pub fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.root.join(bucket).join(key.trim_start_matches('/'))
    }
}

#[async_trait]
impl ObjectFetcher for LocalFetcher {
    async fn fetch(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64> {
        let src = self.object_path(bucket, key);
        debug!(src = %src.display(), dest = %dest.display(), "Copying local object");

        tokio::fs::copy(&src, dest).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                PqError::Fetch(FetchError::NotFound(src.display().to_string()))
            }
            std::io::ErrorKind::PermissionDenied => {
                PqError::Fetch(FetchError::AccessDenied(src.display().to_string()))
            }
            _ => PqError::Fetch(FetchError::Io(format!(
                "Failed to copy {} to {}: {}",
                src.display(),
                dest.display(),
                e
            ))),
        })
    }
}
