//! Request handling: fetch each object, then publish its rows.

use pq_error::{FetchError, PqError, Result};
use pq_traits::ObjectFetcher;
use pq_types::{ProcessRequest, ProcessResponse};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::coordinator::Deadline;
use crate::processor::FileProcessor;

/// Adapts a [`ProcessRequest`] to the per-file pipeline.
///
/// Paths are handled one after another in request order. The first failing
/// path aborts the request; files before it stay published.
pub struct RequestHandler {
    fetcher: Arc<dyn ObjectFetcher>,
    processor: FileProcessor,
    work_dir: Option<PathBuf>,
}

impl RequestHandler {
    /// Create a handler downloading through `fetcher`.
    pub fn new(fetcher: Arc<dyn ObjectFetcher>, processor: FileProcessor) -> Self {
        Self {
            fetcher,
            processor,
            work_dir: None,
        }
    }

    /// Create per-request temporary directories under `dir`.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// The file processor.
    pub fn processor(&self) -> &FileProcessor {
        &self.processor
    }

    /// Handles one request, echoing its paths on full success.
    pub async fn handle(
        &self,
        request: &ProcessRequest,
        cancel: &CancellationToken,
    ) -> Result<ProcessResponse> {
        let deadline = self.processor.config().deadline.map(Deadline::after);

        info!(
            bucket = %request.bucket,
            paths = request.paths.len(),
            "Handling request"
        );

        let tmp = self.create_temp_dir()?;
        debug!(dir = %tmp.path().display(), "Created temp dir");

        let result = self.process_paths(request, tmp.path(), cancel, deadline).await;

        let dir = tmp.path().display().to_string();
        match tmp.close() {
            Ok(()) => debug!(dir = %dir, "Removed temp dir"),
            Err(e) => warn!(dir = %dir, error = %e, "Failed to remove temp dir"),
        }

        result.map(|()| ProcessResponse {
            paths: request.paths.clone(),
        })
    }

    fn create_temp_dir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("pq-");
        let dir = match &self.work_dir {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        dir.map_err(|e| PqError::Fetch(FetchError::Io(format!("Failed to create temp dir: {}", e))))
    }

    async fn process_paths(
        &self,
        request: &ProcessRequest,
        tmp: &Path,
        cancel: &CancellationToken,
        deadline: Option<Deadline>,
    ) -> Result<()> {
        for key in &request.paths {
            checkpoint(cancel, deadline)?;

            let name = Path::new(key)
                .file_name()
                .ok_or_else(|| PqError::Config(format!("Path has no file name: '{}'", key)))?;
            let local = tmp.join(name);

            let bytes = self.fetcher.fetch(&request.bucket, key, &local).await?;
            debug!(bucket = %request.bucket, path = %key, bytes = bytes, "Fetched object");

            checkpoint(cancel, deadline)?;

            let report = self
                .processor
                .process_file_until(&local, cancel, deadline)
                .await?;
            info!(path = %key, rows = report.rows, "processed file");

            if let Err(e) = tokio::fs::remove_file(&local).await {
                debug!(path = %local.display(), error = %e, "Failed to remove local copy");
            }
        }
        Ok(())
    }
}

fn checkpoint(cancel: &CancellationToken, deadline: Option<Deadline>) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(PqError::Cancelled("request cancelled".to_string()));
    }
    match deadline {
        Some(d) if d.expired() => Err(PqError::DeadlineExceeded(d.budget())),
        _ => Ok(()),
    }
}
