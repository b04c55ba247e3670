//! Main execution logic for pq-processor CLI.

use anyhow::{Context, Result, anyhow, bail};
use pq_error::PqError;
use pq_pipeline::{FileProcessor, PipelineStats, RequestHandler, StatsSnapshot};
use pq_publisher::{SqsConfig, SqsPublisher, StatsPublisher, StdoutPublisher};
use pq_source_parquet::{
    LocalFetcher, ParquetSource, ParquetSourceConfig, S3Fetcher, S3FetcherConfig,
};
use pq_traits::{ObjectFetcher, Publisher};
use pq_types::{ProcessRequest, ProcessResponse};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::args::{Cli, DestinationType};
use crate::progress::ProgressReporter;

/// Result of handling one request.
pub struct Outcome {
    pub response: std::result::Result<ProcessResponse, PqError>,
    pub stats: StatsSnapshot,
}

/// Execute one request with the provided arguments.
///
/// Setup failures return `Err`; pipeline failures are reported in
/// [`Outcome::response`] alongside the statistics gathered so far.
pub async fn execute(args: Cli) -> Result<Outcome> {
    let config = args.pipeline.to_config();
    config.validate().map_err(|e| anyhow!("{}", e))?;

    let request = load_request(&args).await?;
    info!(
        bucket = %request.bucket,
        paths = request.paths.len(),
        destination = ?args.destination,
        "Starting processor"
    );

    let publisher = build_publisher(&args).await?;
    let fetcher = build_fetcher(&args).await?;

    let source = Arc::new(ParquetSource::new(
        ParquetSourceConfig::default().with_read_batch_size(config.read_batch_size),
    ));
    let stats = Arc::new(PipelineStats::new());
    let processor = FileProcessor::new(source, publisher, config, Arc::clone(&stats));

    let mut handler = RequestHandler::new(fetcher, processor);
    if let Some(dir) = &args.work_dir {
        handler = handler.with_work_dir(dir);
    }

    let cancel = CancellationToken::new();
    let signals = tokio::spawn(cancel_on_signal(cancel.clone()));

    let mut progress = ProgressReporter::new(args.progress, args.progress_interval);
    progress.start(Arc::clone(&stats));

    let response = handler.handle(&request, &cancel).await;

    signals.abort();
    stats.complete();
    progress.stop(&stats).await;

    Ok(Outcome {
        response,
        stats: stats.snapshot(),
    })
}

/// Read the request from `--request`, or assemble it from `--bucket`/`--path`.
async fn load_request(args: &Cli) -> Result<ProcessRequest> {
    let Some(source) = &args.request else {
        let bucket = args
            .bucket
            .clone()
            .ok_or_else(|| anyhow!("--bucket is required without --request"))?;
        return Ok(ProcessRequest::new(bucket, args.paths.clone()));
    };

    let raw = if source == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("Failed to read request from stdin")?;
        buf
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("Failed to read request file '{}'", source))?
    };

    parse_request(&raw)
}

fn parse_request(raw: &str) -> Result<ProcessRequest> {
    let request: ProcessRequest =
        serde_json::from_str(raw.trim()).context("Invalid request JSON")?;
    if request.bucket.is_empty() {
        bail!("Request bucket must not be empty");
    }
    Ok(request)
}

async fn build_publisher(args: &Cli) -> Result<Arc<dyn Publisher>> {
    let publisher: Arc<dyn Publisher> = match args.destination {
        DestinationType::Sqs => {
            let queue_url = args
                .queue_url
                .as_ref()
                .ok_or_else(|| anyhow!("--queue-url is required when destination=sqs"))?;

            let mut config = SqsConfig::new(queue_url)
                .with_region(&args.region)
                .with_batch_size(args.sqs_batch_size);
            if let Some(endpoint) = &args.sqs_endpoint {
                config = config.with_endpoint(endpoint);
            }
            if let (Some(key), Some(secret)) = (&args.access_key, &args.secret_key) {
                config = config.with_credentials(key, secret);
            }
            if let Some(profile) = &args.profile {
                config = config.with_profile(profile);
            }

            Arc::new(SqsPublisher::new(config).await)
        }
        DestinationType::Stdout => Arc::new(StdoutPublisher::new(args.output_format.into())),
        DestinationType::Stats => Arc::new(StatsPublisher::new()),
    };
    Ok(publisher)
}

async fn build_fetcher(args: &Cli) -> Result<Arc<dyn ObjectFetcher>> {
    if let Some(root) = &args.local_root {
        info!(root = %root.display(), "Fetching objects from local directory");
        return Ok(Arc::new(LocalFetcher::new(root)));
    }

    let mut config = S3FetcherConfig::new(&args.region);
    if let Some(endpoint) = &args.s3_endpoint {
        config = config.with_endpoint(endpoint);
    }
    Ok(Arc::new(S3Fetcher::new(config).await?))
}

/// Cancel `token` on SIGINT or SIGTERM.
async fn cancel_on_signal(token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = match signal(SignalKind::terminate()) {
            Ok(term) => term,
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                token.cancel();
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => warn!("Received SIGINT, cancelling"),
            _ = term.recv() => warn!("Received SIGTERM, cancelling"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        warn!("Received Ctrl-C, cancelling");
    }

    token.cancel();
}
