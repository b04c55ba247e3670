//! End-to-end request handling over local files.
//!
//! Objects are served by `LocalFetcher` and read with the real Parquet
//! source, so everything except the network hop is exercised.

use crate::common::{CollectingPublisher, LocalBucket, parquet_bytes};
use pq_error::ErrorKind;
use pq_pipeline::{FileProcessor, PipelineConfig, PipelineStats, RequestHandler};
use pq_publisher::StatsPublisher;
use pq_source_parquet::{LocalFetcher, ParquetSource, ParquetSourceConfig};
use pq_traits::Publisher;
use pq_types::ProcessRequest;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn handler(
    bucket: &LocalBucket,
    publisher: Arc<dyn Publisher>,
    config: PipelineConfig,
) -> RequestHandler {
    let source = Arc::new(ParquetSource::new(
        ParquetSourceConfig::default().with_read_batch_size(config.read_batch_size),
    ));
    let processor = FileProcessor::new(source, publisher, config, Arc::new(PipelineStats::new()));
    RequestHandler::new(Arc::new(LocalFetcher::new(bucket.root())), processor)
}

#[tokio::test]
async fn test_every_row_published_once() {
    let bucket = LocalBucket::new("data");
    bucket.put("in/customers.parquet", &parquet_bytes(10_000, 3_000));

    let publisher = Arc::new(CollectingPublisher::new());
    let config = PipelineConfig::new()
        .with_rows_per_worker(2_500)
        .with_max_concurrency(3);

    let handler = handler(&bucket, publisher.clone(), config);
    let request = ProcessRequest::new(bucket.bucket(), vec!["in/customers.parquet".to_string()]);

    let response = handler
        .handle(&request, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response.paths, request.paths);
    assert_eq!(publisher.sorted_ids(), (0..10_000).collect::<Vec<i64>>());
    assert_eq!(publisher.batch_sizes().len(), 1_000);
    assert!(publisher.batch_sizes().iter().all(|&n| n <= 10));

    let stats = handler.processor().stats().snapshot();
    assert_eq!(stats.files_processed, 1);
    assert_eq!(stats.rows_read, 10_000);
    assert_eq!(stats.units_launched, 4);
    assert_eq!(stats.units_completed, 4);
}

#[tokio::test]
async fn test_records_keep_column_names_and_nulls() {
    let bucket = LocalBucket::new("data");
    bucket.put("small.parquet", &parquet_bytes(12, 5));

    let publisher = Arc::new(CollectingPublisher::new());
    let handler = handler(&bucket, publisher.clone(), PipelineConfig::new());

    handler
        .handle(
            &ProcessRequest::new("data", vec!["small.parquet".to_string()]),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let mut records: Vec<_> = publisher
        .records()
        .into_iter()
        .map(|r| r.into_value())
        .collect();
    records.sort_by_key(|v| v["id"].as_i64());

    assert_eq!(records.len(), 12);
    assert_eq!(records[0], json!({"id": 0, "name": "user_0", "score": null}));
    assert_eq!(records[3], json!({"id": 3, "name": "user_3", "score": 21}));
}

#[tokio::test]
async fn test_multiple_files_with_stats_publisher() {
    let bucket = LocalBucket::new("data");
    bucket.put("a.parquet", &parquet_bytes(95, 40));
    bucket.put("b.parquet", &parquet_bytes(0, 10));
    bucket.put("c.parquet", &parquet_bytes(23, 23));

    let publisher = Arc::new(StatsPublisher::new());
    let config = PipelineConfig::new().with_rows_per_worker(40);

    let handler = handler(&bucket, publisher.clone(), config);
    let request = ProcessRequest::new(
        "data",
        vec!["a.parquet".into(), "b.parquet".into(), "c.parquet".into()],
    );

    handler
        .handle(&request, &CancellationToken::new())
        .await
        .unwrap();

    let report = publisher.get_stats();
    assert_eq!(report.records, 118);
    // 95 rows: ranges of 40, 40, 15 give 4 + 4 + 2 batches; 23 rows give 3
    assert_eq!(report.batches, 13);
    assert_eq!(handler.processor().stats().files_processed(), 3);
}

#[tokio::test]
async fn test_missing_object_stops_request() {
    let bucket = LocalBucket::new("data");
    bucket.put("a.parquet", &parquet_bytes(30, 30));
    bucket.put("c.parquet", &parquet_bytes(30, 30));

    let publisher = Arc::new(StatsPublisher::new());
    let handler = handler(&bucket, publisher.clone(), PipelineConfig::new());
    let request = ProcessRequest::new(
        "data",
        vec!["a.parquet".into(), "missing.parquet".into(), "c.parquet".into()],
    );

    let err = handler
        .handle(&request, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
    assert_eq!(publisher.get_stats().records, 30);
}

#[tokio::test]
async fn test_corrupt_object_is_source_unavailable() {
    let bucket = LocalBucket::new("data");
    bucket.put("bad.parquet", b"definitely not parquet");

    let handler = handler(&bucket, Arc::new(StatsPublisher::new()), PipelineConfig::new());
    let err = handler
        .handle(
            &ProcessRequest::new("data", vec!["bad.parquet".into()]),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
}

#[tokio::test]
async fn test_cancelled_request_publishes_nothing() {
    let bucket = LocalBucket::new("data");
    bucket.put("a.parquet", &parquet_bytes(100, 50));

    let publisher = Arc::new(StatsPublisher::new());
    let handler = handler(&bucket, publisher.clone(), PipelineConfig::new());

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = handler
        .handle(&ProcessRequest::new("data", vec!["a.parquet".into()]), &cancel)
        .await
        .unwrap_err();

    assert!(err.is_cancellation());
    assert_eq!(publisher.get_stats().records, 0);
}
