//! S3 and SQS round trips against LocalStack.

use crate::common::{LocalStackTestContext, parquet_bytes};
use pq_error::{ErrorKind, FetchError, PqError};
use pq_pipeline::{FileProcessor, PipelineConfig, PipelineStats, RequestHandler};
use pq_publisher::{SqsConfig, SqsPublisher};
use pq_source_parquet::{ParquetSource, S3Fetcher, S3FetcherConfig};
use pq_traits::{ObjectFetcher, Publisher};
use pq_types::{Batch, ProcessRequest, Record};
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

async fn sqs_publisher(ctx: &LocalStackTestContext, queue_url: &str) -> SqsPublisher {
    let config = SqsConfig::new(queue_url)
        .with_endpoint(&ctx.endpoint)
        .with_region(&ctx.region)
        .with_credentials("test", "test");
    SqsPublisher::new(config).await
}

async fn s3_fetcher(ctx: &LocalStackTestContext) -> S3Fetcher {
    S3Fetcher::new(S3FetcherConfig::new(&ctx.region).with_endpoint(&ctx.endpoint))
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_publish_batch_delivers_json_bodies() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let queue_url = ctx.create_queue("pq-publish-batch").await.unwrap();
    ctx.purge_queue(&queue_url).await.ok();

    let publisher = sqs_publisher(&ctx, &queue_url).await;
    let records = (0..7).map(|i| Record::new(json!({"id": i}))).collect();
    let report = publisher.publish_batch(&Batch::new(0, records)).await.unwrap();

    assert!(report.is_complete_success());
    assert_eq!(report.success_count(), 7);

    let mut ids: Vec<i64> = ctx
        .drain(&queue_url, 7)
        .await
        .unwrap()
        .iter()
        .filter_map(|b| serde_json::from_str::<Value>(b).ok())
        .filter_map(|v| v["id"].as_i64())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..7).collect::<Vec<i64>>());

    ctx.delete_queue(&queue_url).await.ok();
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_request_from_s3_to_sqs() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let bucket = "pq-integration";
    ctx.create_bucket(bucket).await.unwrap();
    ctx.put_object(bucket, "in/a.parquet", parquet_bytes(95, 40))
        .await
        .unwrap();
    ctx.put_object(bucket, "in/b.parquet", parquet_bytes(23, 10))
        .await
        .unwrap();

    let queue_url = ctx.create_queue("pq-request").await.unwrap();
    ctx.purge_queue(&queue_url).await.ok();

    let config = PipelineConfig::new()
        .with_rows_per_worker(40)
        .with_publish_concurrency(2);
    let processor = FileProcessor::new(
        Arc::new(ParquetSource::default()),
        Arc::new(sqs_publisher(&ctx, &queue_url).await),
        config,
        Arc::new(PipelineStats::new()),
    );
    let handler = RequestHandler::new(Arc::new(s3_fetcher(&ctx).await), processor);

    let request = ProcessRequest::new(
        bucket,
        vec!["in/a.parquet".to_string(), "in/b.parquet".to_string()],
    );
    let response = handler
        .handle(&request, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(response.paths, request.paths);

    let bodies = ctx.drain(&queue_url, 118).await.unwrap();
    assert_eq!(bodies.len(), 118);

    let stats = handler.processor().stats().snapshot();
    assert_eq!(stats.records_published, 118);
    assert_eq!(stats.records_rejected, 0);

    ctx.delete_queue(&queue_url).await.ok();
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_fetch_missing_key_is_not_found() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    ctx.create_bucket("pq-integration").await.unwrap();

    let dir = TempDir::new().unwrap();
    let err = s3_fetcher(&ctx)
        .await
        .fetch("pq-integration", "no/such/key.parquet", &dir.path().join("x"))
        .await
        .unwrap_err();

    assert!(matches!(err, PqError::Fetch(FetchError::NotFound(_))));
    assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_missing_queue_is_transport_failure() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let queue_url = format!("{}/000000000000/pq-does-not-exist", ctx.endpoint);
    let publisher = sqs_publisher(&ctx, &queue_url).await;

    let err = publisher
        .publish_batch(&Batch::new(0, vec![Record::new(json!({"id": 1}))]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TransportFailure);
}
