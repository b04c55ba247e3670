//! SQS publisher.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sqs::operation::send_message_batch::SendMessageBatchOutput;
use aws_sdk_sqs::types::SendMessageBatchRequestEntry;
use aws_sdk_sqs::Client;
use pq_error::{PqError, PublishError, RejectedRecord, Result};
use pq_traits::{PublishReport, Publisher};
use pq_types::{Batch, MAX_BATCH_SIZE};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

/// Configuration for the SQS publisher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqsConfig {
    /// SQS queue URL
    pub queue_url: String,

    /// Custom endpoint URL (for LocalStack)
    pub endpoint: Option<String>,

    /// AWS region
    pub region: Option<String>,

    /// Explicit AWS access key (optional, uses default credentials if not set)
    pub access_key: Option<String>,

    /// Explicit AWS secret key (optional, uses default credentials if not set)
    pub secret_key: Option<String>,

    /// AWS profile name (optional)
    pub profile: Option<String>,

    /// Entries per `SendMessageBatch` call (max 10)
    pub batch_size: usize,
}

impl SqsConfig {
    /// Create a new SqsConfig with the required queue URL.
    pub fn new(queue_url: impl Into<String>) -> Self {
        Self {
            queue_url: queue_url.into(),
            endpoint: None,
            region: None,
            access_key: None,
            secret_key: None,
            profile: None,
            batch_size: MAX_BATCH_SIZE,
        }
    }

    /// Set a custom endpoint (for LocalStack).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the AWS region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set explicit credentials.
    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    /// Set the AWS profile.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Set the batch size (capped at 10).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }
}

/// Publishes each record of a batch as one SQS message.
///
/// Entries are identified as `msg-<i>` by their position in the batch, so a
/// rejected id maps straight back to a record.
pub struct SqsPublisher {
    client: Client,
    queue_url: String,
    batch_size: usize,
}

impl SqsPublisher {
    /// Create a new publisher from configuration.
    pub async fn new(config: SqsConfig) -> Self {
        let client = build_sqs_client(&config).await;
        Self {
            client,
            queue_url: config.queue_url,
            batch_size: config.batch_size.clamp(1, MAX_BATCH_SIZE),
        }
    }

    /// Create a publisher with an existing client.
    pub fn with_client(client: Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
            batch_size: MAX_BATCH_SIZE,
        }
    }

    /// Queue URL this publisher sends to.
    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }
}

#[async_trait]
impl Publisher for SqsPublisher {
    async fn publish_batch(&self, batch: &Batch) -> Result<PublishReport> {
        if batch.is_empty() {
            return Ok(PublishReport::success(batch.index(), Vec::new(), 0));
        }
        if batch.len() > self.batch_size {
            return Err(PqError::Config(format!(
                "Batch {} holds {} records, publisher limit is {}",
                batch.index(),
                batch.len(),
                self.batch_size
            )));
        }

        let start = Instant::now();
        let (entries, bytes) = build_entries(batch)?;

        debug!(
            batch_index = batch.index(),
            records = entries.len(),
            "Sending SQS batch"
        );

        let output = self
            .client
            .send_message_batch()
            .queue_url(&self.queue_url)
            .set_entries(Some(entries))
            .send()
            .await
            .map_err(|e| {
                PqError::Publish(PublishError::Transport(format!(
                    "SendMessageBatch failed for batch {}: {}",
                    batch.index(),
                    e
                )))
            })?;

        let report = report_from_output(batch.index(), &output, bytes).with_duration(start.elapsed());

        if !report.is_complete_success() {
            warn!(
                batch_index = batch.index(),
                succeeded = report.success_count(),
                failed = report.failed_count(),
                "SQS rejected records"
            );
        }

        Ok(report)
    }

    fn max_batch_size(&self) -> usize {
        self.batch_size
    }
}

/// Builds one request entry per record, returning the entries and body bytes.
fn build_entries(batch: &Batch) -> Result<(Vec<SendMessageBatchRequestEntry>, u64)> {
    let mut entries = Vec::with_capacity(batch.len());
    let mut bytes = 0u64;

    for (i, record) in batch.records().iter().enumerate() {
        let body = record.to_body().map_err(|e| {
            PqError::Publish(PublishError::Encoding {
                record: i,
                message: e.to_string(),
            })
        })?;
        bytes += body.len() as u64;

        let entry = SendMessageBatchRequestEntry::builder()
            .id(format!("msg-{}", i))
            .message_body(body)
            .build()
            .map_err(|e| {
                PqError::Publish(PublishError::Encoding {
                    record: i,
                    message: format!("Failed to build SQS entry: {e}"),
                })
            })?;

        entries.push(entry);
    }

    Ok((entries, bytes))
}

fn report_from_output(batch_index: u32, output: &SendMessageBatchOutput, bytes: u64) -> PublishReport {
    let succeeded = output
        .successful()
        .iter()
        .map(|entry| entry.id().to_string())
        .collect();

    let rejected = output
        .failed()
        .iter()
        .map(|entry| RejectedRecord {
            id: entry.id().to_string(),
            code: entry.code().to_string(),
            message: entry.message().map(str::to_string),
        })
        .collect();

    PublishReport::success(batch_index, succeeded, bytes).with_rejected(rejected)
}

/// Build an SQS client from configuration.
async fn build_sqs_client(config: &SqsConfig) -> Client {
    use aws_config::Region;

    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }

    if let Some(endpoint) = &config.endpoint {
        loader = loader.endpoint_url(endpoint);
    }

    if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
        let credentials =
            aws_sdk_sqs::config::Credentials::new(access_key, secret_key, None, None, "pq-publisher");
        loader = loader.credentials_provider(credentials);
    }

    if let Some(profile) = &config.profile {
        loader = loader.profile_name(profile);
    }

    let aws_config = loader.load().await;
    Client::new(&aws_config)
}
