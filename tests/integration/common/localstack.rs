//! LocalStack test context and utilities.

use aws_sdk_s3::Client as S3Client;
use aws_sdk_sqs::Client as SqsClient;
use aws_sdk_sqs::types::DeleteMessageBatchRequestEntry;
use std::time::Duration;

/// LocalStack test context providing S3 and SQS clients.
pub struct LocalStackTestContext {
    pub s3: S3Client,
    pub sqs: SqsClient,
    pub endpoint: String,
    pub region: String,
}

impl LocalStackTestContext {
    /// Create a new LocalStack test context.
    ///
    /// Uses the `LOCALSTACK_ENDPOINT` environment variable if set,
    /// otherwise defaults to `http://localhost:4566`.
    pub async fn new() -> Self {
        let endpoint = std::env::var("LOCALSTACK_ENDPOINT")
            .unwrap_or_else(|_| "http://localhost:4566".to_string());
        let region = "us-east-1".to_string();

        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(region.clone()))
            .endpoint_url(&endpoint)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(true)
            .build();

        Self {
            s3: S3Client::from_conf(s3_config),
            sqs: SqsClient::new(&config),
            endpoint,
            region,
        }
    }

    /// Check if LocalStack is available and healthy.
    pub async fn is_available(&self) -> bool {
        self.s3.list_buckets().send().await.is_ok()
    }

    /// Create an S3 bucket unless it already exists.
    pub async fn create_bucket(&self, name: &str) -> Result<(), aws_sdk_s3::Error> {
        let buckets = self.s3.list_buckets().send().await?;
        let exists = buckets
            .buckets()
            .iter()
            .any(|b| b.name().unwrap_or_default() == name);

        if !exists {
            self.s3.create_bucket().bucket(name).send().await?;
        }
        Ok(())
    }

    /// Upload an object.
    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
    ) -> Result<(), aws_sdk_s3::Error> {
        self.s3
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(data.into())
            .content_type("application/octet-stream")
            .send()
            .await?;
        Ok(())
    }

    /// Create an SQS queue, returning its URL.
    pub async fn create_queue(&self, name: &str) -> Result<String, aws_sdk_sqs::Error> {
        let result = self.sqs.create_queue().queue_name(name).send().await?;
        Ok(result.queue_url.unwrap_or_default())
    }

    /// Purge all messages from an SQS queue.
    pub async fn purge_queue(&self, queue_url: &str) -> Result<(), aws_sdk_sqs::Error> {
        self.sqs.purge_queue().queue_url(queue_url).send().await?;
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(())
    }

    /// Delete an SQS queue.
    pub async fn delete_queue(&self, queue_url: &str) -> Result<(), aws_sdk_sqs::Error> {
        self.sqs.delete_queue().queue_url(queue_url).send().await?;
        Ok(())
    }

    /// Receive and delete messages until `expected` bodies were seen or a
    /// receive comes back empty.
    pub async fn drain(
        &self,
        queue_url: &str,
        expected: usize,
    ) -> Result<Vec<String>, aws_sdk_sqs::Error> {
        let mut bodies = Vec::with_capacity(expected);

        while bodies.len() < expected {
            let result = self
                .sqs
                .receive_message()
                .queue_url(queue_url)
                .max_number_of_messages(10)
                .wait_time_seconds(1)
                .send()
                .await?;

            let messages = result.messages();
            if messages.is_empty() {
                break;
            }

            let mut entries = Vec::with_capacity(messages.len());
            for (i, message) in messages.iter().enumerate() {
                if let Some(body) = message.body() {
                    bodies.push(body.to_string());
                }
                if let Some(handle) = message.receipt_handle() {
                    entries.push(
                        DeleteMessageBatchRequestEntry::builder()
                            .id(i.to_string())
                            .receipt_handle(handle)
                            .build()
                            .expect("Failed to build delete entry"),
                    );
                }
            }

            self.sqs
                .delete_message_batch()
                .queue_url(queue_url)
                .set_entries(Some(entries))
                .send()
                .await?;
        }

        Ok(bodies)
    }
}
