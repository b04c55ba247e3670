//! S3 object fetcher.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use pq_error::{FetchError, PqError, Result};
use pq_traits::ObjectFetcher;
use std::path::Path;
use tracing::{debug, info};

/// Configuration for the S3 fetcher.
#[derive(Debug, Clone)]
pub struct S3FetcherConfig {
    /// AWS region
    pub region: String,

    /// Optional endpoint URL (for LocalStack or other S3-compatible stores)
    pub endpoint: Option<String>,

    /// Use path-style addressing (`endpoint/bucket/key`)
    pub force_path_style: bool,
}

impl S3FetcherConfig {
    /// Create a new configuration for the given region.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            endpoint: None,
            force_path_style: false,
        }
    }

    /// Set the endpoint URL. Path-style addressing is enabled with it.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self.force_path_style = true;
        self
    }
}

/// Downloads S3 objects onto local disk.
#[derive(Clone)]
pub struct S3Fetcher {
    client: Client,
}

impl S3Fetcher {
    /// Create a new fetcher, resolving credentials from the default chain.
    pub async fn new(config: S3FetcherConfig) -> Result<Self> {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        info!(
            region = %config.region,
            endpoint = ?config.endpoint,
            "Created S3 fetcher"
        );

        Ok(Self {
            client: Client::from_conf(builder.build()),
        })
    }

    /// Create a fetcher from an existing client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectFetcher for S3Fetcher {
    async fn fetch(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64> {
        debug!(bucket = bucket, key = key, dest = %dest.display(), "Downloading object from S3");

        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify_get_error(bucket, key, e))?;

        let mut file = tokio::fs::File::create(dest).await.map_err(|e| {
            PqError::Fetch(FetchError::Io(format!(
                "Failed to create {}: {}",
                dest.display(),
                e
            )))
        })?;

        let mut body = output.body.into_async_read();
        let bytes = tokio::io::copy(&mut body, &mut file).await.map_err(|e| {
            PqError::Fetch(FetchError::Io(format!(
                "Failed to download s3://{}/{}: {}",
                bucket, key, e
            )))
        })?;

        debug!(bucket = bucket, key = key, bytes = bytes, "Downloaded object");
        Ok(bytes)
    }
}

fn classify_get_error(bucket: &str, key: &str, err: SdkError<GetObjectError>) -> PqError {
    let uri = format!("s3://{}/{}", bucket, key);

    if let Some(service) = err.as_service_error() {
        if service.is_no_such_key() {
            return PqError::Fetch(FetchError::NotFound(uri));
        }
    }

    match err.raw_response().map(|r| r.status().as_u16()) {
        Some(404) => PqError::Fetch(FetchError::NotFound(uri)),
        Some(403) => PqError::Fetch(FetchError::AccessDenied(uri)),
        _ => PqError::Fetch(FetchError::S3(format!("Failed to download {}: {}", uri, err))),
    }
}
