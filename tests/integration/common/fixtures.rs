//! Parquet fixtures and in-process publishers.

use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use parking_lot::Mutex;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use pq_error::Result;
use pq_traits::{PublishReport, Publisher};
use pq_types::{Batch, Record};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Parquet bytes with columns `id`, `name`, `score` and rows split into row
/// groups of `row_group_size`.
pub fn parquet_bytes(num_records: usize, row_group_size: usize) -> Vec<u8> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("score", DataType::Int64, true),
    ]));

    let ids: Vec<i64> = (0..num_records as i64).collect();
    let names: Vec<String> = (0..num_records).map(|i| format!("user_{}", i)).collect();
    let scores: Vec<Option<i64>> = (0..num_records as i64)
        .map(|i| (i % 10 != 0).then_some((i * 7) % 100))
        .collect();

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(ids)),
            Arc::new(StringArray::from(names)),
            Arc::new(Int64Array::from(scores)),
        ],
    )
    .expect("Failed to create record batch");

    let props = WriterProperties::builder()
        .set_max_row_group_size(row_group_size)
        .build();

    let mut buf = Vec::new();
    {
        let mut writer =
            ArrowWriter::try_new(&mut buf, schema, Some(props)).expect("Failed to create writer");
        writer.write(&batch).expect("Failed to write batch");
        writer.close().expect("Failed to close writer");
    }
    buf
}

/// A temporary directory laid out as `<root>/<bucket>/<key>`.
pub struct LocalBucket {
    dir: TempDir,
    bucket: String,
}

impl LocalBucket {
    pub fn new(bucket: &str) -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
            bucket: bucket.to_string(),
        }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn put(&self, key: &str, data: &[u8]) {
        let path = self.dir.path().join(&self.bucket).join(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create object dir");
        }
        std::fs::write(path, data).expect("Failed to write object");
    }
}

/// Keeps every published record.
#[derive(Default)]
pub struct CollectingPublisher {
    records: Mutex<Vec<Record>>,
    batch_sizes: Mutex<Vec<usize>>,
}

impl CollectingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().clone()
    }

    /// Published `id` values, sorted.
    pub fn sorted_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .records
            .lock()
            .iter()
            .filter_map(|r| r.value()["id"].as_i64())
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[async_trait]
impl Publisher for CollectingPublisher {
    async fn publish_batch(&self, batch: &Batch) -> Result<PublishReport> {
        let ids = (0..batch.len()).map(|i| format!("msg-{i}")).collect();
        self.batch_sizes.lock().push(batch.len());
        self.records.lock().extend(batch.records().iter().cloned());
        Ok(PublishReport::success(batch.index(), ids, 0))
    }
}
