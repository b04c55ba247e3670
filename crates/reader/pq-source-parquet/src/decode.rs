//! Arrow record batch to record conversion.

use arrow::record_batch::RecordBatch;
use arrow_json::writer::{LineDelimited, WriterBuilder};
use pq_error::{Result, SourceError};
use pq_types::Record;
use std::io::BufRead;

/// Converts every row of an Arrow record batch into a JSON [`Record`].
///
/// Null columns are kept as explicit `null` fields so every record of a file
/// carries the same set of keys.
pub fn batch_to_records(batch: &RecordBatch) -> Result<Vec<Record>> {
    if batch.num_rows() == 0 {
        return Ok(Vec::new());
    }

    let mut writer = WriterBuilder::new()
        .with_explicit_nulls(true)
        .build::<_, LineDelimited>(Vec::new());
    writer
        .write(batch)
        .map_err(|e| SourceError::Decode(format!("Failed to encode rows as JSON: {}", e)))?;
    writer
        .finish()
        .map_err(|e| SourceError::Decode(format!("Failed to finish JSON encoding: {}", e)))?;
    let buf = writer.into_inner();

    let mut records = Vec::with_capacity(batch.num_rows());
    for line in buf.lines() {
        let line =
            line.map_err(|e| SourceError::Decode(format!("Invalid UTF-8 in row: {}", e)))?;
        if line.is_empty() {
            continue;
        }
        let value = serde_json::from_str(&line)
            .map_err(|e| SourceError::Decode(format!("Invalid JSON row: {}", e)))?;
        records.push(Record::new(value));
    }

    Ok(records)
}
