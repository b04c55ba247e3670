//! Publish batches.

use crate::Record;

/// Hard per-call limit of the downstream queue's batch API.
pub const MAX_BATCH_SIZE: usize = 10;

/// A bounded group of records published in a single call.
///
/// Batches carry no ordering relative to each other. The index exists for
/// tracing a batch back to its position within a range, never for
/// reassembly.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    index: u32,
    records: Vec<Record>,
}

impl Batch {
    /// Creates a new batch.
    pub fn new(index: u32, records: Vec<Record>) -> Self {
        Self { index, records }
    }

    /// Position of this batch within the sequence it was sliced from.
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Records in this batch, in source order.
    #[inline]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records in this batch.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the batch holds no records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consumes the batch, returning its records.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}
