//! Positional batching of records.

use pq_types::{Batch, Record, MAX_BATCH_SIZE};

/// Slices records into batches of at most `max_batch_size`, preserving order.
///
/// Batch `i` holds records `[i * max_batch_size, (i + 1) * max_batch_size)`.
/// Every record lands in exactly one batch.
///
/// # Panics
///
/// Panics if `max_batch_size` is zero or above [`MAX_BATCH_SIZE`]. The limit
/// is fixed by the queue, so exceeding it is a programming error.
pub fn chunk(records: Vec<Record>, max_batch_size: usize) -> Vec<Batch> {
    assert!(
        (1..=MAX_BATCH_SIZE).contains(&max_batch_size),
        "max_batch_size must be between 1 and {}, got {}",
        MAX_BATCH_SIZE,
        max_batch_size
    );

    let mut batches = Vec::with_capacity(records.len().div_ceil(max_batch_size));
    let mut records = records.into_iter();
    let mut index = 0u32;

    loop {
        let chunk: Vec<Record> = records.by_ref().take(max_batch_size).collect();
        if chunk.is_empty() {
            break;
        }
        batches.push(Batch::new(index, chunk));
        index += 1;
    }

    batches
}

/// Number of batches [`chunk`] produces for `rows` records.
pub fn batch_count(rows: u64, max_batch_size: usize) -> u64 {
    rows.div_ceil(max_batch_size.max(1) as u64)
}
