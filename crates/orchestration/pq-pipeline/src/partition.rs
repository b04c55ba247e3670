//! Row range partitioning.

use pq_types::RowRange;

/// Splits `[0, total_rows)` into consecutive ranges of `rows_per_worker` rows.
///
/// Produces `ceil(total_rows / rows_per_worker)` ranges; only the last one
/// may be shorter. Zero rows yield no ranges.
///
/// # Panics
///
/// Panics if `rows_per_worker` is zero. Configuration is validated before a
/// run starts, so reaching this is a programming error.
pub fn partition(total_rows: u64, rows_per_worker: u64) -> Vec<RowRange> {
    assert!(rows_per_worker >= 1, "rows_per_worker must be at least 1");

    let count = total_rows.div_ceil(rows_per_worker);
    (0..count)
        .filter_map(|i| {
            let start = i * rows_per_worker;
            let end = start.saturating_add(rows_per_worker).min(total_rows);
            RowRange::new(start, end)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(ranges: &[RowRange]) -> Vec<(u64, u64)> {
        ranges.iter().map(|r| (r.start, r.end)).collect()
    }

    #[test]
    fn test_uneven_split() {
        let ranges = partition(95, 40);
        assert_eq!(bounds(&ranges), vec![(0, 40), (40, 80), (80, 95)]);
    }

    #[test]
    fn test_even_split() {
        let ranges = partition(10_000, 2_500);
        assert_eq!(ranges.len(), 4);
        assert!(ranges.iter().all(|r| r.len() == 2_500));
    }

    #[test]
    fn test_zero_rows() {
        assert!(partition(0, 40).is_empty());
    }

    #[test]
    fn test_fewer_rows_than_worker_size() {
        assert_eq!(bounds(&partition(7, 40)), vec![(0, 7)]);
    }

    #[test]
    fn test_coverage_is_exact() {
        for total in [0u64, 1, 9, 10, 11, 99, 100, 101, 1_234] {
            for per_worker in [1u64, 3, 10, 40, 1_000] {
                let ranges = partition(total, per_worker);

                let mut next = 0;
                for range in &ranges {
                    assert_eq!(range.start, next, "gap or overlap at {}", range);
                    assert!(range.len() >= 1 && range.len() <= per_worker);
                    next = range.end;
                }
                assert_eq!(next, total);
                assert_eq!(ranges.len() as u64, total.div_ceil(per_worker));
            }
        }
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(partition(1_001, 7), partition(1_001, 7));
    }

    #[test]
    fn test_no_overflow_near_max() {
        let ranges = partition(u64::MAX, u64::MAX / 2 + 1);
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[1].end, u64::MAX);
    }

    #[test]
    #[should_panic(expected = "rows_per_worker must be at least 1")]
    fn test_zero_rows_per_worker_panics() {
        partition(10, 0);
    }
}
