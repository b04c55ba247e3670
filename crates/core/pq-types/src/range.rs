//! Row ranges assigned to range workers.

use serde::{Deserialize, Serialize};

/// A half-open range of row indices, `[start, end)`.
///
/// A non-empty range always satisfies `end > start`. The ranges produced for
/// one file are disjoint and together cover `[0, total_rows)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowRange {
    /// First row index (inclusive)
    pub start: u64,

    /// Last row index (exclusive)
    pub end: u64,
}

impl RowRange {
    /// Creates a new range, returning `None` unless `end > start`.
    pub fn new(start: u64, end: u64) -> Option<Self> {
        (end > start).then_some(Self { start, end })
    }

    /// Number of rows in the range.
    #[inline]
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Always false for ranges built through [`RowRange::new`].
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Row offset for a limit/offset read.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.start
    }

    /// Row limit for a limit/offset read.
    #[inline]
    pub fn limit(&self) -> u64 {
        self.len()
    }

    /// Returns true if `row` falls inside this range.
    pub fn contains(&self, row: u64) -> bool {
        row >= self.start && row < self.end
    }
}

impl std::fmt::Display for RowRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
