//! Selection of 1-based inclusive ranges over 0-based sequences.

/// A clamped 0-based half-open slice `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionRange {
    pub start: usize,
    pub end: usize,
}

impl SelectionRange {
    /// Convert an optional 1-based inclusive request over `total` items.
    ///
    /// Missing bounds default to the first and last item. Out-of-range and
    /// inverted requests yield the empty range `(0, 0)` instead of failing.
    pub fn normalize(total: usize, start: Option<i64>, end: Option<i64>) -> Self {
        if total == 0 {
            return Self::default();
        }
        let total = i64::try_from(total).unwrap_or(i64::MAX);

        let start = start.unwrap_or(1).max(1);
        let end = end.unwrap_or(total).min(total);
        if start > end {
            return Self::default();
        }

        // Both bounds are within 1..=total here.
        Self {
            start: (start - 1) as usize,
            end: end as usize,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether the 0-based `index` falls inside the range.
    pub fn contains(&self, index: usize) -> bool {
        (self.start..self.end).contains(&index)
    }

    /// The selected sub-slice of `items`.
    pub fn select<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let end = self.end.min(items.len());
        let start = self.start.min(end);
        &items[start..end]
    }

    #[cfg(test)]
    pub(crate) fn as_tuple(&self) -> (usize, usize) {
        (self.start, self.end)
    }
}
