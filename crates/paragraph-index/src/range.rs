//! Half-open text ranges.
//!
//! Every offset handed to or returned from this crate is measured in **UTF-16 code units**,
//! the unit attribute stores use for their runs. Keeping one unit everywhere means a
//! descriptor range always lines up with an attribute run boundary.

use std::fmt;
use std::ops::Range;

/// A half-open interval `[location, location + length)` in UTF-16 code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextRange {
    /// Start offset
    pub location: usize,
    /// Number of code units covered
    pub length: usize,
}

impl TextRange {
    /// Create a range from a start offset and a length.
    pub const fn new(location: usize, length: usize) -> Self {
        Self { location, length }
    }

    /// Create a zero-length range (an insertion point) at `location`.
    pub const fn empty(location: usize) -> Self {
        Self::new(location, 0)
    }

    /// Create a range from `[start, end)` bounds. An inverted pair yields an empty range at `start`.
    pub fn from_bounds(start: usize, end: usize) -> Self {
        Self::new(start, end.saturating_sub(start))
    }

    /// Exclusive end offset.
    pub const fn max(&self) -> usize {
        self.location + self.length
    }

    /// Whether the range covers no code units.
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Check if the range contains a specific position
    pub const fn contains(&self, pos: usize) -> bool {
        self.location <= pos && pos < self.max()
    }

    /// Check if two ranges share at least one code unit
    pub fn overlaps(&self, other: &TextRange) -> bool {
        self.location < other.max() && other.location < self.max()
    }

    /// Smallest range covering both `self` and `other` (and anything in between).
    pub fn union(&self, other: &TextRange) -> TextRange {
        TextRange::from_bounds(
            self.location.min(other.location),
            self.max().max(other.max()),
        )
    }

    /// Move the range by `delta` code units, keeping its length.
    ///
    /// Returns `None` if the new location would be negative or overflow.
    pub fn shifted(&self, delta: isize) -> Option<TextRange> {
        self.location
            .checked_add_signed(delta)
            .map(|location| TextRange::new(location, self.length))
    }

    /// Convert into a standard `start..end` range.
    pub fn as_range(&self) -> Range<usize> {
        self.location..self.max()
    }
}

impl From<Range<usize>> for TextRange {
    fn from(range: Range<usize>) -> Self {
        TextRange::from_bounds(range.start, range.end)
    }
}

impl From<TextRange> for Range<usize> {
    fn from(range: TextRange) -> Self {
        range.as_range()
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.location, self.max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_half_open() {
        let range = TextRange::new(5, 3);
        assert!(!range.contains(4));
        assert!(range.contains(5));
        assert!(range.contains(7));
        assert!(!range.contains(8));
        assert_eq!(range.max(), 8);
    }

    #[test]
    fn test_empty_range_contains_nothing() {
        let range = TextRange::empty(3);
        assert!(range.is_empty());
        assert!(!range.contains(3));
        assert_eq!(range.max(), 3);
    }

    #[test]
    fn test_overlaps() {
        let a = TextRange::new(0, 5);
        assert!(a.overlaps(&TextRange::new(4, 2)));
        assert!(!a.overlaps(&TextRange::new(5, 2)));
        assert!(!a.overlaps(&TextRange::empty(2)));
    }

    #[test]
    fn test_union_covers_gap() {
        let union = TextRange::new(2, 1).union(&TextRange::new(8, 2));
        assert_eq!(union, TextRange::new(2, 8));
    }

    #[test]
    fn test_shifted() {
        let range = TextRange::new(10, 4);
        assert_eq!(range.shifted(-3), Some(TextRange::new(7, 4)));
        assert_eq!(range.shifted(5), Some(TextRange::new(15, 4)));
        assert_eq!(range.shifted(-11), None);
    }

    #[test]
    fn test_conversions_and_display() {
        let range: TextRange = (3..9).into();
        assert_eq!(range, TextRange::new(3, 6));
        assert_eq!(Range::from(range), 3..9);
        assert_eq!(range.to_string(), "[3, 9)");
        assert_eq!(TextRange::from_bounds(9, 3), TextRange::empty(9));
    }
}
