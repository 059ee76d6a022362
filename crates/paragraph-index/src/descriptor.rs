//! Paragraph descriptors: a stable identity plus the paragraph's current range.

use crate::range::TextRange;
use std::fmt;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Globally unique paragraph identifier.
///
/// Minted once when a paragraph first appears and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParagraphId(Uuid);

impl ParagraphId {
    /// Mint a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID (e.g. one restored by the host from its own model).
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ParagraphId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ParagraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// One paragraph of the buffer: who it is and where it currently lives.
///
/// Equality and hashing look at the identifier only, so a descriptor compares equal to an
/// older copy of itself even after its range moved.
#[derive(Debug, Clone, Copy)]
pub struct ParagraphDescriptor {
    identifier: ParagraphId,
    /// Current range of the paragraph, including its trailing separator if it has one.
    pub range: TextRange,
}

impl ParagraphDescriptor {
    /// Create a descriptor with a freshly minted identifier.
    pub fn new(range: TextRange) -> Self {
        Self::with_identifier(ParagraphId::new(), range)
    }

    /// Create a descriptor with a known identifier.
    pub const fn with_identifier(identifier: ParagraphId, range: TextRange) -> Self {
        Self { identifier, range }
    }

    /// The paragraph's identifier.
    pub const fn identifier(&self) -> ParagraphId {
        self.identifier
    }
}

impl PartialEq for ParagraphDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for ParagraphDescriptor {}

impl Hash for ParagraphDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_fresh_identifiers_are_unique() {
        let a = ParagraphDescriptor::new(TextRange::empty(0));
        let b = ParagraphDescriptor::new(TextRange::empty(0));
        assert_ne!(a, b);
        assert_ne!(a.identifier(), b.identifier());
    }

    #[test]
    fn test_equality_ignores_range() {
        let id = ParagraphId::new();
        let before = ParagraphDescriptor::with_identifier(id, TextRange::new(0, 4));
        let mut after = before;
        after.range = TextRange::new(10, 1);

        assert_eq!(before, after);

        let mut set = HashSet::new();
        set.insert(before);
        assert!(set.contains(&after));
    }
}
