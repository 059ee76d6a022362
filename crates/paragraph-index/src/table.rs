//! The descriptor table: an ordered list of paragraph descriptors mirroring the buffer.
//!
//! After every completed fix pass the table holds at least one descriptor and the descriptor
//! ranges partition `[0, buffer length)` contiguously, in buffer order. Lookups rely on that
//! ordering and use binary search.

use crate::attributes::AttributeKey;
use crate::descriptor::{ParagraphDescriptor, ParagraphId};
use crate::error::{Missing, ParagraphError, Result};
use crate::range::TextRange;
use crate::store::AttributeStore;
use tracing::warn;

/// Ordered, non-empty sequence of paragraph descriptors.
#[derive(Debug, Clone)]
pub struct DescriptorTable {
    descriptors: Vec<ParagraphDescriptor>,
}

impl DescriptorTable {
    /// A table for an empty buffer: one descriptor covering `[0, 0)`.
    pub fn new() -> Self {
        Self {
            descriptors: vec![ParagraphDescriptor::new(TextRange::empty(0))],
        }
    }

    /// Number of descriptors (always at least one).
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Always `false`; present for API symmetry with [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// All descriptors in buffer order.
    pub fn as_slice(&self) -> &[ParagraphDescriptor] {
        &self.descriptors
    }

    /// Iterate descriptors in buffer order.
    pub fn iter(&self) -> std::slice::Iter<'_, ParagraphDescriptor> {
        self.descriptors.iter()
    }

    /// The first paragraph.
    pub fn first(&self) -> &ParagraphDescriptor {
        &self.descriptors[0]
    }

    /// The last paragraph.
    pub fn last(&self) -> &ParagraphDescriptor {
        &self.descriptors[self.descriptors.len() - 1]
    }

    /// Descriptor at `index`.
    pub fn by_index(&self, index: usize) -> Result<&ParagraphDescriptor> {
        self.descriptors
            .get(index)
            .ok_or(ParagraphError::IndexOutOfRange {
                index,
                count: self.descriptors.len(),
            })
    }

    /// Descriptor with the given identifier (linear scan).
    pub fn by_identifier(&self, id: ParagraphId) -> Option<&ParagraphDescriptor> {
        self.descriptors.iter().find(|d| d.identifier() == id)
    }

    /// Position of `descriptor`, matched by identity.
    pub fn index_of(&self, descriptor: &ParagraphDescriptor) -> Result<usize> {
        self.index_of_id(descriptor.identifier())
    }

    /// Position of the descriptor with identifier `id`.
    pub fn index_of_id(&self, id: ParagraphId) -> Result<usize> {
        self.descriptors
            .iter()
            .position(|d| d.identifier() == id)
            .ok_or(ParagraphError::NotFound(Missing::Paragraph(id)))
    }

    /// Index of the descriptor whose range contains `pos`.
    fn containing_index(&self, pos: usize) -> Option<usize> {
        let idx = self.descriptors.partition_point(|d| d.range.max() <= pos);
        (idx < self.descriptors.len() && self.descriptors[idx].range.contains(pos)).then_some(idx)
    }

    /// The descriptor whose range contains `pos`, if any.
    pub fn containing(&self, pos: usize) -> Option<&ParagraphDescriptor> {
        self.containing_index(pos).map(|idx| &self.descriptors[idx])
    }

    /// Descriptor for a character offset, using the table alone.
    ///
    /// Offset 0 (and an empty buffer) resolve to the first paragraph; the end of the buffer
    /// resolves to the last paragraph, even when it is empty.
    pub fn at_offset(&self, pos: usize, buffer_len: usize) -> Option<&ParagraphDescriptor> {
        if pos == 0 {
            return Some(self.first());
        }

        let last = self.last();
        if (pos == buffer_len && last.range.max() == buffer_len) || pos == last.range.max() {
            return Some(last);
        }

        self.containing(pos)
    }

    /// Descriptor for a character offset, falling back to the identity tag stored at `pos`.
    pub fn resolve_offset<S>(&self, pos: usize, store: &S) -> Result<ParagraphDescriptor>
    where
        S: AttributeStore + ?Sized,
    {
        if let Some(descriptor) = self.at_offset(pos, store.len()) {
            return Ok(*descriptor);
        }

        warn!(pos, "no descriptor range covers offset, resolving by identity tag");
        store
            .attribute(&AttributeKey::IDENTIFIER, pos)
            .and_then(|value| value.as_paragraph())
            .and_then(|id| self.by_identifier(id))
            .copied()
            .ok_or(ParagraphError::NotFound(Missing::Offset(pos)))
    }

    /// Descriptors containing the first or the last position of `range`.
    ///
    /// If neither end is covered: the last paragraph when `range` starts at the end of the
    /// buffer (or at 0 in a single-paragraph table), otherwise every paragraph starting
    /// exactly at `range.location`, possibly none.
    pub fn by_range(&self, range: TextRange, buffer_len: usize) -> Vec<ParagraphDescriptor> {
        if buffer_len == 0 && range.max() == 0 {
            return vec![*self.first()];
        }

        let mut indices: Vec<usize> = self.containing_index(range.location).into_iter().collect();
        if let Some(idx) = range
            .max()
            .checked_sub(1)
            .and_then(|last| self.containing_index(last))
        {
            indices.push(idx);
        }
        indices.sort_unstable();
        indices.dedup();

        if indices.is_empty() {
            return self.fallback_for(range, buffer_len);
        }
        indices.into_iter().map(|idx| self.descriptors[idx]).collect()
    }

    /// Every descriptor sharing at least one position with `range`.
    ///
    /// Unlike [`by_range`](Self::by_range), paragraphs strictly inside a multi-paragraph
    /// range are included. Empty ranges behave like [`by_range`](Self::by_range).
    pub fn overlapping(&self, range: TextRange, buffer_len: usize) -> Vec<ParagraphDescriptor> {
        if range.is_empty() {
            return self.by_range(range, buffer_len);
        }

        match (
            self.containing_index(range.location),
            self.containing_index(range.max() - 1),
        ) {
            (Some(first), Some(last)) => self.descriptors[first..=last].to_vec(),
            _ => self.by_range(range, buffer_len),
        }
    }

    fn fallback_for(&self, range: TextRange, buffer_len: usize) -> Vec<ParagraphDescriptor> {
        if range.location == buffer_len || (range.location == 0 && self.descriptors.len() == 1) {
            return vec![*self.last()];
        }
        self.descriptors
            .iter()
            .filter(|d| d.range.location == range.location)
            .copied()
            .collect()
    }

    pub(crate) fn insert(&mut self, index: usize, descriptor: ParagraphDescriptor) -> Result<()> {
        if index > self.descriptors.len() {
            return Err(ParagraphError::IndexOutOfRange {
                index,
                count: self.descriptors.len(),
            });
        }
        self.descriptors.insert(index, descriptor);
        Ok(())
    }

    /// Remove the descriptor at `index`. Refused (`Ok(None)`) if it is the only one left.
    pub(crate) fn remove(&mut self, index: usize) -> Result<Option<ParagraphDescriptor>> {
        self.by_index(index)?;
        if self.descriptors.len() == 1 {
            return Ok(None);
        }
        Ok(Some(self.descriptors.remove(index)))
    }

    /// Give the descriptor at `index` a new range, returning the old one.
    pub(crate) fn set_range(&mut self, index: usize, range: TextRange) -> Result<TextRange> {
        let count = self.descriptors.len();
        let descriptor = self
            .descriptors
            .get_mut(index)
            .ok_or(ParagraphError::IndexOutOfRange { index, count })?;
        Ok(std::mem::replace(&mut descriptor.range, range))
    }

    /// Shift every descriptor after `start` by `delta`, skipping those already contiguous
    /// with their predecessor.
    pub(crate) fn relocate_from(&mut self, start: usize, delta: isize) -> Result<()> {
        if delta == 0 || start + 1 >= self.descriptors.len() {
            return Ok(());
        }

        let mut previous_end = self.descriptors[start].range.max();
        for descriptor in &mut self.descriptors[start + 1..] {
            if descriptor.range.location != previous_end {
                descriptor.range = descriptor.range.shifted(delta).ok_or_else(|| {
                    ParagraphError::invariant(format!(
                        "relocating {} by {delta} moves it before the buffer start",
                        descriptor.range
                    ))
                })?;
            }
            previous_end = descriptor.range.max();
        }
        Ok(())
    }

    /// Verify the table partitions `[0, buffer_len)` contiguously.
    pub fn check_coverage(&self, buffer_len: usize) -> Result<()> {
        if self.descriptors.is_empty() {
            return Err(ParagraphError::invariant("descriptor table is empty"));
        }

        let mut expected = 0;
        for (index, descriptor) in self.descriptors.iter().enumerate() {
            if descriptor.range.location != expected {
                return Err(ParagraphError::invariant(format!(
                    "paragraph {index} starts at {} but the previous one ends at {expected}",
                    descriptor.range.location
                )));
            }
            expected = descriptor.range.max();
        }

        if expected != buffer_len {
            return Err(ParagraphError::invariant(format!(
                "paragraphs end at {expected} but the buffer length is {buffer_len}"
            )));
        }
        Ok(())
    }
}

impl Default for DescriptorTable {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a DescriptorTable {
    type Item = &'a ParagraphDescriptor;
    type IntoIter = std::slice::Iter<'a, ParagraphDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.iter()
    }
}
