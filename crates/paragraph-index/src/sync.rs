//! The fix pass: reconcile the descriptor table with the buffer after an edit.
//!
//! The pass never rebuilds the table. It anchors at the paragraph containing the start of the
//! edit and works in three contiguous phases:
//!
//! 1. **delete** the paragraphs whose separators disappeared, always right after the anchor;
//! 2. **edit** the surviving paragraphs in place, keeping their identifiers;
//! 3. **insert** paragraphs for separators that appeared, with fresh identifiers.
//!
//! Every descriptor after the touched region is then shifted by the accumulated length delta.
//! The cost is proportional to the paragraphs touched by the edit plus the descriptors after
//! them.

use crate::attributes::{AttributeKey, AttributeValue};
use crate::descriptor::ParagraphDescriptor;
use crate::error::{ParagraphError, Result};
use crate::observer::ParagraphObserver;
use crate::range::TextRange;
use crate::store::AttributeStore;
use crate::table::DescriptorTable;
use crate::text::{paragraph_count, split_paragraphs, utf16_len};
use tracing::{debug, trace, warn};

/// How [`paragraph_ranges`] treats a zero-length paragraph at the end of the result.
///
/// Such a paragraph appears whenever the queried text ends with a separator. It only
/// matters when it is *not* the buffer's real last paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubstringConsistency {
    /// Leave the ranges as computed.
    #[default]
    Exact,
    /// Drop an interior zero-length trailing paragraph.
    DropTrailingEmptyParagraph,
    /// Replace an interior zero-length trailing paragraph with the paragraph that starts
    /// there, found by querying one character further.
    IncludeTrailingEmptyParagraph,
}

/// Ranges of the whole paragraphs touched by `range`.
pub(crate) fn paragraph_ranges<S>(
    store: &S,
    range: TextRange,
    consistency: SubstringConsistency,
) -> Vec<TextRange>
where
    S: AttributeStore + ?Sized,
{
    let region = store.paragraph_range(range);
    let text = store.substring(region);

    let mut location = region.location;
    let mut ranges: Vec<TextRange> = split_paragraphs(&text)
        .into_iter()
        .map(|paragraph| {
            let range = TextRange::new(location, utf16_len(paragraph));
            location = range.max();
            range
        })
        .collect();

    let Some(last) = ranges.last().copied() else {
        return ranges;
    };
    if !last.is_empty() || last.max() >= store.len() {
        return ranges;
    }

    match consistency {
        SubstringConsistency::Exact => {}
        SubstringConsistency::DropTrailingEmptyParagraph => {
            ranges.pop();
        }
        SubstringConsistency::IncludeTrailingEmptyParagraph => {
            let next = paragraph_ranges(
                store,
                TextRange::new(last.location, 1),
                SubstringConsistency::Exact,
            );
            if let (Some(slot), Some(first)) = (ranges.last_mut(), next.first()) {
                *slot = *first;
            }
        }
    }
    ranges
}

/// Raw edits waiting for a fix pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingEdit {
    /// Region covered by the edits, in current buffer coordinates.
    pub(crate) edited: TextRange,
    /// Text that occupied `edited` before the first edit of the batch.
    pub(crate) before_text: String,
}

impl PendingEdit {
    /// Start a batch with the edit replacing `range` (whose old text is `before_text`) by
    /// `inserted_len` code units.
    pub(crate) fn new(range: TextRange, before_text: String, inserted_len: usize) -> Self {
        Self {
            edited: TextRange::new(range.location, inserted_len),
            before_text,
        }
    }

    /// Fold one more edit into the batch. Must be called *before* `store` is mutated.
    ///
    /// Text between the old pending region and the new edit has not been touched since the
    /// batch started, so it is read back from `store` to extend the before-text.
    pub(crate) fn absorb<S>(&mut self, range: TextRange, inserted_len: usize, store: &S)
    where
        S: AttributeStore + ?Sized,
    {
        let union = self.edited.union(&range);

        let mut before_text = store.substring(TextRange::from_bounds(
            union.location,
            self.edited.location,
        ));
        before_text.push_str(&self.before_text);
        before_text.push_str(&store.substring(TextRange::from_bounds(
            self.edited.max(),
            union.max(),
        )));

        self.before_text = before_text;
        self.edited = TextRange::from_bounds(
            union.location,
            union.max() - range.length + inserted_len,
        );
    }
}

/// Summary of one fix pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Post-edit region that was reconciled.
    pub region: TextRange,
    /// Index of the anchor paragraph.
    pub anchor: usize,
    /// Paragraphs created.
    pub added: usize,
    /// Paragraphs removed.
    pub deleted: usize,
    /// Paragraphs reshaped in place.
    pub edited: usize,
    /// Length change applied to the paragraphs after the touched region.
    pub delta: isize,
}

/// One fix pass over borrowed buffer state.
pub(crate) struct Synchronizer<'a, S: AttributeStore + ?Sized> {
    pub(crate) table: &'a mut DescriptorTable,
    pub(crate) store: &'a mut S,
    pub(crate) observer: &'a mut Option<Box<dyn ParagraphObserver + Send>>,
}

impl<S: AttributeStore + ?Sized> Synchronizer<'_, S> {
    pub(crate) fn run(mut self, pending: PendingEdit) -> Result<SyncReport> {
        let region = pending.edited;

        // Anchor against the table as it stood before this pass.
        let anchor_descriptor = self.table.resolve_offset(region.location, &*self.store)?;
        let anchor = self.table.index_of(&anchor_descriptor)?;

        let after_ranges = paragraph_ranges(
            &*self.store,
            region,
            SubstringConsistency::IncludeTrailingEmptyParagraph,
        );
        let before_count = paragraph_count(&pending.before_text);
        let after_count = paragraph_count(&self.store.substring(region));
        if after_ranges.len() < after_count {
            return Err(ParagraphError::invariant(format!(
                "edited region {region} has {after_count} paragraphs but only {} paragraph ranges",
                after_ranges.len()
            )));
        }

        let added = after_count.saturating_sub(before_count);
        let deleted = before_count.saturating_sub(after_count);
        let edited = before_count.min(after_count);

        let mut delta: isize = 0;

        for _ in 0..deleted {
            delta -= self.delete_descriptor(anchor + 1)?;
        }

        for (offset, range) in after_ranges[..edited].iter().enumerate() {
            delta += self.edit_descriptor(anchor + offset, *range)?;
        }

        for (offset, range) in after_ranges[edited..after_count].iter().enumerate() {
            delta += self.add_descriptor(anchor + edited + offset, *range)?;
        }

        self.table.relocate_from(anchor + added, delta)?;

        debug!(
            %region,
            anchor,
            before_count,
            after_count,
            added,
            deleted,
            edited,
            delta,
            "paragraph descriptors synchronized"
        );

        Ok(SyncReport {
            region,
            anchor,
            added,
            deleted,
            edited,
            delta,
        })
    }

    /// Remove the descriptor at `index`, returning the length it covered.
    fn delete_descriptor(&mut self, index: usize) -> Result<isize> {
        let descriptor = *self.table.by_index(index)?;
        if self.table.len() <= 1 {
            warn!(%descriptor.range, "refusing to delete the only paragraph");
            return Ok(0);
        }

        if let Some(observer) = self.observer.as_mut() {
            observer.paragraph_will_delete(&*self.table, &descriptor);
        }
        self.table.remove(index)?;

        trace!(index, id = %descriptor.identifier(), range = %descriptor.range, "paragraph deleted");
        Ok(descriptor.range.length as isize)
    }

    /// Move the descriptor at `index` to `range`, returning the length change.
    fn edit_descriptor(&mut self, index: usize, range: TextRange) -> Result<isize> {
        let old = self.table.set_range(index, range)?;
        let descriptor = *self.table.by_index(index)?;
        self.tag(&descriptor);

        if let Some(observer) = self.observer.as_mut() {
            observer.paragraph_edited(&*self.table, &descriptor);
        }

        trace!(index, id = %descriptor.identifier(), from = %old, to = %range, "paragraph edited");
        Ok(range.length as isize - old.length as isize)
    }

    /// Insert a new paragraph at `index`, returning its length.
    fn add_descriptor(&mut self, index: usize, range: TextRange) -> Result<isize> {
        let descriptor = ParagraphDescriptor::new(range);
        self.table.insert(index, descriptor)?;
        self.tag(&descriptor);

        if let Some(observer) = self.observer.as_mut() {
            observer.paragraph_added(&*self.table, &descriptor);
        }

        trace!(index, id = %descriptor.identifier(), %range, "paragraph added");
        Ok(range.length as isize)
    }

    /// Stamp the identity tag over exactly the descriptor's range.
    fn tag(&mut self, descriptor: &ParagraphDescriptor) {
        self.store.add_attribute(
            AttributeKey::IDENTIFIER,
            AttributeValue::Paragraph(descriptor.identifier()),
            descriptor.range,
        );
    }
}
