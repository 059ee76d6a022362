//! The paragraph buffer: text, attributes and a live paragraph index kept in step.
//!
//! # Overview
//!
//! [`ParagraphBuffer`] owns an [`AttributeStore`], the [`DescriptorTable`] mirroring it and an
//! optional [`ParagraphObserver`]. Every edit goes through two phases:
//!
//! 1. **raw edit**: the store is mutated and the edit is recorded as pending;
//! 2. **commit**: the fix pass reconciles the table, the observer is notified, paragraph
//!    styles are re-applied and (optionally) the invariants are verified.
//!
//! [`replace_characters`](ParagraphBuffer::replace_characters) does both at once.
//! [`begin_editing`](ParagraphBuffer::begin_editing) batches several raw edits into one
//! commit.
//!
//! # Example
//!
//! ```rust
//! use paragraph_index::{ParagraphBuffer, TextRange};
//!
//! let mut buffer = ParagraphBuffer::from_text("First paragraph\nSecond paragraph").unwrap();
//! let second = buffer.paragraph_descriptor_at_index(1).unwrap();
//!
//! // Typing inside the first paragraph keeps the second one's identity.
//! buffer.replace_characters(5..5, " long").unwrap();
//! let moved = buffer.paragraph_descriptor_at_index(1).unwrap();
//! assert_eq!(moved, second);
//! assert_eq!(moved.range, TextRange::new(21, 16));
//! ```

use crate::attributes::{AttributeKey, AttributeValue, Attributes};
use crate::descriptor::{ParagraphDescriptor, ParagraphId};
use crate::error::{Missing, ParagraphError, Result};
use crate::observer::{CallbackObserver, ParagraphChange, ParagraphObserver};
use crate::options::SyncOptions;
use crate::range::TextRange;
use crate::store::{AttributeStore, EnumerationOrder, RopeStore};
use crate::sync::{PendingEdit, SubstringConsistency, SyncReport, Synchronizer, paragraph_ranges};
use crate::table::DescriptorTable;
use crate::text::{PARAGRAPH_SEPARATOR, utf16_len};
use std::fmt;
use tracing::{error, trace};

/// A text buffer with a live, paragraph-granular descriptor index.
pub struct ParagraphBuffer<S: AttributeStore = RopeStore> {
    store: S,
    table: DescriptorTable,
    observer: Option<Box<dyn ParagraphObserver + Send>>,
    pending: Option<PendingEdit>,
    options: SyncOptions,
}

impl ParagraphBuffer<RopeStore> {
    /// Create an empty buffer with default options
    pub fn new() -> Self {
        Self::with_options(SyncOptions::default())
    }

    /// Create an empty buffer
    pub fn with_options(options: SyncOptions) -> Self {
        Self {
            store: RopeStore::new(),
            table: DescriptorTable::new(),
            observer: None,
            pending: None,
            options,
        }
    }

    /// Create a buffer holding `text`, indexed and tagged.
    pub fn from_text(text: &str) -> Result<Self> {
        Self::with_store(RopeStore::from_text(text), SyncOptions::default())
    }
}

impl Default for ParagraphBuffer<RopeStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: AttributeStore + fmt::Debug> fmt::Debug for ParagraphBuffer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParagraphBuffer")
            .field("store", &self.store)
            .field("table", &self.table)
            .field("has_observer", &self.observer.is_some())
            .field("pending", &self.pending)
            .field("options", &self.options)
            .finish()
    }
}

impl<S: AttributeStore> ParagraphBuffer<S> {
    /// Wrap an existing store, indexing whatever text it already holds.
    pub fn with_store(store: S, options: SyncOptions) -> Result<Self> {
        let len = store.len();
        let mut buffer = Self {
            store,
            table: DescriptorTable::new(),
            observer: None,
            pending: None,
            options,
        };

        if len > 0 {
            buffer.pending = Some(PendingEdit::new(TextRange::empty(0), String::new(), len));
            buffer.commit_edit()?;
        }
        Ok(buffer)
    }

    /// Install `observer`, replacing any previous observer or subscription.
    pub fn set_observer<O>(&mut self, observer: O)
    where
        O: ParagraphObserver + Send + 'static,
    {
        self.observer = Some(Box::new(observer));
    }

    /// Remove and return the current observer.
    pub fn clear_observer(&mut self) -> Option<Box<dyn ParagraphObserver + Send>> {
        self.observer.take()
    }

    /// Receive every paragraph change through `callback`.
    ///
    /// The callback takes the observer slot: it replaces any observer set before and is
    /// replaced by any set after.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&ParagraphChange) + Send + 'static,
    {
        self.set_observer(CallbackObserver::new(Box::new(callback)));
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The descriptor table.
    pub fn table(&self) -> &DescriptorTable {
        &self.table
    }

    /// Options in effect.
    pub fn options(&self) -> SyncOptions {
        self.options
    }

    /// Get complete text
    pub fn text(&self) -> String {
        self.store.substring(TextRange::new(0, self.store.len()))
    }

    /// Length in UTF-16 code units.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether the buffer holds no text.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Text in `range`.
    pub fn substring(&self, range: impl Into<TextRange>) -> Result<String> {
        let range = range.into();
        self.validate_range(range)?;
        Ok(self.store.substring(range))
    }

    /// All descriptors in buffer order.
    pub fn paragraph_descriptors(&self) -> &[ParagraphDescriptor] {
        self.table.as_slice()
    }

    /// Number of paragraphs.
    pub fn paragraph_count(&self) -> usize {
        self.table.len()
    }

    /// Descriptor at `index`.
    pub fn paragraph_descriptor_at_index(&self, index: usize) -> Result<ParagraphDescriptor> {
        self.table.by_index(index).copied()
    }

    /// Descriptor of the paragraph holding the character at `offset`.
    ///
    /// Offset 0 and the end of the buffer always resolve, to the first and last paragraph.
    pub fn paragraph_descriptor_at_offset(&self, offset: usize) -> Result<ParagraphDescriptor> {
        self.validate_offset(offset)?;
        self.table.resolve_offset(offset, &self.store)
    }

    /// Descriptors holding the first or the last character of `range`.
    pub fn paragraph_descriptors_in(
        &self,
        range: impl Into<TextRange>,
    ) -> Result<Vec<ParagraphDescriptor>> {
        let range = range.into();
        self.validate_range(range)?;
        Ok(self.table.by_range(range, self.store.len()))
    }

    /// Descriptor with identifier `id`, if the paragraph still exists.
    pub fn paragraph_descriptor_with_id(&self, id: ParagraphId) -> Option<ParagraphDescriptor> {
        self.table.by_identifier(id).copied()
    }

    /// Position of `descriptor` in the table.
    pub fn index_of(&self, descriptor: &ParagraphDescriptor) -> Result<usize> {
        self.table.index_of(descriptor)
    }

    /// Current text of the paragraph with identifier `id`, separator included.
    pub fn paragraph_text(&self, id: ParagraphId) -> Result<String> {
        let descriptor = self
            .table
            .by_identifier(id)
            .ok_or(ParagraphError::NotFound(Missing::Paragraph(id)))?;
        Ok(self.store.substring(descriptor.range))
    }

    /// Ranges of the whole paragraphs touched by `range`, computed from the text alone.
    pub fn substring_paragraph_ranges(
        &self,
        range: impl Into<TextRange>,
        consistency: SubstringConsistency,
    ) -> Result<Vec<TextRange>> {
        let range = range.into();
        self.validate_range(range)?;
        Ok(paragraph_ranges(&self.store, range, consistency))
    }

    /// Value of `key` at `at`.
    pub fn attribute(&self, key: &AttributeKey, at: usize) -> Option<AttributeValue> {
        self.store.attribute(key, at)
    }

    /// Attributes of the character at `location`.
    ///
    /// The end of a non-empty buffer reads the last character; an empty buffer has no
    /// attributes.
    pub fn attributes_at(&self, location: usize) -> Result<Attributes> {
        self.validate_offset(location)?;
        let len = self.store.len();
        if len == 0 {
            return Ok(Attributes::new());
        }
        Ok(self.store.attributes_at(location.min(len - 1)))
    }

    /// Whether raw edits are waiting for a commit.
    pub fn has_pending_edit(&self) -> bool {
        self.pending.is_some()
    }

    /// Set `attributes` on every paragraph overlapping `range`, across each paragraph's full
    /// range, keeping the identity tag.
    ///
    /// While raw edits are pending the attributes are written to `range` as given, and the
    /// range is folded into the pending edit so the next commit re-tags it.
    pub fn set_attributes(
        &mut self,
        attributes: Attributes,
        range: impl Into<TextRange>,
    ) -> Result<()> {
        let range = range.into();
        self.validate_range(range)?;

        if let Some(pending) = self.pending.as_mut() {
            pending.absorb(range, range.length, &self.store);
            self.store.set_attributes(attributes, range);
            return Ok(());
        }

        let descriptors = self.table.overlapping(range, self.store.len());
        if descriptors.is_empty() {
            return Err(ParagraphError::NotFound(Missing::Range(range)));
        }

        for descriptor in descriptors {
            let mut tagged = attributes.clone();
            tagged.insert(
                AttributeKey::IDENTIFIER,
                AttributeValue::Paragraph(descriptor.identifier()),
            );
            self.store.set_attributes(tagged, descriptor.range);
        }
        Ok(())
    }

    /// Replace `range` with `text` in the store and record the edit, without touching the
    /// table. Call [`commit_edit`](Self::commit_edit) to bring the table back in step.
    pub fn apply_raw_edit(&mut self, range: impl Into<TextRange>, text: &str) -> Result<()> {
        let range = range.into();
        self.validate_range(range)?;

        let inserted = utf16_len(text);
        match self.pending.as_mut() {
            Some(pending) => pending.absorb(range, inserted, &self.store),
            None => {
                let before_text = self.store.substring(range);
                self.pending = Some(PendingEdit::new(range, before_text, inserted));
            }
        }
        self.store.replace(range, text);

        trace!(%range, inserted, "raw edit applied");
        Ok(())
    }

    /// Run the fix pass over the pending edits, if any.
    ///
    /// Afterwards the style pass runs over the edited region and, when enabled, the
    /// invariants are checked.
    pub fn commit_edit(&mut self) -> Result<Option<SyncReport>> {
        let Some(pending) = self.pending.take() else {
            return Ok(None);
        };

        let report = Synchronizer {
            table: &mut self.table,
            store: &mut self.store,
            observer: &mut self.observer,
        }
        .run(pending)?;

        if self.options.runs_style_pass() && !report.region.is_empty() {
            self.apply_paragraph_styles(report.region)?;
        }
        if self.options.verifies_invariants() {
            self.check_invariants()?;
        }
        Ok(Some(report))
    }

    /// Replace `range` with `text` and commit.
    pub fn replace_characters(
        &mut self,
        range: impl Into<TextRange>,
        text: &str,
    ) -> Result<Option<SyncReport>> {
        self.apply_raw_edit(range, text)?;
        self.commit_edit()
    }

    /// Open an editing transaction. All edits made through the scope are committed together
    /// when it is committed or dropped.
    pub fn begin_editing(&mut self) -> EditingScope<'_, S> {
        EditingScope {
            buffer: self,
            committed: false,
        }
    }

    /// Ask the observer for a style for every paragraph touching `region` and apply it.
    fn apply_paragraph_styles(&mut self, region: TextRange) -> Result<()> {
        if self.observer.is_none() {
            return Ok(());
        }

        for descriptor in self.table.overlapping(region, self.store.len()) {
            if descriptor.range.is_empty() {
                continue;
            }
            let style = self
                .observer
                .as_mut()
                .and_then(|observer| observer.style_for_paragraph(&descriptor));
            if let Some(attributes) = style {
                trace!(id = %descriptor.identifier(), range = %descriptor.range, "paragraph style applied");
                self.set_attributes(attributes, descriptor.range)?;
            }
        }
        Ok(())
    }

    /// Verify that the table mirrors the buffer.
    ///
    /// Checks contiguous coverage, that every paragraph but the last ends with its only
    /// separator, that the last has none, and that the identity tags line up with the
    /// descriptor ranges.
    pub fn check_invariants(&self) -> Result<()> {
        let len = self.store.len();
        self.table.check_coverage(len)?;

        let last_index = self.table.len() - 1;
        for (index, descriptor) in self.table.iter().enumerate() {
            let text = self.store.substring(descriptor.range);
            let separators = text.matches(PARAGRAPH_SEPARATOR).count();
            let well_formed = if index < last_index {
                separators == 1 && text.ends_with(PARAGRAPH_SEPARATOR)
            } else {
                separators == 0
            };
            if !well_formed {
                return Err(ParagraphError::invariant(format!(
                    "paragraph {index} at {} has text {text:?}",
                    descriptor.range
                )));
            }
        }

        let tags = self.store.enumerate_attribute(
            &AttributeKey::IDENTIFIER,
            TextRange::new(0, len),
            EnumerationOrder::Forward,
        );
        let expected: Vec<(Option<AttributeValue>, TextRange)> = self
            .table
            .iter()
            .filter(|d| !d.range.is_empty())
            .map(|d| (Some(AttributeValue::Paragraph(d.identifier())), d.range))
            .collect();
        if tags != expected {
            return Err(ParagraphError::invariant(format!(
                "identity tags {tags:?} do not match paragraphs {expected:?}"
            )));
        }
        Ok(())
    }

    fn validate_offset(&self, offset: usize) -> Result<()> {
        let len = self.store.len();
        if offset > len {
            return Err(ParagraphError::OutOfRange {
                range: TextRange::empty(offset),
                len,
            });
        }
        if !self.store.is_boundary(offset) {
            return Err(ParagraphError::NotCharBoundary(offset));
        }
        Ok(())
    }

    fn validate_range(&self, range: TextRange) -> Result<()> {
        let len = self.store.len();
        if range.max() > len {
            return Err(ParagraphError::OutOfRange { range, len });
        }
        for offset in [range.location, range.max()] {
            if !self.store.is_boundary(offset) {
                return Err(ParagraphError::NotCharBoundary(offset));
            }
        }
        Ok(())
    }
}

/// An editing transaction over a [`ParagraphBuffer`].
///
/// Raw edits made through the scope accumulate into a single pending edit. The fix pass runs
/// once, on [`commit`](Self::commit) or when the scope is dropped. A failing commit on drop
/// is logged, since `Drop` cannot return it.
///
/// ```rust
/// use paragraph_index::ParagraphBuffer;
///
/// let mut buffer = ParagraphBuffer::from_text("alpha\nbeta").unwrap();
/// let mut scope = buffer.begin_editing();
/// scope.insert(0, "# ").unwrap();
/// scope.insert(8, "## ").unwrap();
/// let report = scope.commit().unwrap().unwrap();
///
/// assert_eq!(report.added, 0);
/// assert_eq!(buffer.text(), "# alpha\n## beta");
/// ```
pub struct EditingScope<'a, S: AttributeStore = RopeStore> {
    buffer: &'a mut ParagraphBuffer<S>,
    committed: bool,
}

impl<S: AttributeStore> EditingScope<'_, S> {
    /// Replace `range` with `text`.
    pub fn replace_characters(&mut self, range: impl Into<TextRange>, text: &str) -> Result<()> {
        self.buffer.apply_raw_edit(range, text)
    }

    /// Insert `text` at `offset`.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<()> {
        self.buffer.apply_raw_edit(TextRange::empty(offset), text)
    }

    /// Delete the characters in `range`.
    pub fn delete(&mut self, range: impl Into<TextRange>) -> Result<()> {
        self.buffer.apply_raw_edit(range, "")
    }

    /// Set attributes; see [`ParagraphBuffer::set_attributes`].
    pub fn set_attributes(
        &mut self,
        attributes: Attributes,
        range: impl Into<TextRange>,
    ) -> Result<()> {
        self.buffer.set_attributes(attributes, range)
    }

    /// The buffer as it currently stands. The table is stale until the scope commits.
    pub fn buffer(&self) -> &ParagraphBuffer<S> {
        &*self.buffer
    }

    /// Commit the transaction.
    pub fn commit(mut self) -> Result<Option<SyncReport>> {
        self.committed = true;
        self.buffer.commit_edit()
    }
}

impl<S: AttributeStore> Drop for EditingScope<'_, S> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(err) = self.buffer.commit_edit() {
            error!(%err, "implicit commit of editing scope failed");
        }
    }
}
