//! Paragraph change notifications.
//!
//! A buffer holds at most one observer. It is told about every descriptor the fix pass
//! creates, reshapes or is about to remove, and it supplies the paragraph styles the style
//! pass applies after each commit.
//!
//! # Example
//!
//! ```rust
//! use paragraph_index::{ParagraphBuffer, ParagraphChangeKind};
//! use std::sync::{Arc, Mutex};
//!
//! let mut buffer = ParagraphBuffer::new();
//! let added = Arc::new(Mutex::new(0));
//! let added_clone = added.clone();
//!
//! buffer.subscribe(move |change| {
//!     if change.kind == ParagraphChangeKind::Added {
//!         *added_clone.lock().unwrap() += 1;
//!     }
//! });
//!
//! buffer.replace_characters(0..0, "one\ntwo\nthree").unwrap();
//! assert_eq!(*added.lock().unwrap(), 2);
//! ```

use crate::attributes::Attributes;
use crate::descriptor::ParagraphDescriptor;
use crate::table::DescriptorTable;

/// Host callbacks driven by the fix pass.
///
/// Every method has a no-op default. Notifications receive the table as it stands at the
/// moment of the call: `paragraph_will_delete` still sees the doomed descriptor, while
/// `paragraph_edited` and `paragraph_added` already see the new range. Descriptors after the
/// touched region are only relocated once the pass finishes, so their ranges may be stale
/// inside a notification.
pub trait ParagraphObserver {
    /// A paragraph was created.
    fn paragraph_added(&mut self, table: &DescriptorTable, descriptor: &ParagraphDescriptor) {
        let _ = (table, descriptor);
    }

    /// A paragraph is about to be removed.
    fn paragraph_will_delete(
        &mut self,
        table: &DescriptorTable,
        descriptor: &ParagraphDescriptor,
    ) {
        let _ = (table, descriptor);
    }

    /// A paragraph kept its identifier but its range changed or its text was edited.
    fn paragraph_edited(&mut self, table: &DescriptorTable, descriptor: &ParagraphDescriptor) {
        let _ = (table, descriptor);
    }

    /// Attributes to apply across the whole paragraph after a commit, if any.
    fn style_for_paragraph(&mut self, descriptor: &ParagraphDescriptor) -> Option<Attributes> {
        let _ = descriptor;
        None
    }
}

/// Kind of paragraph change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParagraphChangeKind {
    /// Paragraph created
    Added,
    /// Paragraph about to be removed
    WillDelete,
    /// Paragraph reshaped in place
    Edited,
}

/// A single paragraph change, as delivered to [`ParagraphBuffer::subscribe`] callbacks.
///
/// [`ParagraphBuffer::subscribe`]: crate::ParagraphBuffer::subscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParagraphChange {
    /// What happened
    pub kind: ParagraphChangeKind,
    /// The descriptor concerned
    pub descriptor: ParagraphDescriptor,
    /// Its index in the table at notification time
    pub index: usize,
}

/// Paragraph change callback function type
pub type ParagraphChangeCallback = Box<dyn FnMut(&ParagraphChange) + Send>;

/// Observer adapter forwarding every notification to a closure.
pub(crate) struct CallbackObserver {
    callback: ParagraphChangeCallback,
}

impl CallbackObserver {
    pub(crate) fn new(callback: ParagraphChangeCallback) -> Self {
        Self { callback }
    }

    fn notify(
        &mut self,
        kind: ParagraphChangeKind,
        table: &DescriptorTable,
        descriptor: &ParagraphDescriptor,
    ) {
        // The descriptor is always in the table while notifications are delivered.
        let Ok(index) = table.index_of(descriptor) else {
            return;
        };
        (self.callback)(&ParagraphChange {
            kind,
            descriptor: *descriptor,
            index,
        });
    }
}

impl ParagraphObserver for CallbackObserver {
    fn paragraph_added(&mut self, table: &DescriptorTable, descriptor: &ParagraphDescriptor) {
        self.notify(ParagraphChangeKind::Added, table, descriptor);
    }

    fn paragraph_will_delete(
        &mut self,
        table: &DescriptorTable,
        descriptor: &ParagraphDescriptor,
    ) {
        self.notify(ParagraphChangeKind::WillDelete, table, descriptor);
    }

    fn paragraph_edited(&mut self, table: &DescriptorTable, descriptor: &ParagraphDescriptor) {
        self.notify(ParagraphChangeKind::Edited, table, descriptor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::TextRange;
    use std::sync::{Arc, Mutex};

    struct Silent;

    impl ParagraphObserver for Silent {}

    #[test]
    fn test_default_methods_are_no_ops() {
        let table = DescriptorTable::new();
        let descriptor = *table.first();
        let mut observer = Silent;

        observer.paragraph_added(&table, &descriptor);
        observer.paragraph_will_delete(&table, &descriptor);
        observer.paragraph_edited(&table, &descriptor);
        assert_eq!(observer.style_for_paragraph(&descriptor), None);
    }

    #[test]
    fn test_callback_observer_reports_index() {
        let table = DescriptorTable::new();
        let descriptor = *table.first();
        let changes = Arc::new(Mutex::new(Vec::new()));
        let changes_clone = changes.clone();

        let mut observer = CallbackObserver::new(Box::new(move |change: &ParagraphChange| {
            changes_clone.lock().unwrap().push(*change);
        }));
        observer.paragraph_edited(&table, &descriptor);
        observer.paragraph_will_delete(&table, &descriptor);

        let changes = changes.lock().unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].kind, ParagraphChangeKind::Edited);
        assert_eq!(changes[0].index, 0);
        assert_eq!(changes[0].descriptor.range, TextRange::empty(0));
        assert_eq!(changes[1].kind, ParagraphChangeKind::WillDelete);
    }

    #[test]
    fn test_callback_observer_ignores_unknown_descriptor() {
        let table = DescriptorTable::new();
        let stranger = ParagraphDescriptor::new(TextRange::empty(0));
        let calls = Arc::new(Mutex::new(0));
        let calls_clone = calls.clone();

        let mut observer = CallbackObserver::new(Box::new(move |_change: &ParagraphChange| {
            *calls_clone.lock().unwrap() += 1;
        }));
        observer.paragraph_added(&table, &stranger);

        assert_eq!(*calls.lock().unwrap(), 0);
    }
}
