#![warn(missing_docs)]
//! Paragraph Index - Live Paragraph Descriptors over a Mutable Text Buffer
//!
//! # Overview
//!
//! `paragraph-index` keeps an ordered table of paragraph descriptors in step with an
//! attributed text buffer. Every paragraph gets a stable identifier that survives edits
//! inside it, and a range that always reflects the current text. The table is repaired
//! incrementally after each edit; it is never rebuilt from scratch.
//!
//! Hosts use it to attach per-paragraph state (styles, syntax state, layout caches) that
//! should follow a paragraph as the text around it changes.
//!
//! # Core Features
//!
//! - **Stable Identity**: edits inside a paragraph keep its identifier
//! - **Incremental Repair**: cost proportional to the touched paragraphs plus those after them
//! - **Identity Tags**: every character carries its paragraph's identifier as an attribute
//! - **Change Notifications**: added / will delete / edited callbacks per paragraph
//! - **Paragraph Styles**: styles are re-applied to whole paragraphs after each commit
//! - **Batched Edits**: several raw edits reconciled by a single fix pass
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  ParagraphBuffer / EditingScope             │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Synchronizer (fix pass) + Observer         │  ← Reconciliation
//! ├─────────────────────────────────────────────┤
//! │  DescriptorTable                            │  ← Paragraph Index
//! ├─────────────────────────────────────────────┤
//! │  AttributeStore (RopeStore)                 │  ← Text + Attribute Runs
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use paragraph_index::{ParagraphBuffer, TextRange};
//!
//! let mut buffer = ParagraphBuffer::new();
//! buffer.replace_characters(0..0, "First paragraph\nSecond paragraph").unwrap();
//!
//! let ranges: Vec<TextRange> = buffer
//!     .paragraph_descriptors()
//!     .iter()
//!     .map(|d| d.range)
//!     .collect();
//! assert_eq!(ranges, vec![TextRange::new(0, 16), TextRange::new(16, 16)]);
//!
//! let second = buffer.paragraph_descriptor_at_offset(20).unwrap();
//! assert_eq!(buffer.index_of(&second).unwrap(), 1);
//! ```
//!
//! # Module Description
//!
//! - [`buffer`] - The host-facing buffer and editing transactions
//! - [`sync`] - The fix pass and paragraph range queries
//! - [`table`] - The descriptor table and its lookups
//! - [`store`] - Text and attribute storage
//! - [`observer`] - Change notifications and paragraph styles
//!
//! # Unicode Support
//!
//! - All offsets are UTF-16 code units
//! - Edits splitting a surrogate pair are rejected
//! - Only `'\n'` separates paragraphs; `"\r\n"` keeps its `'\r'` in the paragraph text

pub mod attributes;
pub mod buffer;
pub mod descriptor;
pub mod error;
pub mod observer;
pub mod options;
pub mod range;
pub mod store;
pub mod sync;
pub mod table;
pub mod text;

pub use attributes::{AttributeKey, AttributeValue, Attributes, StyleId};
pub use buffer::{EditingScope, ParagraphBuffer};
pub use descriptor::{ParagraphDescriptor, ParagraphId};
pub use error::{Missing, ParagraphError, Result};
pub use observer::{
    ParagraphChange, ParagraphChangeCallback, ParagraphChangeKind, ParagraphObserver,
};
pub use options::SyncOptions;
pub use range::TextRange;
pub use store::{AttributeStore, EnumerationOrder, RopeStore};
pub use sync::{SubstringConsistency, SyncReport};
pub use table::DescriptorTable;
pub use text::{paragraph_count, split_paragraphs, utf16_len};
