//! Text and attribute storage.
//!
//! [`AttributeStore`] is the boundary between the paragraph index and whatever holds the
//! characters and their attributes. The index never stores text itself; it reads and tags
//! through this trait.
//!
//! [`RopeStore`] is the bundled implementation: a [`Rope`] for the text plus a sorted vector
//! of attribute runs, queried by binary search.

use crate::attributes::{AttributeKey, AttributeValue, Attributes};
use crate::range::TextRange;
use crate::text::utf16_len;
use ropey::Rope;

/// Direction for [`AttributeStore::enumerate_attribute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumerationOrder {
    /// Front to back.
    #[default]
    Forward,
    /// Back to front.
    Reverse,
}

/// Character and attribute storage consumed by the paragraph index.
///
/// All offsets are UTF-16 code units. Callers validate ranges before calling the mutating
/// methods; implementations may assume `range.max() <= self.len()`.
pub trait AttributeStore {
    /// Length of the text.
    fn len(&self) -> usize;

    /// Whether the text is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the text in `range`.
    fn substring(&self, range: TextRange) -> String;

    /// Whether `offset` lies on a character boundary (not inside a surrogate pair).
    fn is_boundary(&self, offset: usize) -> bool;

    /// Replace the characters in `range` with `text`, without any paragraph bookkeeping.
    ///
    /// New characters take the attributes of the first replaced character; for an empty
    /// `range`, those of the preceding character, or the following one at offset 0.
    fn replace(&mut self, range: TextRange, text: &str);

    /// Value of `key` at `at`, if the character there carries it.
    fn attribute(&self, key: &AttributeKey, at: usize) -> Option<AttributeValue>;

    /// All attributes of the character at `at`.
    fn attributes_at(&self, at: usize) -> Attributes;

    /// Merge `key = value` into the attributes of every character in `range`.
    fn add_attribute(&mut self, key: AttributeKey, value: AttributeValue, range: TextRange);

    /// Replace the attributes of every character in `range` with `attributes`.
    fn set_attributes(&mut self, attributes: Attributes, range: TextRange);

    /// Runs of `key` within `range`, adjacent runs with equal values coalesced.
    ///
    /// Characters without the attribute are reported with `None`. Runs are clipped to `range`.
    fn enumerate_attribute(
        &self,
        key: &AttributeKey,
        range: TextRange,
        order: EnumerationOrder,
    ) -> Vec<(Option<AttributeValue>, TextRange)>;

    /// Expand `range` to the whole paragraphs it touches, including the last one's separator.
    ///
    /// An empty range expands to the paragraph containing it; an empty range at the end of a
    /// buffer ending with a separator expands to itself.
    fn paragraph_range(&self, range: TextRange) -> TextRange;
}

/// A maximal run of characters sharing the same attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeRun {
    /// Start offset (UTF-16 code units)
    start: usize,
    /// End offset (exclusive)
    end: usize,
    attributes: Attributes,
}

/// Rope-backed [`AttributeStore`].
///
/// Attribute runs cover `[0, len)` without gaps, are never empty, and adjacent runs always
/// differ in their attributes.
#[derive(Debug, Clone, Default)]
pub struct RopeStore {
    rope: Rope,
    runs: Vec<AttributeRun>,
}

impl RopeStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from text, with no attributes
    pub fn from_text(text: &str) -> Self {
        let rope = Rope::from_str(text);
        let len = rope.len_utf16_cu();
        let runs = if len > 0 {
            vec![AttributeRun {
                start: 0,
                end: len,
                attributes: Attributes::new(),
            }]
        } else {
            Vec::new()
        };
        Self { rope, runs }
    }

    /// The underlying rope.
    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    /// Get complete text
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Number of attribute runs (diagnostics and tests).
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    fn char_index(&self, utf16: usize) -> usize {
        self.rope
            .utf16_cu_to_char(utf16.min(self.rope.len_utf16_cu()))
    }

    fn utf16_index(&self, char_idx: usize) -> usize {
        self.rope.char_to_utf16_cu(char_idx)
    }

    /// Index of the run containing `pos`.
    fn run_index_at(&self, pos: usize) -> Option<usize> {
        let idx = self.runs.partition_point(|run| run.end <= pos);
        (idx < self.runs.len() && self.runs[idx].start <= pos).then_some(idx)
    }

    /// Split the run straddling `pos` so a run boundary falls on `pos`.
    ///
    /// Returns the index of the first run starting at or after `pos`.
    fn split_at(&mut self, pos: usize) -> usize {
        let idx = self.runs.partition_point(|run| run.end <= pos);
        if idx < self.runs.len() && self.runs[idx].start < pos {
            let mut tail = self.runs[idx].clone();
            tail.start = pos;
            self.runs[idx].end = pos;
            self.runs.insert(idx + 1, tail);
            return idx + 1;
        }
        idx
    }

    /// Merge equal neighbours among runs `lo - 1 ..= hi + 1`.
    fn coalesce(&mut self, lo: usize, hi: usize) {
        if self.runs.len() < 2 {
            return;
        }
        let mut i = lo.saturating_sub(1);
        let mut last = (hi + 1).min(self.runs.len() - 1);
        while i < last {
            if self.runs[i].attributes == self.runs[i + 1].attributes {
                self.runs[i].end = self.runs[i + 1].end;
                self.runs.remove(i + 1);
                last -= 1;
            } else {
                i += 1;
            }
        }
    }

    fn inherited_attributes(&self, range: TextRange) -> Attributes {
        let probe = if !range.is_empty() {
            Some(range.location)
        } else if range.location > 0 {
            Some(range.location - 1)
        } else if !self.runs.is_empty() {
            Some(0)
        } else {
            None
        };

        probe
            .and_then(|pos| self.run_index_at(pos))
            .map(|idx| self.runs[idx].attributes.clone())
            .unwrap_or_default()
    }
}

impl AttributeStore for RopeStore {
    fn len(&self) -> usize {
        self.rope.len_utf16_cu()
    }

    fn substring(&self, range: TextRange) -> String {
        let start = self.char_index(range.location);
        let end = self.char_index(range.max());
        self.rope.slice(start..end).to_string()
    }

    fn is_boundary(&self, offset: usize) -> bool {
        offset <= self.len() && self.utf16_index(self.char_index(offset)) == offset
    }

    fn replace(&mut self, range: TextRange, text: &str) {
        let inherited = self.inherited_attributes(range);

        let start_char = self.char_index(range.location);
        let end_char = self.char_index(range.max());
        if start_char < end_char {
            self.rope.remove(start_char..end_char);
        }
        if !text.is_empty() {
            self.rope.insert(start_char, text);
        }

        let inserted = utf16_len(text);
        let first = self.split_at(range.location);
        let last = self.split_at(range.max());
        self.runs.drain(first..last);

        for run in &mut self.runs[first..] {
            run.start = run.start - range.length + inserted;
            run.end = run.end - range.length + inserted;
        }

        if inserted > 0 {
            self.runs.insert(
                first,
                AttributeRun {
                    start: range.location,
                    end: range.location + inserted,
                    attributes: inherited,
                },
            );
        }

        self.coalesce(first, first);
    }

    fn attribute(&self, key: &AttributeKey, at: usize) -> Option<AttributeValue> {
        self.run_index_at(at)
            .and_then(|idx| self.runs[idx].attributes.get(key).cloned())
    }

    fn attributes_at(&self, at: usize) -> Attributes {
        self.run_index_at(at)
            .map(|idx| self.runs[idx].attributes.clone())
            .unwrap_or_default()
    }

    fn add_attribute(&mut self, key: AttributeKey, value: AttributeValue, range: TextRange) {
        if range.is_empty() {
            return;
        }
        let first = self.split_at(range.location);
        let last = self.split_at(range.max());
        for run in &mut self.runs[first..last] {
            run.attributes.insert(key.clone(), value.clone());
        }
        self.coalesce(first, last.saturating_sub(1));
    }

    fn set_attributes(&mut self, attributes: Attributes, range: TextRange) {
        if range.is_empty() {
            return;
        }
        let first = self.split_at(range.location);
        let last = self.split_at(range.max());
        self.runs.splice(
            first..last,
            [AttributeRun {
                start: range.location,
                end: range.max(),
                attributes,
            }],
        );
        self.coalesce(first, first);
    }

    fn enumerate_attribute(
        &self,
        key: &AttributeKey,
        range: TextRange,
        order: EnumerationOrder,
    ) -> Vec<(Option<AttributeValue>, TextRange)> {
        let mut result: Vec<(Option<AttributeValue>, TextRange)> = Vec::new();
        if range.is_empty() {
            return result;
        }

        let first = self.runs.partition_point(|run| run.end <= range.location);
        for run in self.runs[first..]
            .iter()
            .take_while(|run| run.start < range.max())
        {
            let start = run.start.max(range.location);
            let end = run.end.min(range.max());
            let value = run.attributes.get(key).cloned();

            match result.last_mut() {
                Some((last_value, last_range)) if *last_value == value => {
                    last_range.length = end - last_range.location;
                }
                _ => result.push((value, TextRange::from_bounds(start, end))),
            }
        }

        if order == EnumerationOrder::Reverse {
            result.reverse();
        }
        result
    }

    fn paragraph_range(&self, range: TextRange) -> TextRange {
        let start_char = self.char_index(range.location);
        let end_char = self.char_index(range.max());

        let start_line = self.rope.char_to_line(start_char);
        let last_char = if end_char > start_char {
            end_char - 1
        } else {
            start_char
        };
        let last_line = self.rope.char_to_line(last_char);

        // `line_to_char(len_lines())` is the end of the text.
        let para_start = self.rope.line_to_char(start_line);
        let para_end = self.rope.line_to_char(last_line + 1);

        TextRange::from_bounds(self.utf16_index(para_start), self.utf16_index(para_end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color(value: u32) -> (AttributeKey, AttributeValue) {
        (AttributeKey::from_static("color"), AttributeValue::Color(value))
    }

    #[test]
    fn test_from_text() {
        let store = RopeStore::from_text("Hello\nWorld");
        assert_eq!(store.len(), 11);
        assert_eq!(store.text(), "Hello\nWorld");
        assert_eq!(store.run_count(), 1);
        assert!(RopeStore::new().is_empty());
        assert_eq!(RopeStore::new().run_count(), 0);
    }

    #[test]
    fn test_utf16_offsets() {
        let store = RopeStore::from_text("a💋b");
        assert_eq!(store.len(), 4);
        assert_eq!(store.substring(TextRange::new(1, 2)), "💋");
        assert_eq!(store.substring(TextRange::new(3, 1)), "b");
        assert!(store.is_boundary(1));
        assert!(!store.is_boundary(2));
        assert!(store.is_boundary(4));
        assert!(!store.is_boundary(5));
    }

    #[test]
    fn test_replace_text() {
        let mut store = RopeStore::from_text("Hello World");
        store.replace(TextRange::new(6, 0), "Beautiful ");
        assert_eq!(store.text(), "Hello Beautiful World");

        store.replace(TextRange::new(6, 10), "");
        assert_eq!(store.text(), "Hello World");

        store.replace(TextRange::new(0, 5), "Goodbye");
        assert_eq!(store.text(), "Goodbye World");
        assert_eq!(store.len(), 13);
    }

    #[test]
    fn test_insert_inherits_preceding_attributes() {
        let mut store = RopeStore::from_text("abcd");
        let (key, red) = color(1);
        store.add_attribute(key.clone(), red.clone(), TextRange::new(0, 2));

        store.replace(TextRange::empty(2), "XY");
        assert_eq!(store.text(), "abXYcd");
        assert_eq!(store.attribute(&key, 2), Some(red.clone()));
        assert_eq!(store.attribute(&key, 3), Some(red.clone()));
        assert_eq!(store.attribute(&key, 4), None);

        // At offset 0 the following character is the donor.
        store.replace(TextRange::empty(0), "_");
        assert_eq!(store.attribute(&key, 0), Some(red));
    }

    #[test]
    fn test_replace_inherits_first_replaced_character() {
        let mut store = RopeStore::from_text("abcd");
        let (key, blue) = color(2);
        store.add_attribute(key.clone(), blue.clone(), TextRange::new(2, 2));

        store.replace(TextRange::new(2, 1), "ZZZ");
        assert_eq!(store.text(), "abZZZd");
        let runs = store.enumerate_attribute(&key, TextRange::new(0, 6), EnumerationOrder::Forward);
        assert_eq!(
            runs,
            vec![(None, TextRange::new(0, 2)), (Some(blue), TextRange::new(2, 4))]
        );
    }

    #[test]
    fn test_runs_shift_after_edit() {
        let mut store = RopeStore::from_text("one\ntwo\n");
        let (key, value) = color(3);
        store.add_attribute(key.clone(), value.clone(), TextRange::new(4, 4));

        store.replace(TextRange::new(0, 3), "1");
        assert_eq!(store.text(), "1\ntwo\n");
        assert_eq!(store.attribute(&key, 1), None);
        assert_eq!(store.attribute(&key, 2), Some(value.clone()));
        assert_eq!(store.attribute(&key, 5), Some(value));
    }

    #[test]
    fn test_set_attributes_replaces_everything_in_range() {
        let mut store = RopeStore::from_text("abcdef");
        let (key, value) = color(4);
        store.add_attribute(key.clone(), value.clone(), TextRange::new(0, 6));

        let mut attrs = Attributes::new();
        attrs.insert(AttributeKey::from_static("bold"), AttributeValue::Flag(true));
        store.set_attributes(attrs.clone(), TextRange::new(2, 2));

        assert_eq!(store.attribute(&key, 2), None);
        assert_eq!(store.attributes_at(3), attrs);
        assert_eq!(store.attribute(&key, 4), Some(value));
        assert_eq!(store.run_count(), 3);
    }

    #[test]
    fn test_equal_neighbours_coalesce() {
        let mut store = RopeStore::from_text("abcdef");
        let (key, value) = color(5);
        store.add_attribute(key.clone(), value.clone(), TextRange::new(0, 3));
        store.add_attribute(key.clone(), value.clone(), TextRange::new(3, 3));
        assert_eq!(store.run_count(), 1);
    }

    #[test]
    fn test_enumerate_clips_and_reverses() {
        let mut store = RopeStore::from_text("aaabbbccc");
        let key = AttributeKey::from_static("n");
        store.add_attribute(key.clone(), AttributeValue::Integer(1), TextRange::new(0, 3));
        store.add_attribute(key.clone(), AttributeValue::Integer(2), TextRange::new(3, 3));
        store.add_attribute(key.clone(), AttributeValue::Integer(3), TextRange::new(6, 3));

        let forward = store.enumerate_attribute(&key, TextRange::new(2, 5), EnumerationOrder::Forward);
        assert_eq!(
            forward,
            vec![
                (Some(AttributeValue::Integer(1)), TextRange::new(2, 1)),
                (Some(AttributeValue::Integer(2)), TextRange::new(3, 3)),
                (Some(AttributeValue::Integer(3)), TextRange::new(6, 1)),
            ]
        );

        let reverse = store.enumerate_attribute(&key, TextRange::new(2, 5), EnumerationOrder::Reverse);
        assert_eq!(reverse.len(), 3);
        assert_eq!(reverse[0].1, TextRange::new(6, 1));
        assert_eq!(reverse[2].1, TextRange::new(2, 1));

        assert!(
            store
                .enumerate_attribute(&key, TextRange::empty(4), EnumerationOrder::Forward)
                .is_empty()
        );
    }

    #[test]
    fn test_enumerate_merges_runs_equal_for_key() {
        let mut store = RopeStore::from_text("abcdef");
        let key = AttributeKey::from_static("n");
        store.add_attribute(key.clone(), AttributeValue::Integer(7), TextRange::new(0, 6));
        store.add_attribute(
            AttributeKey::from_static("other"),
            AttributeValue::Flag(true),
            TextRange::new(2, 2),
        );
        assert_eq!(store.run_count(), 3);

        let runs = store.enumerate_attribute(&key, TextRange::new(0, 6), EnumerationOrder::Forward);
        assert_eq!(runs, vec![(Some(AttributeValue::Integer(7)), TextRange::new(0, 6))]);
    }

    #[test]
    fn test_paragraph_range() {
        // "ab\n" [0,3)  "cd\n" [3,6)  "ef" [6,8)
        let store = RopeStore::from_text("ab\ncd\nef");
        assert_eq!(store.paragraph_range(TextRange::new(1, 1)), TextRange::new(0, 3));
        assert_eq!(store.paragraph_range(TextRange::empty(3)), TextRange::new(3, 3));
        assert_eq!(store.paragraph_range(TextRange::new(1, 3)), TextRange::new(0, 6));
        // Ending right after a separator does not pull in the next paragraph.
        assert_eq!(store.paragraph_range(TextRange::new(0, 3)), TextRange::new(0, 3));
        assert_eq!(store.paragraph_range(TextRange::empty(8)), TextRange::new(6, 2));
    }

    #[test]
    fn test_paragraph_range_trailing_separator() {
        let store = RopeStore::from_text("ab\n");
        assert_eq!(store.paragraph_range(TextRange::empty(3)), TextRange::empty(3));
        assert_eq!(store.paragraph_range(TextRange::new(2, 1)), TextRange::new(0, 3));

        let empty = RopeStore::new();
        assert_eq!(empty.paragraph_range(TextRange::empty(0)), TextRange::empty(0));
    }

    #[test]
    fn test_lone_carriage_return_is_not_a_paragraph_break() {
        let store = RopeStore::from_text("a\rb\nc");
        assert_eq!(store.paragraph_range(TextRange::empty(0)), TextRange::new(0, 4));
    }
}
