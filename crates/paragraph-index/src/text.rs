//! Paragraph splitting helpers.

/// The character that terminates a paragraph.
pub const PARAGRAPH_SEPARATOR: char = '\n';

/// Split `text` into paragraphs.
///
/// Every paragraph except the last keeps its trailing separator, so concatenating the result
/// reproduces `text`. N separators always yield N+1 paragraphs: `""` is one empty paragraph
/// and `"a\n"` is `["a\n", ""]`.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    let mut paragraphs: Vec<&str> = text.split_inclusive(PARAGRAPH_SEPARATOR).collect();
    // `split_inclusive` drops the empty paragraph that follows a trailing separator.
    if text.is_empty() || text.ends_with(PARAGRAPH_SEPARATOR) {
        paragraphs.push(&text[text.len()..]);
    }
    paragraphs
}

/// Number of paragraphs `split_paragraphs(text)` would return.
pub fn paragraph_count(text: &str) -> usize {
    text.bytes().filter(|&b| b == PARAGRAPH_SEPARATOR as u8).count() + 1
}

/// Length of `text` in UTF-16 code units.
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}
