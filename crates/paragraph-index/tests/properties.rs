use paragraph_index::{
    ParagraphBuffer, ParagraphId, SubstringConsistency, TextRange, split_paragraphs, utf16_len,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const FRAGMENTS: &[&str] = &[
    "", "a", "bc", "word ", "\n", "\n\n", "x\ny", "💋", "你好", "\r\n", "end\n",
];

/// An edit expressed in characters, so it never splits a surrogate pair.
#[derive(Debug, Clone)]
struct Edit {
    start: usize,
    delete: usize,
    insert: &'static str,
}

fn arb_edit() -> impl Strategy<Value = Edit> {
    (0..200usize, 0..8usize, prop::sample::select(FRAGMENTS)).prop_map(
        |(start, delete, insert)| Edit {
            start,
            delete,
            insert,
        },
    )
}

/// Clamp `edit` to `text` and convert it to a UTF-16 range.
fn resolve(text: &str, edit: &Edit) -> TextRange {
    let chars: Vec<char> = text.chars().collect();
    let start = edit.start.min(chars.len());
    let end = (start + edit.delete).min(chars.len());
    let location: usize = chars[..start].iter().map(|c| c.len_utf16()).sum();
    let length: usize = chars[start..end].iter().map(|c| c.len_utf16()).sum();
    TextRange::new(location, length)
}

fn expected_ranges(text: &str) -> Vec<TextRange> {
    let mut location = 0;
    split_paragraphs(text)
        .into_iter()
        .map(|paragraph| {
            let range = TextRange::new(location, utf16_len(paragraph));
            location = range.max();
            range
        })
        .collect()
}

fn ranges(buffer: &ParagraphBuffer) -> Vec<TextRange> {
    buffer.paragraph_descriptors().iter().map(|d| d.range).collect()
}

fn ids(buffer: &ParagraphBuffer) -> Vec<ParagraphId> {
    buffer.paragraph_descriptors().iter().map(|d| d.identifier()).collect()
}

proptest! {
    /// After every commit the descriptors partition the text exactly like a fresh split,
    /// and the identity tags line up with them.
    #[test]
    fn prop_descriptors_match_split(
        initial in prop::sample::select(FRAGMENTS),
        edits in prop::collection::vec(arb_edit(), 1..20),
    ) {
        let mut buffer = ParagraphBuffer::from_text(initial).unwrap();
        for edit in &edits {
            let range = resolve(&buffer.text(), edit);
            buffer.replace_characters(range, edit.insert).unwrap();

            let text = buffer.text();
            prop_assert_eq!(ranges(&buffer), expected_ranges(&text));
            prop_assert!(buffer.paragraph_count() >= 1);
            prop_assert!(buffer.check_invariants().is_ok(), "{:?}", buffer.check_invariants());
        }
    }

    /// Edits that neither remove nor insert a separator keep every identifier.
    #[test]
    fn prop_interior_edits_keep_identity(
        edits in prop::collection::vec(
            (0..200usize, 0..4usize, prop::sample::select(&["", "a", "bc", "💋", "你好"][..])),
            1..20,
        ),
    ) {
        let mut buffer = ParagraphBuffer::from_text("first line\nsecond 💋 line\n\nlast").unwrap();
        let before = ids(&buffer);

        for (start, delete, insert) in edits {
            let text = buffer.text();
            let range = resolve(&text, &Edit { start, delete, insert });
            if buffer.substring(range).unwrap().contains('\n') {
                continue;
            }
            buffer.replace_characters(range, insert).unwrap();
        }

        prop_assert_eq!(ids(&buffer), before);
        prop_assert!(buffer.check_invariants().is_ok());
    }

    /// Edits batched in one scope end in the same structure as the text implies.
    #[test]
    fn prop_batched_edits_match_split(
        edits in prop::collection::vec(arb_edit(), 1..10),
    ) {
        let mut buffer = ParagraphBuffer::from_text("alpha\nbeta\ngamma").unwrap();
        {
            let mut scope = buffer.begin_editing();
            for edit in &edits {
                let range = resolve(&scope.buffer().text(), edit);
                scope.replace_characters(range, edit.insert).unwrap();
            }
            scope.commit().unwrap();
        }

        let text = buffer.text();
        prop_assert_eq!(ranges(&buffer), expected_ranges(&text));
        prop_assert!(buffer.check_invariants().is_ok(), "{:?}", buffer.check_invariants());
    }

    /// `IncludeTrailingEmptyParagraph` never leaves an interior empty paragraph behind,
    /// and only ever replaces the last range.
    #[test]
    fn prop_include_trailing_empty(
        text in prop::collection::vec(prop::sample::select(FRAGMENTS), 0..12),
        start in 0..100usize,
        delete in 0..20usize,
    ) {
        let text = text.concat();
        let buffer = ParagraphBuffer::from_text(&text).unwrap();
        let range = resolve(&text, &Edit { start, delete, insert: "" });

        let exact = buffer.substring_paragraph_ranges(range, SubstringConsistency::Exact).unwrap();
        let include = buffer
            .substring_paragraph_ranges(range, SubstringConsistency::IncludeTrailingEmptyParagraph)
            .unwrap();

        prop_assert_eq!(exact.len(), include.len());
        prop_assert_eq!(&exact[..exact.len() - 1], &include[..include.len() - 1]);
        let last = include[include.len() - 1];
        prop_assert!(!last.is_empty() || last.max() == buffer.len());
        prop_assert!(expected_ranges(&text).contains(&last));
    }
}

#[test]
fn test_random_edit_sequence() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut buffer = ParagraphBuffer::new();

    for _ in 0..500 {
        let edit = Edit {
            start: rng.gen_range(0..400),
            delete: if rng.gen_bool(0.3) { rng.gen_range(0..30) } else { 0 },
            insert: FRAGMENTS[rng.gen_range(0..FRAGMENTS.len())],
        };
        let range = resolve(&buffer.text(), &edit);
        buffer.replace_characters(range, edit.insert).unwrap();
    }

    let text = buffer.text();
    assert_eq!(ranges(&buffer), expected_ranges(&text));
    buffer.check_invariants().unwrap();
}
