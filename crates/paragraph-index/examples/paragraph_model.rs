//! Paragraph model example
//!
//! Demonstrates how a host keeps per-paragraph state in step with a `ParagraphBuffer`.

use paragraph_index::{
    AttributeKey, AttributeValue, Attributes, DescriptorTable, ParagraphBuffer,
    ParagraphDescriptor, ParagraphId, ParagraphObserver,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Host-side model: the set of live paragraphs plus a change log.
#[derive(Clone, Default)]
struct TrackedParagraphs {
    live: Arc<Mutex<HashSet<ParagraphId>>>,
    log: Arc<Mutex<Vec<String>>>,
}

impl ParagraphObserver for TrackedParagraphs {
    fn paragraph_added(&mut self, table: &DescriptorTable, descriptor: &ParagraphDescriptor) {
        let index = table.index_of(descriptor).unwrap_or_default();
        self.live.lock().unwrap().insert(descriptor.identifier());
        self.log
            .lock()
            .unwrap()
            .push(format!("added   #{index} {}", descriptor.range));
    }

    fn paragraph_will_delete(&mut self, table: &DescriptorTable, descriptor: &ParagraphDescriptor) {
        let index = table.index_of(descriptor).unwrap_or_default();
        self.live.lock().unwrap().remove(&descriptor.identifier());
        self.log
            .lock()
            .unwrap()
            .push(format!("delete  #{index} {}", descriptor.range));
    }

    fn paragraph_edited(&mut self, table: &DescriptorTable, descriptor: &ParagraphDescriptor) {
        let index = table.index_of(descriptor).unwrap_or_default();
        self.log
            .lock()
            .unwrap()
            .push(format!("edited  #{index} {}", descriptor.range));
    }

    fn style_for_paragraph(&mut self, descriptor: &ParagraphDescriptor) -> Option<Attributes> {
        let mut attributes = Attributes::new();
        attributes.insert(
            AttributeKey::PARAGRAPH_STYLE,
            AttributeValue::Style(if descriptor.range.length > 20 { 2 } else { 1 }),
        );
        Some(attributes)
    }
}

fn print_paragraphs(buffer: &ParagraphBuffer) {
    for (index, descriptor) in buffer.paragraph_descriptors().iter().enumerate() {
        let text = buffer
            .paragraph_text(descriptor.identifier())
            .unwrap_or_default();
        let style = buffer.attribute(&AttributeKey::PARAGRAPH_STYLE, descriptor.range.location);
        println!(
            "  #{index} {:<10} {:<40} style={style:?}",
            descriptor.range.to_string(),
            format!("{text:?}")
        );
    }
}

fn main() {
    println!("=== Paragraph Model Example ===\n");

    let mut buffer = ParagraphBuffer::new();
    let model = TrackedParagraphs::default();
    buffer.set_observer(model.clone());
    model
        .live
        .lock()
        .unwrap()
        .insert(buffer.paragraph_descriptors()[0].identifier());

    println!("1. Insert initial text:");
    buffer
        .replace_characters(0..0, "Title\nThe first paragraph of the body.\nThe end")
        .unwrap();
    print_paragraphs(&buffer);

    println!("\n2. Type inside the title (identities are kept):");
    let title = buffer.paragraph_descriptor_at_index(0).unwrap();
    buffer.replace_characters(5..5, " of the document").unwrap();
    let retitled = buffer.paragraph_descriptor_at_index(0).unwrap();
    println!("  same paragraph: {}", title == retitled);
    print_paragraphs(&buffer);

    println!("\n3. Split and join paragraphs in one transaction:");
    {
        let mut scope = buffer.begin_editing();
        scope.insert(22, "\n").unwrap();
        let end = scope.buffer().len();
        scope.delete(end - 8..end - 7).unwrap();
    }
    print_paragraphs(&buffer);

    println!("\n4. Notifications received:");
    for line in model.log.lock().unwrap().iter() {
        println!("  {line}");
    }

    println!(
        "\nTracked paragraphs: {} (buffer has {})",
        model.live.lock().unwrap().len(),
        buffer.paragraph_count()
    );
    buffer.check_invariants().unwrap();
}
