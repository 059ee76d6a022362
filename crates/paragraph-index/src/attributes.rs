//! Attribute keys, values and sets stored over text ranges.
//!
//! Attributes are opaque to the synchronization engine with one exception:
//! [`AttributeKey::IDENTIFIER`] carries the paragraph identity tag, stamped over exactly
//! each paragraph's range.

use crate::descriptor::ParagraphId;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// Style ID type
pub type StyleId = u32;

/// Name of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttributeKey(Cow<'static, str>);

impl AttributeKey {
    /// Reserved key holding the [`ParagraphId`] of the paragraph a character belongs to.
    pub const IDENTIFIER: Self = Self(Cow::Borrowed("identifier"));

    /// Paragraph-level style id, for hosts that style paragraphs through [`StyleId`]s.
    pub const PARAGRAPH_STYLE: Self = Self(Cow::Borrowed("paragraph-style"));

    /// Key from a static name.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Key from an owned name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// The key's name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the reserved paragraph identity key.
    pub fn is_identifier(&self) -> bool {
        *self == Self::IDENTIFIER
    }
}

impl From<&'static str> for AttributeKey {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeValue {
    /// Paragraph identity tag.
    Paragraph(ParagraphId),
    /// Host style id.
    Style(StyleId),
    /// Packed `0xRRGGBBAA` color.
    Color(u32),
    /// Integer value (font size in points, indentation level, ...).
    Integer(i64),
    /// Boolean flag.
    Flag(bool),
    /// Free-form text.
    Text(String),
}

impl AttributeValue {
    /// The paragraph identifier, if this is an identity tag.
    pub fn as_paragraph(&self) -> Option<ParagraphId> {
        match self {
            AttributeValue::Paragraph(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<ParagraphId> for AttributeValue {
    fn from(id: ParagraphId) -> Self {
        AttributeValue::Paragraph(id)
    }
}

/// A set of attributes, ordered by key.
pub type Attributes = BTreeMap<AttributeKey, AttributeValue>;
