//! Free-text elements and the ordered [`BodyText`] container

use crate::cleaners::{run_pipeline, Cleaner};
use crate::element::{take_element_id, Category, Element, ElementCore, ElementId, ElementMetadata};
use docflow_common::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TextKind {
    #[default]
    Text,
    NarrativeText,
    Title,
    Subject,
}

impl From<TextKind> for Category {
    fn from(kind: TextKind) -> Self {
        match kind {
            TextKind::Text => Category::Text,
            TextKind::NarrativeText => Category::NarrativeText,
            TextKind::Title => Category::Title,
            TextKind::Subject => Category::Subject,
        }
    }
}

/// A block of text. Equal when kind and text match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Text {
    #[serde(rename = "type", default)]
    pub kind: TextKind,

    #[serde(flatten)]
    pub core: ElementCore,

    pub text: String,
}

impl Text {
    pub fn new(kind: TextKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            core: ElementCore::new(),
            text: text.into(),
        }
    }

    pub fn narrative(text: impl Into<String>) -> Self {
        Self::new(TextKind::NarrativeText, text)
    }

    pub fn title(text: impl Into<String>) -> Self {
        Self::new(TextKind::Title, text)
    }

    /// The subject line of an email
    pub fn subject(text: impl Into<String>) -> Self {
        Self::new(TextKind::Subject, text)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Result<Self> {
        self.core.element_id = ElementId::new(id)?;
        Ok(self)
    }

    pub fn with_metadata(mut self, metadata: ElementMetadata) -> Self {
        self.core.metadata = metadata;
        self
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let value = take_element_id(value)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Clean `text` in place. On error the text is unchanged.
    pub fn apply(&mut self, cleaners: &[&dyn Cleaner]) -> Result<()> {
        let [text] = run_pipeline([("text", self.text.as_str())], cleaners)?;
        self.text = text;
        Ok(())
    }
}

impl Element for Text {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ElementCore {
        &mut self.core
    }

    fn category(&self) -> Category {
        self.kind.into()
    }

    fn text(&self) -> &str {
        &self.text
    }
}

impl PartialEq for Text {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.text == other.text
    }
}

impl Eq for Text {}

impl std::fmt::Display for Text {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// The body of a message: paragraphs in document order.
///
/// Duplicates are allowed and order is significant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyText {
    pub elements: Vec<Text>,
}

impl BodyText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(&self) -> Category {
        Category::BodyText
    }

    pub fn push(&mut self, text: Text) {
        self.elements.push(text);
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Text> {
        self.elements.iter()
    }

    /// Clean every paragraph. All-or-nothing across the container.
    pub fn apply(&mut self, cleaners: &[&dyn Cleaner]) -> Result<()> {
        let mut cleaned = self.elements.clone();
        for text in &mut cleaned {
            text.apply(cleaners)?;
        }
        self.elements = cleaned;
        Ok(())
    }

    /// Fingerprint each paragraph by its position within the body
    pub fn assign_sequence_ids(&mut self) {
        crate::element::assign_sequence_ids(&mut self.elements);
    }
}

impl From<Vec<Text>> for BodyText {
    fn from(elements: Vec<Text>) -> Self {
        Self { elements }
    }
}

impl FromIterator<Text> for BodyText {
    fn from_iter<I: IntoIterator<Item = Text>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for BodyText {
    type Item = Text;
    type IntoIter = std::vec::IntoIter<Text>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl std::fmt::Display for BodyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let paragraphs: Vec<&str> = self.elements.iter().map(|t| t.text.as_str()).collect();
        f.write_str(&paragraphs.join("\n\n"))
    }
}
