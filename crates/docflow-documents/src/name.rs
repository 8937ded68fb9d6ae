//! Name-bearing elements: senders, recipients, header metadata, attachments

use crate::cleaners::{run_pipeline, Cleaner};
use crate::element::{take_element_id, Category, Element, ElementCore, ElementId, ElementMetadata};
use chrono::{DateTime, Utc};
use docflow_common::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which header field a [`Name`] was captured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NameKind {
    #[default]
    Uncategorized,
    Sender,
    Recipient,
    MetaData,
    ReceivedInfo,
    Attachment,
}

impl From<NameKind> for Category {
    fn from(kind: NameKind) -> Self {
        match kind {
            NameKind::Uncategorized => Category::Uncategorized,
            NameKind::Sender => Category::Sender,
            NameKind::Recipient => Category::Recipient,
            NameKind::MetaData => Category::MetaData,
            NameKind::ReceivedInfo => Category::ReceivedInfo,
            NameKind::Attachment => Category::Attachment,
        }
    }
}

/// A `name: text` pair, optionally stamped with a date.
///
/// Equality looks at `name` and `text`; datestamps are compared only when both
/// sides carry one. This makes `==` non-transitive, so `Name` is not `Eq`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Name {
    #[serde(rename = "type", default)]
    pub kind: NameKind,

    #[serde(flatten)]
    pub core: ElementCore,

    pub name: String,

    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datestamp: Option<DateTime<Utc>>,
}

impl Name {
    pub fn new(kind: NameKind, name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind,
            core: ElementCore::new(),
            name: name.into(),
            text: text.into(),
            datestamp: None,
        }
    }

    pub fn sender(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(NameKind::Sender, name, text)
    }

    pub fn recipient(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(NameKind::Recipient, name, text)
    }

    pub fn meta_data(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(NameKind::MetaData, name, text)
    }

    pub fn received_info(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(NameKind::ReceivedInfo, name, text)
    }

    pub fn attachment(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(NameKind::Attachment, name, text)
    }

    /// Replace the generated identifier with a caller supplied one
    pub fn with_id(mut self, id: impl Into<String>) -> Result<Self> {
        self.core.element_id = ElementId::new(id)?;
        Ok(self)
    }

    pub fn with_datestamp(mut self, datestamp: DateTime<Utc>) -> Self {
        self.datestamp = Some(datestamp);
        self
    }

    pub fn with_metadata(mut self, metadata: ElementMetadata) -> Self {
        self.core.metadata = metadata;
        self
    }

    /// Decode from JSON, validating the identifier type first
    pub fn from_value(value: Value) -> Result<Self> {
        let value = take_element_id(value)?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn has_datestamp(&self) -> bool {
        self.datestamp.is_some()
    }

    /// Clean `text` and `name` in place. On error neither field changes.
    pub fn apply(&mut self, cleaners: &[&dyn Cleaner]) -> Result<()> {
        let [text, name] = run_pipeline(
            [("text", self.text.as_str()), ("name", self.name.as_str())],
            cleaners,
        )?;
        self.text = text;
        self.name = name;
        Ok(())
    }
}

impl Element for Name {
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

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        if self.name != other.name || self.text != other.text {
            return false;
        }
        match (self.datestamp, other.datestamp) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.text)
    }
}
