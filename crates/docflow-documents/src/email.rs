//! Tagged union over the element shapes found in an email

use crate::cleaners::Cleaner;
use crate::element::{Category, Element};
use crate::name::Name;
use crate::text::{BodyText, Text};
use docflow_common::Result;
use serde::Serialize;

/// One section of a parsed email
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EmailElement {
    /// Sender, recipient, header metadata, received info or attachment
    Name(Name),
    /// Subject line, or any other single text block
    Text(Text),
    Body(BodyText),
}

impl EmailElement {
    pub fn category(&self) -> Category {
        match self {
            EmailElement::Name(name) => name.category(),
            EmailElement::Text(text) => text.category(),
            EmailElement::Body(body) => body.category(),
        }
    }

    pub fn apply(&mut self, cleaners: &[&dyn Cleaner]) -> Result<()> {
        match self {
            EmailElement::Name(name) => name.apply(cleaners),
            EmailElement::Text(text) => text.apply(cleaners),
            EmailElement::Body(body) => body.apply(cleaners),
        }
    }
}

impl From<Name> for EmailElement {
    fn from(name: Name) -> Self {
        EmailElement::Name(name)
    }
}

impl From<Text> for EmailElement {
    fn from(text: Text) -> Self {
        EmailElement::Text(text)
    }
}

impl From<BodyText> for EmailElement {
    fn from(body: BodyText) -> Self {
        EmailElement::Body(body)
    }
}

impl std::fmt::Display for EmailElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmailElement::Name(name) => std::fmt::Display::fmt(name, f),
            EmailElement::Text(text) => std::fmt::Display::fmt(text, f),
            EmailElement::Body(body) => std::fmt::Display::fmt(body, f),
        }
    }
}

/// Fingerprint every element by its position in the message.
///
/// Body paragraphs continue the numbering of the element list, so ids stay
/// unique across the whole email.
pub fn assign_email_ids(elements: &mut [EmailElement]) {
    let mut index = 0;
    for element in elements.iter_mut() {
        match element {
            EmailElement::Name(name) => {
                name.recompute_identity(index);
                index += 1;
            },
            EmailElement::Text(text) => {
                text.recompute_identity(index);
                index += 1;
            },
            EmailElement::Body(body) => {
                for text in body.elements.iter_mut() {
                    text.recompute_identity(index);
                    index += 1;
                }
            },
        }
    }
}
