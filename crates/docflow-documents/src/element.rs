//! Element identity and shared element behavior
//!
//! Every parsed fragment carries an [`ElementId`]. It starts out as either a
//! caller supplied string or a random UUID, and is upgraded to a content
//! fingerprint once the consumer that fixes document order calls
//! [`Element::recompute_identity`]. The upgrade is never implicit.

use docflow_common::checksum::fingerprint;
use docflow_common::{DocflowError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Identifier of a document element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Fresh random identifier (UUID v4)
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Caller supplied identifier. Empty strings are rejected.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(DocflowError::IdentityTypeViolation(
                "element_id must be a non-empty string".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Validate an identifier decoded from JSON.
    ///
    /// `null` or a missing value means "no identifier supplied" and yields `None`;
    /// any non-string value is an `IdentityTypeViolation`.
    pub fn from_json(value: Option<&Value>) -> Result<Option<Self>> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Self::new(s.clone()).map(Some),
            Some(other) => Err(DocflowError::IdentityTypeViolation(format!(
                "element_id must be a string, got {}",
                json_kind(other)
            ))),
        }
    }

    /// Deterministic identifier from content and position.
    ///
    /// SHA-256 of `text`, the page number (or `None`) and the sequence index
    /// concatenated, truncated to 32 hex characters.
    pub fn fingerprint(text: &str, page_number: Option<u32>, sequence_index: usize) -> Self {
        let page = match page_number {
            Some(page) => page.to_string(),
            None => "None".to_string(),
        };
        let data = format!("{text}{page}{sequence_index}");
        Self(fingerprint(data.as_bytes()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Short description of a JSON value's type for error messages
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Element category, serialized as the element `type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Uncategorized,
    Sender,
    Recipient,
    MetaData,
    ReceivedInfo,
    Attachment,
    Subject,
    BodyText,
    Text,
    NarrativeText,
    Title,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Provenance carried by every element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Locator of the ingested document this element came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_locator: Option<String>,
}

/// Identity and metadata shared by all element shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementCore {
    pub element_id: ElementId,

    #[serde(default)]
    pub metadata: ElementMetadata,
}

impl ElementCore {
    pub fn new() -> Self {
        Self {
            element_id: ElementId::generate(),
            metadata: ElementMetadata::default(),
        }
    }

    pub(crate) fn recompute(&mut self, text: &str, sequence_index: usize) -> &ElementId {
        self.element_id =
            ElementId::fingerprint(text, self.metadata.page_number, sequence_index);
        &self.element_id
    }
}

impl Default for ElementCore {
    fn default() -> Self {
        Self::new()
    }
}

/// Capabilities common to every element variant
pub trait Element {
    fn core(&self) -> &ElementCore;

    fn core_mut(&mut self) -> &mut ElementCore;

    fn category(&self) -> Category;

    /// Text the identity fingerprint is derived from
    fn text(&self) -> &str;

    fn id(&self) -> &ElementId {
        &self.core().element_id
    }

    fn metadata(&self) -> &ElementMetadata {
        &self.core().metadata
    }

    fn metadata_mut(&mut self) -> &mut ElementMetadata {
        &mut self.core_mut().metadata
    }

    /// Replace the identifier with the fingerprint of `(text, page_number, sequence_index)`
    fn recompute_identity(&mut self, sequence_index: usize) -> &ElementId {
        let text = self.text().to_string();
        self.core_mut().recompute(&text, sequence_index)
    }
}

/// Assign fingerprint identities in document order
pub fn assign_sequence_ids<E: Element>(elements: &mut [E]) {
    for (index, element) in elements.iter_mut().enumerate() {
        element.recompute_identity(index);
    }
}

/// Split a decoded JSON object into its validated identifier and the rest.
///
/// A missing or `null` identifier is replaced by a generated one.
pub(crate) fn take_element_id(mut value: Value) -> Result<Value> {
    let kind = json_kind(&value);
    let object = value.as_object_mut().ok_or_else(|| {
        DocflowError::parse(format!("element must be a JSON object, got {kind}"))
    })?;

    let id = ElementId::from_json(object.get("element_id"))?.unwrap_or_else(ElementId::generate);
    object.insert("element_id".to_string(), Value::String(id.0));
    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fingerprint_known_value() {
        let id = ElementId::fingerprint("Hello", Some(3), 5);
        assert_eq!(id.as_str(), "b025548ecaf83c16404a7039d9e82e70");
        assert_eq!(id, ElementId::fingerprint("Hello", Some(3), 5));
    }

    #[test]
    fn test_fingerprint_without_page_number() {
        let id = ElementId::fingerprint("Hello", None, 0);
        assert_eq!(id.as_str(), "1c265b5e51231429c984dbeff187aef7");
    }

    #[test]
    fn test_generated_ids_are_unique_uuids() {
        let a = ElementId::generate();
        let b = ElementId::generate();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn test_id_from_json() {
        assert_eq!(ElementId::from_json(None).unwrap(), None);
        assert_eq!(ElementId::from_json(Some(&Value::Null)).unwrap(), None);
        assert_eq!(
            ElementId::from_json(Some(&json!("abc"))).unwrap(),
            Some(ElementId::new("abc").unwrap())
        );

        let err = ElementId::from_json(Some(&json!(42))).unwrap_err();
        assert!(matches!(err, DocflowError::IdentityTypeViolation(_)));
        assert!(ElementId::new("").is_err());
    }

    #[test]
    fn test_take_element_id_fills_missing() {
        let value = take_element_id(json!({ "text": "hi" })).unwrap();
        assert!(value["element_id"].is_string());

        let err = take_element_id(json!({ "element_id": [1, 2] })).unwrap_err();
        assert!(matches!(err, DocflowError::IdentityTypeViolation(_)));
    }
}
