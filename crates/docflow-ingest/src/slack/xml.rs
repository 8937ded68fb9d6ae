//! Staged channel dump format
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <messages><message><text>...</text></message>...</messages>
//! ```

use docflow_common::{DocflowError, Result};
use serde::{Deserialize, Serialize};

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// Root `<messages>` element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDump {
    #[serde(rename = "message", default)]
    pub messages: Vec<DumpedMessage>,
}

/// One `<message>`: the message text with its thread replies appended
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpedMessage {
    #[serde(default)]
    pub text: String,
}

impl MessageDump {
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            messages: texts
                .into_iter()
                .map(|text| DumpedMessage { text: text.into() })
                .collect(),
        }
    }

    pub fn to_xml(&self) -> Result<String> {
        let body = quick_xml::se::to_string_with_root("messages", self)
            .map_err(|e| DocflowError::parse(format!("Failed to serialize message dump: {e}")))?;
        Ok(format!("{XML_DECLARATION}\n{body}"))
    }

    pub fn from_xml(content: &str) -> Result<Self> {
        quick_xml::de::from_str(content)
            .map_err(|e| DocflowError::parse(format!("Failed to parse message dump: {e}")))
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(|m| m.text.as_str())
    }
}
