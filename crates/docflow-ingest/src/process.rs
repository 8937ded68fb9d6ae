//! Turn staged artifacts into element JSON
//!
//! The runner hands every staged file to a [`DocProcessor`]. The default
//! [`ElementPartitioner`] understands Slack message dumps and plain text.

use crate::slack::xml::MessageDump;
use chrono::{DateTime, Utc};
use docflow_common::{DocflowError, FileMeta, Result};
use docflow_documents::cleaners::{clean_extra_whitespace, Cleaner};
use docflow_documents::{assign_sequence_ids, partition_text, ElementMetadata, Text};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Output written to `<output_dir>/<locator>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub source_locator: String,
    pub filename: String,
    pub metadata: FileMeta,
    pub processed_at: DateTime<Utc>,
    pub elements: Vec<Text>,
}

/// Parses one staged file into elements
pub trait DocProcessor: Send + Sync {
    fn process(&self, staged: &Path, locator: &str) -> Result<Vec<Text>>;
}

type BoxedCleaner = Box<dyn Cleaner + Send + Sync>;

/// Partitions staged files by extension.
///
/// `.xml` files are read as Slack message dumps, one element per message;
/// anything else must be UTF-8 text and is split on blank lines.
pub struct ElementPartitioner {
    cleaners: Vec<BoxedCleaner>,
}

impl ElementPartitioner {
    pub fn new() -> Self {
        Self {
            cleaners: vec![Box::new(clean_extra_whitespace)],
        }
    }

    /// Replace the cleaners run on every element before ids are assigned
    pub fn with_cleaners(mut self, cleaners: Vec<BoxedCleaner>) -> Self {
        self.cleaners = cleaners;
        self
    }

    fn clean(&self, elements: Vec<Text>) -> Result<Vec<Text>> {
        let cleaners: Vec<&dyn Cleaner> =
            self.cleaners.iter().map(|c| c.as_ref() as &dyn Cleaner).collect();

        let mut cleaned = Vec::with_capacity(elements.len());
        for mut element in elements {
            element.apply(&cleaners)?;
            if !element.text.is_empty() {
                cleaned.push(element);
            }
        }
        Ok(cleaned)
    }
}

impl Default for ElementPartitioner {
    fn default() -> Self {
        Self::new()
    }
}

impl DocProcessor for ElementPartitioner {
    fn process(&self, staged: &Path, locator: &str) -> Result<Vec<Text>> {
        let metadata = ElementMetadata {
            page_number: None,
            filename: staged.file_name().map(|name| name.to_string_lossy().into_owned()),
            source_locator: Some(locator.to_string()),
        };

        let bytes = std::fs::read(staged)?;
        let content = String::from_utf8(bytes).map_err(|_| {
            DocflowError::parse(format!("{} is not UTF-8 text", staged.display()))
        })?;

        let is_xml = staged
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));

        let elements = if is_xml {
            MessageDump::from_xml(&content)?
                .texts()
                .map(|text| Text::narrative(text).with_metadata(metadata.clone()))
                .collect()
        } else {
            partition_text(&content, &metadata)
        };

        let mut elements = self.clean(elements)?;
        assign_sequence_ids(&mut elements);
        Ok(elements)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use docflow_documents::cleaners::to_lowercase;
    use docflow_documents::{Element, ElementId, TextKind};
    use tempfile::TempDir;

    #[test]
    fn test_process_message_dump() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("C01.xml");
        let xml = MessageDump::from_texts(["hello   team", "", "ship it <reply> done"])
            .to_xml()
            .unwrap();
        std::fs::write(&path, xml).unwrap();

        let elements = ElementPartitioner::new().process(&path, "C01").unwrap();

        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].text, "hello team");
        assert_eq!(elements[0].kind, TextKind::NarrativeText);
        assert_eq!(elements[1].text, "ship it <reply> done");
        assert_eq!(elements[1].id(), &ElementId::fingerprint("ship it <reply> done", None, 1));
        assert_eq!(elements[0].metadata().source_locator.as_deref(), Some("C01"));
        assert_eq!(elements[0].metadata().filename.as_deref(), Some("C01.xml"));
    }

    #[test]
    fn test_process_plain_text_with_custom_cleaners() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("file1.txt");
        std::fs::write(&path, "QUARTERLY PLAN\n\nRevenue is UP.").unwrap();

        let partitioner = ElementPartitioner::new().with_cleaners(vec![Box::new(to_lowercase)]);
        let elements = partitioner.process(&path, "file1").unwrap();

        let texts: Vec<&str> = elements.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["quarterly plan", "revenue is up."]);
        assert_eq!(elements[0].id(), &ElementId::fingerprint("quarterly plan", None, 0));
    }

    #[test]
    fn test_binary_content_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("scan.pdf");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x9f]).unwrap();

        let err = ElementPartitioner::new().process(&path, "scan").unwrap_err();
        assert!(matches!(err, DocflowError::Parse(_)));
    }
}
