//! Minimal plain-text partitioning

use crate::element::{assign_sequence_ids, ElementMetadata};
use crate::text::Text;
use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::unwrap_used)]
static PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]*\n").unwrap());

const MAX_TITLE_CHARS: usize = 80;

/// Split text on blank lines into elements, in order, with fingerprint ids.
///
/// A single short line without sentence punctuation becomes a `Title`;
/// everything else is `NarrativeText`.
pub fn partition_text(text: &str, metadata: &ElementMetadata) -> Vec<Text> {
    let normalized = text.replace("\r\n", "\n");
    let mut elements: Vec<Text> = PARAGRAPH_BREAK
        .split(&normalized)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| classify(p).with_metadata(metadata.clone()))
        .collect();

    assign_sequence_ids(&mut elements);
    elements
}

fn classify(paragraph: &str) -> Text {
    let single_line = !paragraph.contains('\n');
    let short = paragraph.chars().count() <= MAX_TITLE_CHARS;
    let ends_sentence = paragraph.ends_with(['.', '!', '?', ',', ';', ':']);

    if single_line && short && !ends_sentence {
        Text::title(paragraph)
    } else {
        Text::narrative(paragraph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, ElementId};
    use crate::text::TextKind;

    #[test]
    fn test_partition_splits_paragraphs() {
        let text = "Release Notes\n\nThe ingest step now retries.\nSee the changelog.\n\n\n  \nThanks!";
        let elements = partition_text(text, &ElementMetadata::default());

        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].kind, TextKind::Title);
        assert_eq!(elements[1].kind, TextKind::NarrativeText);
        assert_eq!(elements[1].text, "The ingest step now retries.\nSee the changelog.");
        assert_eq!(elements[2].text, "Thanks!");
    }

    #[test]
    fn test_partition_assigns_positional_ids() {
        let metadata = ElementMetadata {
            page_number: Some(1),
            filename: Some("notes.txt".to_string()),
            source_locator: None,
        };
        let elements = partition_text("one.\r\n\r\ntwo.", &metadata);
        assert_eq!(elements[0].id(), &ElementId::fingerprint("one.", Some(1), 0));
        assert_eq!(elements[1].id(), &ElementId::fingerprint("two.", Some(1), 1));
        assert_eq!(elements[1].metadata().filename.as_deref(), Some("notes.txt"));
    }

    #[test]
    fn test_partition_empty_input() {
        assert!(partition_text("  \n\n ", &ElementMetadata::default()).is_empty());
    }
}
