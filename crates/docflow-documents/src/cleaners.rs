//! Cleaning pipeline
//!
//! A cleaner maps a string to a JSON value. Anything other than a string is a
//! contract violation, detected right after the offending cleaner runs.

use crate::element::json_kind;
use docflow_common::{DocflowError, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// A text transformation applied to an element's text-bearing fields
pub trait Cleaner {
    fn clean(&self, input: &str) -> Value;
}

impl<F, T> Cleaner for F
where
    F: Fn(&str) -> T,
    T: Into<Value>,
{
    fn clean(&self, input: &str) -> Value {
        self(input).into()
    }
}

/// Run `cleaners` over each field in lockstep: cleaner 0 on every field, then
/// cleaner 1, and so on. Returns the cleaned values in field order.
///
/// Nothing is written back by this function; callers assign the result only
/// on success, so a failing pipeline leaves the element untouched.
pub fn run_pipeline<const N: usize>(
    fields: [(&'static str, &str); N],
    cleaners: &[&dyn Cleaner],
) -> Result<[String; N]> {
    let mut current: [String; N] = fields.map(|(_, value)| value.to_string());

    for (position, cleaner) in cleaners.iter().enumerate() {
        for (slot, &(field, _)) in current.iter_mut().zip(fields.iter()) {
            match cleaner.clean(slot.as_str()) {
                Value::String(cleaned) => *slot = cleaned,
                other => {
                    return Err(DocflowError::CleanerContractViolation {
                        field,
                        position,
                        found: json_kind(&other).to_string(),
                    })
                },
            }
        }
    }

    Ok(current)
}

#[allow(clippy::unwrap_used)]
static EXTRA_SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\x{a0}\n\r]{2,}|[\x{a0}\n\r\t]").unwrap());

#[allow(clippy::unwrap_used)]
static LEADING_BULLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[\x{2022}\x{00b7}\x{25aa}\x{2023}\x{25e6}\x{25cf}\x{2043}*-]\s+").unwrap()
});

/// Collapse runs of whitespace (including non-breaking spaces and newlines) to one space
pub fn clean_extra_whitespace(text: &str) -> String {
    EXTRA_SPACES.replace_all(text, " ").trim().to_string()
}

/// Remove a leading bullet character
pub fn clean_bullets(text: &str) -> String {
    LEADING_BULLET.replace(text, "").to_string()
}

/// Replace hyphens and en dashes with spaces
pub fn clean_dashes(text: &str) -> String {
    text.replace(['-', '\u{2013}'], " ").trim().to_string()
}

/// Strip trailing `.`, `,`, `;` and `:`
pub fn clean_trailing_punctuation(text: &str) -> String {
    text.trim().trim_end_matches(['.', ',', ';', ':']).to_string()
}

/// Replace curly quotes with their ASCII equivalents
pub fn replace_unicode_quotes(text: &str) -> String {
    text.replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
}

pub fn trim(text: &str) -> String {
    text.trim().to_string()
}

pub fn to_lowercase(text: &str) -> String {
    text.to_lowercase()
}
