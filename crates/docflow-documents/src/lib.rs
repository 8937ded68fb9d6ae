//! docflow Documents
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Element model for parsed document output.
//!
//! - [`Name`]: `name: text` header fragments (sender, recipient, attachment, ...)
//! - [`Text`]: free text blocks, including the email [`Text::subject`]
//! - [`BodyText`]: ordered paragraphs of a message body
//! - [`EmailElement`]: tagged union used when serializing a parsed email
//!
//! Elements start with a random or caller supplied [`ElementId`] and can be
//! switched to a stable content fingerprint with
//! [`Element::recompute_identity`] once their position is known.
//!
//! # Example
//!
//! ```
//! use docflow_documents::cleaners::{clean_extra_whitespace, Cleaner};
//! use docflow_documents::{Element, Name};
//!
//! let mut sender = Name::sender("From ", "  Jane   Doe ");
//! let cleaners: [&dyn Cleaner; 1] = [&clean_extra_whitespace];
//! sender.apply(&cleaners).unwrap();
//! assert_eq!(sender.to_string(), "From: Jane Doe");
//!
//! let id = sender.recompute_identity(0).clone();
//! assert_eq!(id.as_str().len(), 32);
//! ```

pub mod cleaners;
pub mod element;
pub mod email;
pub mod name;
pub mod partition;
pub mod text;

pub use element::{assign_sequence_ids, Category, Element, ElementId, ElementMetadata};
pub use email::{assign_email_ids, EmailElement};
pub use name::{Name, NameKind};
pub use partition::partition_text;
pub use text::{BodyText, Text, TextKind};
