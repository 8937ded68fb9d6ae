//! docflow Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the docflow workspace.
//!
//! - **Error Handling**: [`DocflowError`] and the crate [`Result`] alias
//! - **Checksums**: SHA-256 digests and content fingerprints
//! - **Dates**: window-bound validation and source timestamp parsing
//! - **Logging**: `tracing` subscriber setup shared by all binaries
//! - **Types**: [`types::FileMeta`] creation/modification window
//!
//! # Example
//!
//! ```no_run
//! use docflow_common::{checksum, FileMeta, Result};
//!
//! fn window(stamps: &[&str]) -> Result<FileMeta> {
//!     FileMeta::from_timestamps(stamps)
//! }
//!
//! let id = checksum::fingerprint(b"Hello");
//! assert_eq!(id.len(), checksum::FINGERPRINT_HEX_LEN);
//! ```

pub mod checksum;
pub mod dates;
pub mod error;
pub mod logging;
pub mod types;

pub use error::{DocflowError, Result};
pub use types::FileMeta;
