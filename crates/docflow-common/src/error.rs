//! Error types for docflow

use thiserror::Error;

/// Result type alias for docflow operations
pub type Result<T> = std::result::Result<T, DocflowError>;

/// Main error type for docflow
#[derive(Error, Debug)]
pub enum DocflowError {
    /// Connector or element configuration rejected at construction time
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Existence probe or fetch failed against the external source
    #[error("Source unavailable for '{locator}': {reason}")]
    SourceUnavailable { locator: String, reason: String },

    /// A cleaner in the cleaning pipeline produced something other than a string
    #[error("Cleaner produced invalid output for field '{field}' at position {position}: got {found}")]
    CleanerContractViolation {
        field: &'static str,
        position: usize,
        found: String,
    },

    /// Element identifier of an unsupported type
    #[error("Invalid element identifier: {0}")]
    IdentityTypeViolation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl DocflowError {
    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Create a source unavailable error
    pub fn source_unavailable(locator: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::SourceUnavailable {
            locator: locator.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Whether the error came from the external source rather than local state
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. })
    }
}
