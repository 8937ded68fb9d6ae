//! Settings shared by every connector
//!
//! Source specific settings (channels, drive ids, tokens) live next to each
//! connector; this is the part the lifecycle and the runner read.

use docflow_common::{DocflowError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default number of documents processed at once by the runner
pub const DEFAULT_CONCURRENCY: usize = 2;

/// Default timeout for source API requests in seconds.
/// Can be overridden via DOCFLOW_HTTP_TIMEOUT_SECS.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

/// Directory layout and processing policy for a connector run.
///
/// Read-only once handed to a connector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StandardConnectorConfig {
    /// Where fetched artifacts are staged
    pub download_dir: PathBuf,

    /// Where processed output is written
    pub output_dir: PathBuf,

    /// Keep staged files after processing, for debugging
    #[serde(default)]
    pub retain_artifacts: bool,

    /// Process documents even when their output already exists
    #[serde(default)]
    pub reprocess: bool,

    /// Documents processed concurrently by the runner
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default)]
    pub verbose: bool,
}

impl StandardConnectorConfig {
    pub fn new(download_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
            output_dir: output_dir.into(),
            retain_artifacts: false,
            reprocess: false,
            concurrency: DEFAULT_CONCURRENCY,
            verbose: false,
        }
    }

    /// Load from environment variables, falling back to the user cache directory
    ///
    /// - `DOCFLOW_DOWNLOAD_DIR`
    /// - `DOCFLOW_OUTPUT_DIR`
    /// - `DOCFLOW_PRESERVE_DOWNLOADS` (true/false)
    /// - `DOCFLOW_REPROCESS` (true/false)
    /// - `DOCFLOW_CONCURRENCY`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new(default_download_dir(), "docflow-output");

        if let Ok(dir) = std::env::var("DOCFLOW_DOWNLOAD_DIR") {
            config.download_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("DOCFLOW_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Ok(val) = std::env::var("DOCFLOW_PRESERVE_DOWNLOADS") {
            config.retain_artifacts = parse_flag("DOCFLOW_PRESERVE_DOWNLOADS", &val)?;
        }
        if let Ok(val) = std::env::var("DOCFLOW_REPROCESS") {
            config.reprocess = parse_flag("DOCFLOW_REPROCESS", &val)?;
        }
        if let Ok(val) = std::env::var("DOCFLOW_CONCURRENCY") {
            config.concurrency = val.parse().map_err(|_| {
                DocflowError::invalid_config(format!("DOCFLOW_CONCURRENCY '{val}' is not a number"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_retain_artifacts(mut self, retain: bool) -> Self {
        self.retain_artifacts = retain;
        self
    }

    pub fn with_reprocess(mut self, reprocess: bool) -> Self {
        self.reprocess = reprocess;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Reject settings that would make the runner misbehave
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(DocflowError::invalid_config("concurrency must be at least 1"));
        }
        if self.download_dir.as_os_str().is_empty() {
            return Err(DocflowError::invalid_config("download directory must not be empty"));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(DocflowError::invalid_config("output directory must not be empty"));
        }
        Ok(())
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// `<cache dir>/docflow/downloads`, or a local directory when no cache dir exists
pub fn default_download_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("docflow").join("downloads"))
        .unwrap_or_else(|| PathBuf::from(".docflow-downloads"))
}

/// HTTP client shared by the source API clients
pub fn http_client() -> Result<reqwest::Client> {
    let timeout_secs = std::env::var("DOCFLOW_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DocflowError::invalid_config(format!("HTTP client: {e}")))
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(DocflowError::invalid_config(format!("{name} '{value}' is not a boolean"))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_builder_defaults() {
        let config = StandardConnectorConfig::new("/tmp/dl", "/tmp/out")
            .with_retain_artifacts(true)
            .with_concurrency(4);
        assert!(config.retain_artifacts);
        assert!(!config.reprocess);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.download_dir(), Path::new("/tmp/dl"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = StandardConnectorConfig::new("/tmp/dl", "/tmp/out").with_concurrency(0);
        assert!(matches!(config.validate(), Err(DocflowError::InvalidConfiguration(_))));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var("DOCFLOW_DOWNLOAD_DIR", "/tmp/docflow-env-dl");
        std::env::set_var("DOCFLOW_PRESERVE_DOWNLOADS", "yes");

        let config = StandardConnectorConfig::from_env().unwrap();
        assert_eq!(config.download_dir, PathBuf::from("/tmp/docflow-env-dl"));
        assert!(config.retain_artifacts);

        std::env::remove_var("DOCFLOW_DOWNLOAD_DIR");
        std::env::remove_var("DOCFLOW_PRESERVE_DOWNLOADS");
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("X", "TRUE").unwrap());
        assert!(!parse_flag("X", "off").unwrap());
        assert!(parse_flag("X", "maybe").is_err());
    }

    #[test]
    fn test_deserialize_applies_defaults() {
        let config: StandardConnectorConfig = serde_json::from_value(serde_json::json!({
            "download_dir": "dl",
            "output_dir": "out"
        }))
        .unwrap();
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert!(!config.retain_artifacts);
    }
}
