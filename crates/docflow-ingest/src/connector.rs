//! Connector contract: enumerate the documents of one source

use crate::cleanup::{remove_empty_dirs, Cleanup};
use crate::config::StandardConnectorConfig;
use crate::lifecycle::IngestDoc;
use async_trait::async_trait;
use docflow_common::Result;
use std::collections::HashSet;
use tracing::{info, warn};

/// A source of ingestable documents.
///
/// `initialize` runs once before enumeration; cleanup runs once after every
/// document was processed.
#[async_trait]
pub trait Connector: Cleanup + Send + Sync {
    type Doc: IngestDoc + 'static;

    /// Short name used in logs, e.g. `slack`
    fn name(&self) -> &'static str;

    fn settings(&self) -> &StandardConnectorConfig;

    async fn initialize(&self) -> Result<()> {
        std::fs::create_dir_all(self.settings().download_dir())?;
        Ok(())
    }

    /// One document per distinct locator, in source order
    async fn ingest_docs(&self) -> Result<Vec<Self::Doc>>;
}

/// Keep the first item for each locator, warning about the rest
pub fn dedupe_locators<T, F>(items: Vec<T>, locator: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(items.len());
    for item in items {
        if seen.insert(locator(&item).to_string()) {
            unique.push(item);
        } else {
            warn!(locator = locator(&item), "Duplicate locator, skipping");
        }
    }
    unique
}

/// Connector-level cleanup shared by all connectors: drop empty directories
/// left in the download directory.
pub fn cleanup_download_dir(settings: &StandardConnectorConfig) {
    if settings.retain_artifacts {
        info!(path = %settings.download_dir().display(), "Preserving download directory");
        return;
    }
    let removed = remove_empty_dirs(settings.download_dir());
    if removed > 0 {
        info!(removed, path = %settings.download_dir().display(), "Removed empty download directories");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let items = vec![("C1", 1), ("C2", 2), ("C1", 3)];
        let unique = dedupe_locators(items, |item| item.0);
        assert_eq!(unique, vec![("C1", 1), ("C2", 2)]);
    }

    #[test]
    fn test_cleanup_download_dir() {
        let temp = TempDir::new().unwrap();
        let settings =
            StandardConnectorConfig::new(temp.path().join("dl"), temp.path().join("out"));
        std::fs::create_dir_all(settings.download_dir().join("nested")).unwrap();

        cleanup_download_dir(&settings);
        assert!(!settings.download_dir().exists());
    }

    #[test]
    fn test_cleanup_download_dir_retained() {
        let temp = TempDir::new().unwrap();
        let settings =
            StandardConnectorConfig::new(temp.path().join("dl"), temp.path().join("out"))
                .with_retain_artifacts(true);
        std::fs::create_dir_all(settings.download_dir()).unwrap();

        cleanup_download_dir(&settings);
        assert!(settings.download_dir().exists());
    }
}
