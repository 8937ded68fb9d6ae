//! Google Drive connector
//!
//! `drive_id` names either a folder, whose files (optionally recursive) are
//! ingested, or a single file.

pub mod client;
pub mod source;

pub use client::{DriveClient, DriveFile, DEFAULT_DRIVE_API_URL};
pub use source::DriveSource;

use crate::cleanup::Cleanup;
use crate::config::StandardConnectorConfig;
use crate::connector::{cleanup_download_dir, dedupe_locators, Connector};
use crate::lifecycle::StagedDoc;
use async_trait::async_trait;
use docflow_common::{DocflowError, Result};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

pub type DriveDoc = StagedDoc<DriveSource>;

#[derive(Clone)]
pub struct GoogleDriveConfig {
    pub drive_id: String,
    pub token: String,
    /// Only files with this extension, normalized to `.ext`
    pub extension: Option<String>,
    pub recursive: bool,
    pub api_url: String,
}

impl GoogleDriveConfig {
    pub fn new(
        drive_id: impl Into<String>,
        token: impl Into<String>,
        extension: Option<&str>,
        recursive: bool,
    ) -> Result<Self> {
        let drive_id = drive_id.into().trim().to_string();
        if drive_id.is_empty() {
            return Err(DocflowError::invalid_config("Google Drive file or folder id is required"));
        }

        let token = token.into();
        if token.trim().is_empty() {
            return Err(DocflowError::invalid_config("Google Drive token must not be empty"));
        }

        let extension = extension
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .map(|ext| format!(".{ext}"));

        Ok(Self {
            drive_id,
            token,
            extension,
            recursive,
            api_url: DEFAULT_DRIVE_API_URL.to_string(),
        })
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    fn accepts(&self, file: &DriveFile) -> bool {
        match &self.extension {
            Some(wanted) => format!(".{}", file.extension()) == *wanted,
            None => true,
        }
    }
}

impl std::fmt::Debug for GoogleDriveConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleDriveConfig")
            .field("drive_id", &self.drive_id)
            .field("token", &"<redacted>")
            .field("extension", &self.extension)
            .field("recursive", &self.recursive)
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Enumerates one [`DriveDoc`] per downloadable file
#[derive(Debug)]
pub struct GoogleDriveConnector {
    settings: Arc<StandardConnectorConfig>,
    config: GoogleDriveConfig,
    client: DriveClient,
}

impl GoogleDriveConnector {
    pub fn new(settings: StandardConnectorConfig, config: GoogleDriveConfig) -> Result<Self> {
        settings.validate()?;
        let client = DriveClient::new(&config.api_url, &config.token)?;
        Ok(Self {
            settings: Arc::new(settings),
            config,
            client,
        })
    }

    /// Breadth-first walk of a folder, descending only when recursive
    async fn list_folder(&self, folder_id: &str) -> Result<Vec<DriveFile>> {
        let mut pending = VecDeque::from([folder_id.to_string()]);
        let mut files = Vec::new();

        while let Some(folder) = pending.pop_front() {
            for child in self.client.list_children(&folder).await? {
                if child.is_folder() {
                    if self.config.recursive {
                        pending.push_back(child.id);
                    }
                } else {
                    files.push(child);
                }
            }
        }
        Ok(files)
    }
}

#[async_trait]
impl Connector for GoogleDriveConnector {
    type Doc = DriveDoc;

    fn name(&self) -> &'static str {
        "google-drive"
    }

    fn settings(&self) -> &StandardConnectorConfig {
        &self.settings
    }

    async fn ingest_docs(&self) -> Result<Vec<DriveDoc>> {
        let root = self
            .client
            .get_file(&self.config.drive_id)
            .await?
            .ok_or_else(|| DocflowError::source_unavailable(&self.config.drive_id, "not found"))?;

        let candidates = if root.is_folder() {
            self.list_folder(&root.id).await?
        } else {
            vec![root]
        };

        let files: Vec<DriveFile> = candidates
            .into_iter()
            .filter(|file| {
                let keep = file.is_downloadable() && self.config.accepts(file);
                if !keep {
                    debug!(file = %file.id, name = %file.name, mime = %file.mime_type, "Skipping Drive file");
                }
                keep
            })
            .collect();
        let files = dedupe_locators(files, |file| file.id.as_str());
        info!(count = files.len(), "Enumerated Google Drive files");

        Ok(files
            .into_iter()
            .map(|file| StagedDoc::new(DriveSource::new(file, self.client.clone()), self.settings.clone()))
            .collect())
    }
}

impl Cleanup for GoogleDriveConnector {
    fn cleanup(&self) {
        cleanup_download_dir(&self.settings);
    }
}
