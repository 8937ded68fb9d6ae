//! Google Drive v3 REST client

use crate::config::http_client;
use docflow_common::{DocflowError, Result};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Drive API root
pub const DEFAULT_DRIVE_API_URL: &str = "https://www.googleapis.com/drive/v3";

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

const GOOGLE_APPS_PREFIX: &str = "application/vnd.google-apps.";

const FILE_FIELDS: &str = "id,name,mimeType,createdTime,modifiedTime,trashed";

const PAGE_SIZE: &str = "1000";

/// Google-native formats have no binary content; they are exported instead
const EXPORT_FORMATS: &[(&str, &str, &str)] = &[
    ("application/vnd.google-apps.document", "text/plain", "txt"),
    ("application/vnd.google-apps.spreadsheet", "text/csv", "csv"),
    ("application/vnd.google-apps.presentation", "text/plain", "txt"),
];

/// File resource, restricted to the fields the connector requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub mime_type: String,

    #[serde(default)]
    pub created_time: Option<String>,

    #[serde(default)]
    pub modified_time: Option<String>,

    #[serde(default)]
    pub trashed: bool,
}

impl DriveFile {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }

    pub fn is_google_native(&self) -> bool {
        self.mime_type.starts_with(GOOGLE_APPS_PREFIX)
    }

    /// Export mime type and extension for Google-native documents
    pub fn export_format(&self) -> Option<(&'static str, &'static str)> {
        EXPORT_FORMATS
            .iter()
            .find(|(native, _, _)| *native == self.mime_type)
            .map(|(_, mime, ext)| (*mime, *ext))
    }

    /// Whether the content can be downloaded or exported
    pub fn is_downloadable(&self) -> bool {
        !self.is_folder() && (!self.is_google_native() || self.export_format().is_some())
    }

    /// Lowercase extension without the dot. Empty when the name has none or
    /// the suffix is not plain ASCII alphanumerics (`notes.v1/2`).
    pub fn extension(&self) -> String {
        if let Some((_, ext)) = self.export_format() {
            return ext.to_string();
        }
        match self.name.rsplit_once('.') {
            Some((stem, ext))
                if !stem.is_empty()
                    && !ext.is_empty()
                    && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
            {
                ext.to_ascii_lowercase()
            },
            _ => String::new(),
        }
    }

    pub fn timestamps(&self) -> Vec<String> {
        self.created_time
            .iter()
            .chain(self.modified_time.iter())
            .cloned()
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Bearer-token authenticated Drive client
#[derive(Clone)]
pub struct DriveClient {
    client: Client,
    base_url: String,
    token: String,
}

impl DriveClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// File metadata, `None` when Drive answers 404
    pub async fn get_file(&self, file_id: &str) -> Result<Option<DriveFile>> {
        let url = format!("{}/files/{}", self.base_url, file_id);
        let response = self
            .send(file_id, &url, &[("fields", FILE_FIELDS), ("supportsAllDrives", "true")])
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(file_id, response)?;
        let file = response
            .json()
            .await
            .map_err(|e| DocflowError::source_unavailable(file_id, e))?;
        Ok(Some(file))
    }

    /// Direct children of a folder, excluding trashed items
    pub async fn list_children(&self, folder_id: &str) -> Result<Vec<DriveFile>> {
        let url = format!("{}/files", self.base_url);
        let q = format!("'{folder_id}' in parents and trashed = false");
        let fields = format!("nextPageToken,files({FILE_FIELDS})");
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("q", q.as_str()),
                ("fields", fields.as_str()),
                ("pageSize", PAGE_SIZE),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.as_str()));
            }

            let response = self.send(folder_id, &url, &query).await?;
            let response = check_status(folder_id, response)?;
            let page: FileList = response
                .json()
                .await
                .map_err(|e| DocflowError::source_unavailable(folder_id, e))?;

            debug!(folder = folder_id, count = page.files.len(), "Listed Drive folder page");
            files.extend(page.files);

            page_token = page.next_page_token.filter(|t| !t.is_empty());
            if page_token.is_none() {
                break;
            }
        }

        Ok(files)
    }

    /// File content, exported to a text format for Google-native documents
    pub async fn download(&self, file: &DriveFile) -> Result<Vec<u8>> {
        let response = match file.export_format() {
            Some((mime, _)) => {
                let url = format!("{}/files/{}/export", self.base_url, file.id);
                self.send(&file.id, &url, &[("mimeType", mime)]).await?
            },
            None => {
                let url = format!("{}/files/{}", self.base_url, file.id);
                self.send(&file.id, &url, &[("alt", "media"), ("supportsAllDrives", "true")])
                    .await?
            },
        };

        let response = check_status(&file.id, response)?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| DocflowError::source_unavailable(&file.id, e))?;
        Ok(bytes.to_vec())
    }

    async fn send(&self, locator: &str, url: &str, query: &[(&str, &str)]) -> Result<Response> {
        self.client
            .get(url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| DocflowError::source_unavailable(locator, e))
    }
}

fn check_status(locator: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(DocflowError::source_unavailable(locator, format!("Drive returned HTTP {status}")))
    }
}

impl std::fmt::Debug for DriveClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn file(name: &str, mime: &str) -> DriveFile {
        DriveFile {
            id: "f1".to_string(),
            name: name.to_string(),
            mime_type: mime.to_string(),
            created_time: Some("2023-01-01T00:00:00.000Z".to_string()),
            modified_time: None,
            trashed: false,
        }
    }

    #[test]
    fn test_extension() {
        assert_eq!(file("Report.PDF", "application/pdf").extension(), "pdf");
        assert_eq!(file("archive.tar.gz", "application/gzip").extension(), "gz");
        assert_eq!(file("README", "text/plain").extension(), "");
        assert_eq!(file(".bashrc", "text/plain").extension(), "");
        assert_eq!(file("notes.v1/2", "text/plain").extension(), "");
        assert_eq!(file("backup.2024\\01", "text/plain").extension(), "");
        assert_eq!(file("draft.", "text/plain").extension(), "");
        assert_eq!(file("Plan", "application/vnd.google-apps.document").extension(), "txt");
    }

    #[test]
    fn test_downloadable() {
        assert!(file("a.txt", "text/plain").is_downloadable());
        assert!(!file("dir", FOLDER_MIME_TYPE).is_downloadable());
        assert!(!file("form", "application/vnd.google-apps.form").is_downloadable());
        assert!(file("sheet", "application/vnd.google-apps.spreadsheet").is_downloadable());
    }

    #[test]
    fn test_timestamps_skip_missing() {
        assert_eq!(file("a.txt", "text/plain").timestamps(), vec!["2023-01-01T00:00:00.000Z"]);
    }

    #[test]
    fn test_deserialize_camel_case() {
        let file: DriveFile = serde_json::from_str(
            r#"{"id": "abc", "name": "n.md", "mimeType": "text/markdown", "modifiedTime": "2023-05-05T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(file.mime_type, "text/markdown");
        assert_eq!(file.modified_time.as_deref(), Some("2023-05-05T00:00:00Z"));
        assert!(!file.trashed);
    }
}
