//! Slack connector
//!
//! Each configured channel becomes one document: its history inside the
//! `oldest`/`latest` window, with thread replies folded into their parent
//! message, staged as `<channel>.xml`.

pub mod client;
pub mod source;
pub mod xml;

pub use client::{SlackClient, SlackMessage, DEFAULT_SLACK_API_URL};
pub use source::{SlackChannel, REPLY_SEPARATOR};
pub use xml::MessageDump;

use crate::cleanup::Cleanup;
use crate::config::StandardConnectorConfig;
use crate::connector::{cleanup_download_dir, dedupe_locators, Connector};
use crate::lifecycle::StagedDoc;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docflow_common::dates::{to_epoch_string, validate_date_arg};
use docflow_common::{DocflowError, Result};
use std::sync::Arc;
use tracing::info;

pub type SlackDoc = StagedDoc<SlackChannel>;

/// Which channels to read and with which credentials
#[derive(Clone)]
pub struct SlackConfig {
    pub channels: Vec<String>,
    pub token: String,
    pub oldest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
    pub verbose: bool,
    pub api_url: String,
}

impl SlackConfig {
    /// Validate channels and the time window.
    ///
    /// Bounds accept `%Y-%m-%d`, `%Y-%m-%dT%H:%M:%S`, `%Y-%m-%dT%H:%M:%S%z`,
    /// RFC 3339 or epoch seconds. Any unparseable bound, or `oldest` after
    /// `latest`, is rejected.
    pub fn new(
        channels: Vec<String>,
        token: impl Into<String>,
        oldest: Option<&str>,
        latest: Option<&str>,
    ) -> Result<Self> {
        let channels: Vec<String> = channels
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if channels.is_empty() {
            return Err(DocflowError::invalid_config("at least one Slack channel is required"));
        }

        let token = token.into();
        if token.trim().is_empty() {
            return Err(DocflowError::invalid_config("Slack token must not be empty"));
        }

        let oldest = oldest.map(|v| validate_date_arg("oldest", v)).transpose()?;
        let latest = latest.map(|v| validate_date_arg("latest", v)).transpose()?;
        if let (Some(oldest), Some(latest)) = (oldest, latest) {
            if oldest > latest {
                return Err(DocflowError::invalid_config(format!(
                    "oldest ({oldest}) is after latest ({latest})"
                )));
            }
        }

        Ok(Self {
            channels,
            token,
            oldest,
            latest,
            verbose: false,
            api_url: DEFAULT_SLACK_API_URL.to_string(),
        })
    }

    /// Split a comma separated channel list
    pub fn parse_channels(channels: &str) -> Vec<String> {
        channels
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("channels", &self.channels)
            .field("token", &"<redacted>")
            .field("oldest", &self.oldest)
            .field("latest", &self.latest)
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Enumerates one [`SlackDoc`] per channel
#[derive(Debug)]
pub struct SlackConnector {
    settings: Arc<StandardConnectorConfig>,
    config: SlackConfig,
    client: SlackClient,
}

impl SlackConnector {
    pub fn new(settings: StandardConnectorConfig, config: SlackConfig) -> Result<Self> {
        settings.validate()?;
        let client = SlackClient::new(&config.api_url, &config.token)?;
        Ok(Self {
            settings: Arc::new(settings),
            config,
            client,
        })
    }

    pub fn config(&self) -> &SlackConfig {
        &self.config
    }
}

#[async_trait]
impl Connector for SlackConnector {
    type Doc = SlackDoc;

    fn name(&self) -> &'static str {
        "slack"
    }

    fn settings(&self) -> &StandardConnectorConfig {
        &self.settings
    }

    async fn ingest_docs(&self) -> Result<Vec<SlackDoc>> {
        let oldest = self.config.oldest.as_ref().map(to_epoch_string);
        let latest = self.config.latest.as_ref().map(to_epoch_string);

        let channels = dedupe_locators(self.config.channels.clone(), |c| c.as_str());
        info!(count = channels.len(), "Enumerated Slack channels");

        Ok(channels
            .into_iter()
            .map(|channel| {
                let source =
                    SlackChannel::new(channel, self.client.clone(), oldest.clone(), latest.clone())
                        .with_verbose(self.config.verbose);
                StagedDoc::new(source, self.settings.clone())
            })
            .collect())
    }
}

impl Cleanup for SlackConnector {
    fn cleanup(&self) {
        cleanup_download_dir(&self.settings);
    }
}
