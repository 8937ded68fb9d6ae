//! Slack Web API client
//!
//! Only the two read endpoints the connector needs, both cursor paginated.

use crate::config::http_client;
use docflow_common::{DocflowError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// API Client Constants
// ============================================================================

/// Slack Web API root
pub const DEFAULT_SLACK_API_URL: &str = "https://slack.com/api";

/// Messages requested per page
const PAGE_LIMIT: &str = "200";

/// Error code Slack returns for unknown or inaccessible channels
const CHANNEL_NOT_FOUND: &str = "channel_not_found";

/// A message as returned by `conversations.history` / `conversations.replies`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackMessage {
    /// Epoch seconds with microsecond fraction, also the message id
    pub ts: String,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub reply_count: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
}

impl SlackMessage {
    pub fn has_replies(&self) -> bool {
        self.reply_count > 0
    }
}

#[derive(Debug, Deserialize)]
struct MessagePage {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    messages: Vec<SlackMessage>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

/// Authenticated client for one workspace token
#[derive(Clone)]
pub struct SlackClient {
    client: Client,
    base_url: String,
    token: String,
}

impl SlackClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// All messages of a channel inside the optional window.
    ///
    /// `Ok(None)` when Slack reports the channel does not exist.
    pub async fn history(
        &self,
        channel: &str,
        oldest: Option<&str>,
        latest: Option<&str>,
    ) -> Result<Option<Vec<SlackMessage>>> {
        let mut params = vec![("channel", channel.to_string())];
        if let Some(oldest) = oldest {
            params.push(("oldest", oldest.to_string()));
        }
        if let Some(latest) = latest {
            params.push(("latest", latest.to_string()));
        }

        match self.paginate("conversations.history", channel, params).await {
            Err(DocflowError::SourceUnavailable { reason, .. }) if reason == CHANNEL_NOT_FOUND => {
                Ok(None)
            },
            other => other.map(Some),
        }
    }

    /// The thread started by `ts`. Slack includes the parent message first.
    pub async fn replies(&self, channel: &str, ts: &str) -> Result<Vec<SlackMessage>> {
        let params = vec![("channel", channel.to_string()), ("ts", ts.to_string())];
        self.paginate("conversations.replies", channel, params).await
    }

    async fn paginate(
        &self,
        method: &str,
        channel: &str,
        params: Vec<(&str, String)>,
    ) -> Result<Vec<SlackMessage>> {
        let url = format!("{}/{}", self.base_url, method);
        let mut messages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut query = params.clone();
            query.push(("limit", PAGE_LIMIT.to_string()));
            if let Some(cursor) = &cursor {
                query.push(("cursor", cursor.clone()));
            }

            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .query(&query)
                .send()
                .await
                .map_err(|e| DocflowError::source_unavailable(channel, e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(DocflowError::source_unavailable(
                    channel,
                    format!("{method} returned HTTP {status}"),
                ));
            }

            let page: MessagePage = response
                .json()
                .await
                .map_err(|e| DocflowError::source_unavailable(channel, e))?;

            if !page.ok {
                let error = page.error.unwrap_or_else(|| "unknown_error".to_string());
                return Err(DocflowError::source_unavailable(channel, error));
            }

            debug!(method, channel, count = page.messages.len(), "Fetched Slack page");
            messages.extend(page.messages);

            cursor = page
                .response_metadata
                .map(|meta| meta.next_cursor)
                .filter(|next| !next.is_empty());

            if !page.has_more || cursor.is_none() {
                break;
            }
        }

        Ok(messages)
    }
}

impl std::fmt::Debug for SlackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_message_defaults() {
        let msg: SlackMessage = serde_json::from_str(r#"{"ts": "1512085950.000216"}"#).unwrap();
        assert_eq!(msg.text, "");
        assert!(!msg.has_replies());
        assert!(msg.thread_ts.is_none());
    }

    #[test]
    fn test_page_without_metadata() {
        let page: MessagePage = serde_json::from_str(
            r#"{"ok": true, "messages": [{"ts": "1.0", "text": "hi", "reply_count": 2}]}"#,
        )
        .unwrap();
        assert!(page.ok);
        assert!(!page.has_more);
        assert!(page.messages[0].has_replies());
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = SlackClient::new("http://localhost/", "xoxb-secret").unwrap();
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("xoxb-secret"));
        assert_eq!(client.base_url(), "http://localhost");
    }
}
