//! One Slack channel as an ingestable document

use super::client::{SlackClient, SlackMessage};
use super::xml::MessageDump;
use crate::lifecycle::{Probe, SourceCollaborator};
use async_trait::async_trait;
use docflow_common::{DocflowError, Result};
use std::io::Write;
use tracing::debug;

/// Separator placed between a message and each of its thread replies
pub const REPLY_SEPARATOR: &str = " <reply> ";

/// Channel history inside the configured window
#[derive(Debug, Clone)]
pub struct SlackChannel {
    channel: String,
    client: SlackClient,
    oldest: Option<String>,
    latest: Option<String>,
    verbose: bool,
}

impl SlackChannel {
    pub fn new(
        channel: impl Into<String>,
        client: SlackClient,
        oldest: Option<String>,
        latest: Option<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            client,
            oldest,
            latest,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    async fn history(&self) -> Result<Option<Vec<SlackMessage>>> {
        self.client
            .history(&self.channel, self.oldest.as_deref(), self.latest.as_deref())
            .await
    }

    /// Append every reply of a thread to its parent's text
    async fn with_replies(&self, mut message: SlackMessage) -> Result<SlackMessage> {
        if !message.has_replies() {
            return Ok(message);
        }

        let replies = self.client.replies(&self.channel, &message.ts).await?;
        for reply in replies.iter().filter(|reply| reply.ts != message.ts) {
            message.text.push_str(REPLY_SEPARATOR);
            message.text.push_str(&reply.text);
        }
        Ok(message)
    }
}

#[async_trait]
impl SourceCollaborator for SlackChannel {
    type Payload = Vec<SlackMessage>;

    fn locator(&self) -> &str {
        &self.channel
    }

    fn extension(&self) -> &str {
        "xml"
    }

    async fn probe(&self) -> Result<Probe> {
        Ok(match self.history().await? {
            Some(messages) => Probe::present(messages.into_iter().map(|m| m.ts).collect()),
            None => Probe::absent(),
        })
    }

    async fn download(&self) -> Result<Vec<SlackMessage>> {
        if self.verbose {
            debug!(channel = %self.channel, "Fetching channel");
        }

        let messages = self.history().await?.ok_or_else(|| {
            DocflowError::source_unavailable(&self.channel, "channel_not_found")
        })?;

        let mut threaded = Vec::with_capacity(messages.len());
        for message in messages {
            threaded.push(self.with_replies(message).await?);
        }
        Ok(threaded)
    }

    fn timestamps(&self, payload: &Vec<SlackMessage>) -> Vec<String> {
        payload.iter().map(|m| m.ts.clone()).collect()
    }

    fn write_staged(&self, payload: &Vec<SlackMessage>, out: &mut dyn Write) -> Result<()> {
        let dump = MessageDump::from_texts(payload.iter().map(|m| m.text.as_str()));
        out.write_all(dump.to_xml()?.as_bytes())?;
        Ok(())
    }
}
