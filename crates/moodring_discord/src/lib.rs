pub mod client;
pub mod event;

pub use client::GatewayClient;

use anyhow::{Context, Result};
use async_trait::async_trait;
use moodring_core::{ChannelId, ChannelService, ChatMessage, Window};
use serde_json::json;

use crate::event::{DiscordChannel, DiscordMessage};

/// Discord REST calls the mood pipeline needs.
pub struct DiscordRest {
    api_base: String,
    token: String,
    client: reqwest::Client,
}

impl DiscordRest {
    pub fn new(api_base: &str, token: &str) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn auth(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// Most recent messages, newest first as the API returns them.
    pub async fn get_messages(&self, channel: &ChannelId, limit: usize) -> Result<Vec<DiscordMessage>> {
        let url = format!("{}/channels/{}/messages", self.api_base, channel);
        let messages = self
            .client
            .get(&url)
            .header("Authorization", self.auth())
            .query(&[("limit", limit.to_string())])
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("GET {} failed", url))?
            .json::<Vec<DiscordMessage>>()
            .await
            .context("Invalid message history payload")?;
        Ok(messages)
    }

    pub async fn get_channel(&self, channel: &ChannelId) -> Result<DiscordChannel> {
        let url = format!("{}/channels/{}", self.api_base, channel);
        let info = self
            .client
            .get(&url)
            .header("Authorization", self.auth())
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("GET {} failed", url))?
            .json::<DiscordChannel>()
            .await
            .context("Invalid channel payload")?;
        Ok(info)
    }

    pub async fn set_topic(&self, channel: &ChannelId, topic: &str) -> Result<()> {
        let url = format!("{}/channels/{}", self.api_base, channel);
        self.client
            .patch(&url)
            .header("Authorization", self.auth())
            .json(&json!({ "topic": topic }))
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("PATCH {} failed", url))?;
        Ok(())
    }
}

#[async_trait]
impl ChannelService for DiscordRest {
    async fn fetch_recent(&self, channel: &ChannelId, limit: usize) -> Result<Vec<ChatMessage>> {
        let newest_first: Vec<ChatMessage> = self
            .get_messages(channel, limit)
            .await?
            .into_iter()
            .map(ChatMessage::from)
            .collect();
        Ok(Window::from_newest_first(newest_first, limit).messages().to_vec())
    }

    async fn read_topic(&self, channel: &ChannelId) -> Result<Option<String>> {
        Ok(self.get_channel(channel).await?.topic)
    }

    async fn write_topic(&self, channel: &ChannelId, topic: &str) -> Result<()> {
        self.set_topic(channel, topic).await
    }
}
