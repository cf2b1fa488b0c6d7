use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bot::MessageSender;

#[derive(Debug, Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Thin `chat.postMessage` client authenticated with the bot token.
pub struct SlackClient {
    client: Client,
    api_base_url: String,
    bot_token: SecretString,
}

impl SlackClient {
    pub fn new(api_base_url: &str, bot_token: SecretString) -> Self {
        Self {
            client: Client::new(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            bot_token,
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}", self.api_base_url, method)
    }
}

#[async_trait]
impl MessageSender for SlackClient {
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<()> {
        let url = self.endpoint("chat.postMessage");
        debug!("posting reply channel={} text_len={}", channel_id, text.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.bot_token.expose_secret())
            .json(&PostMessageRequest {
                channel: channel_id,
                text,
            })
            .send()
            .await
            .map_err(|e| anyhow!("failed to call {}: {}", url, e))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "chat.postMessage returned status {}",
                response.status()
            ));
        }

        let body: PostMessageResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("failed to read chat.postMessage response: {}", e))?;
        if !body.ok {
            return Err(anyhow!(
                "chat.postMessage rejected the reply: {}",
                body.error.as_deref().unwrap_or("unknown_error")
            ));
        }
        Ok(())
    }
}
