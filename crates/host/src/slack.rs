// crates/host/src/slack.rs

//! Outbound Slack calls: slash-command replies and channel messages.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_API_BASE: &str = "https://slack.com/api";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Serialize)]
struct TextPayload<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Fire-and-forget delivery. Callers log failures; nothing is retried.
#[derive(Clone)]
pub struct SlackClient {
    http: Client,
    token: Option<String>,
    api_base: String,
}

impl SlackClient {
    pub fn new(token: Option<String>) -> Result<Self> {
        Self::with_api_base(token, DEFAULT_API_BASE)
    }

    pub fn with_api_base(token: Option<String>, api_base: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build Slack HTTP client")?;

        Ok(Self {
            http,
            token: token.filter(|t| !t.trim().is_empty()),
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Reply to a slash command through its `response_url`.
    pub async fn respond(&self, response_url: &str, text: &str) -> Result<()> {
        debug!(response_url, "posting slash-command reply");

        let resp = self
            .http
            .post(response_url)
            .json(&TextPayload { text })
            .send()
            .await
            .context("failed to post to response_url")?;

        if !resp.status().is_success() {
            anyhow::bail!("response_url rejected reply: HTTP {}", resp.status());
        }
        Ok(())
    }

    /// Post `text` to `channel` with `chat.postMessage`.
    pub async fn post_message(&self, channel: &str, text: &str) -> Result<()> {
        let token = self
            .token
            .as_deref()
            .context("no Slack OAuth token configured")?;

        let resp = self
            .http
            .post(format!("{}/chat.postMessage", self.api_base))
            .bearer_auth(token)
            .json(&PostMessage { channel, text })
            .send()
            .await
            .context("failed to send chat.postMessage")?;

        if !resp.status().is_success() {
            anyhow::bail!("chat.postMessage failed: HTTP {}", resp.status());
        }

        let body: ApiResponse = resp
            .json()
            .await
            .context("failed to parse chat.postMessage response")?;
        if !body.ok {
            anyhow::bail!(
                "chat.postMessage failed: {}",
                body.error.as_deref().unwrap_or("unknown error")
            );
        }
        Ok(())
    }
}
