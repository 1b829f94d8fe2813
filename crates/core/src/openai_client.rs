// crates/core/src/openai_client.rs

//! OpenAI chat-completions client.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use tracing::debug;

use crate::ai_client::{AiClient, ChatRequest, ChatResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking client for any OpenAI-compatible `/chat/completions` endpoint.
///
/// Callers on an async runtime should run it on a blocking thread.
pub struct OpenAiClient {
    client: Client,
    url: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: &str, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        })
    }
}

impl AiClient for OpenAiClient {
    fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        debug!(url = %self.url, model = %request.model, "sending chat completion");

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .context("failed to send chat completion request")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body: String = resp.text().unwrap_or_default().chars().take(500).collect();
            anyhow::bail!("chat completion failed: HTTP {} - {}", status, body);
        }

        resp.json()
            .context("failed to parse chat completion response")
    }
}
