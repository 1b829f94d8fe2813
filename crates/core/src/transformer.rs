// crates/core/src/transformer.rs

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::ai_client::{AiClient, ChatMessage, ChatRequest};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

const HUMOR_PROMPT: &str = "This is a bot that makes up creative and humorous reasons for \
people being out of the office. Each out-of-office message should be converted to a single \
creative and humorous reason.";

/// Rewrites a piece of text. May fail; see [`transform_or_original`].
pub trait TextTransformer: Send + Sync {
    fn transform(&self, text: &str) -> Result<String>;
}

/// Returns text unchanged. Used when no completion backend is configured.
pub struct Passthrough;

impl TextTransformer for Passthrough {
    fn transform(&self, text: &str) -> Result<String> {
        Ok(text.to_string())
    }
}

/// Asks a chat model for a humorous version of an out-of-office message.
pub struct HumorTransformer<C: AiClient> {
    client: C,
    model: String,
}

impl<C: AiClient> HumorTransformer<C> {
    pub fn new(client: C, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

impl<C: AiClient> TextTransformer for HumorTransformer<C> {
    fn transform(&self, text: &str) -> Result<String> {
        debug!("making '{}' funny", text);

        let request = ChatRequest::new(
            self.model.clone(),
            vec![ChatMessage::system(HUMOR_PROMPT), ChatMessage::user(text)],
        )
        .with_temperature(0.7);

        let response = self.client.chat(request)?;
        let content = response
            .first_content()
            .filter(|c| !c.trim().is_empty())
            .context("no content in chat response")?;

        debug!("here it is, but funny: {}", content);
        Ok(content.to_string())
    }
}

/// Transform `text`, falling back to `text` itself on any failure.
pub fn transform_or_original(transformer: &dyn TextTransformer, text: &str) -> String {
    match transformer.transform(text) {
        Ok(out) => out,
        Err(e) => {
            warn!("text transform failed, using original: {:#}", e);
            text.to_string()
        }
    }
}
