// crates/host/src/state.rs

use std::sync::Arc;

use ooobot_core::{transform_or_original, IntervalStore, TextTransformer};
use tracing::{error, warn};

use crate::slack::SlackClient;

/// Shared by every request handler and the digest scheduler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<IntervalStore>,
    pub transformer: Arc<dyn TextTransformer>,
    pub slack: SlackClient,
}

impl AppState {
    pub fn new(
        store: Arc<IntervalStore>,
        transformer: Arc<dyn TextTransformer>,
        slack: SlackClient,
    ) -> Self {
        Self {
            store,
            transformer,
            slack,
        }
    }

    /// Run `text` through the transformer on a blocking thread.
    /// Any failure yields the original text.
    pub async fn embellish(&self, text: String) -> String {
        let transformer = Arc::clone(&self.transformer);
        let original = text.clone();
        match tokio::task::spawn_blocking(move || transform_or_original(transformer.as_ref(), &text))
            .await
        {
            Ok(out) => out,
            Err(e) => {
                warn!("transform task failed: {}", e);
                original
            }
        }
    }

    /// Post a slash-command reply, logging instead of failing.
    pub async fn reply(&self, response_url: &str, text: &str) {
        if response_url.is_empty() {
            warn!("no response_url; dropping reply {:?}", text);
            return;
        }
        if let Err(e) = self.slack.respond(response_url, text).await {
            error!("error posting reply: {:#}", e);
        }
    }

    /// `reply` on a background task.
    pub fn reply_later(&self, response_url: String, text: String) {
        let state = self.clone();
        tokio::spawn(async move {
            state.reply(&response_url, &text).await;
        });
    }
}
