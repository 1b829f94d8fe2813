// crates/host/src/config.rs

//! Process configuration: command-line flags with environment fallbacks.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::Parser;
use ooobot_core::openai_client::DEFAULT_BASE_URL;
use ooobot_core::transformer::DEFAULT_MODEL;

use crate::scheduler::DigestWindow;

#[derive(Debug, Clone, Parser)]
#[command(name = "ooobot")]
#[command(about = "Slack slash-command bot that tracks who is out of office")]
#[command(version)]
pub struct Options {
    /// Port to listen on
    #[arg(short = 'p', long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// OpenAI API token; replies are sent verbatim when unset
    #[arg(short = 't', long = "openai-api-token", env = "OPENAI_API_KEY")]
    pub openai_api_token: Option<String>,

    /// Base URL of the chat-completions API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub openai_base_url: String,

    /// Chat model used to embellish replies
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    pub openai_model: String,

    /// Slack OAuth token used for channel digests
    #[arg(short = 's', long = "slack-oauth-token", env = "SLACK_OAUTH_TOKEN")]
    pub slack_oauth_token: Option<String>,

    /// Allowed CORS origins, comma separated (`*.example.com` matches subdomains)
    #[arg(long, env = "CORS_ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    /// Seconds between digest checks
    #[arg(long, env = "DIGEST_INTERVAL_SECS", default_value_t = 300)]
    pub digest_interval_secs: u64,

    /// Local hour at which the daily digest window opens
    #[arg(
        long,
        env = "DIGEST_HOUR",
        default_value_t = 9,
        value_parser = clap::value_parser!(u32).range(0..24)
    )]
    pub digest_hour: u32,

    /// Length of the digest window in minutes
    #[arg(long, env = "DIGEST_WINDOW_MINUTES", default_value_t = 5)]
    pub digest_window_minutes: u32,
}

impl Options {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }

    pub fn digest_interval(&self) -> Duration {
        Duration::from_secs(self.digest_interval_secs.max(1))
    }

    pub fn digest_window(&self) -> DigestWindow {
        DigestWindow::new(self.digest_hour, self.digest_window_minutes)
    }

    /// The OpenAI token, if one was given and is not blank.
    pub fn openai_token(&self) -> Option<&str> {
        self.openai_api_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}
