//! HTTP front end for the out-of-office bot: slash-command endpoints, Slack
//! replies, and the daily digest scheduler.

pub mod config;
pub mod log;
pub mod scheduler;
pub mod server;
pub mod slack;
pub mod state;

pub use config::Options;
pub use scheduler::{channel_digests, DigestWindow, Scheduler};
pub use server::{build_router, serve, SlashCommand};
pub use slack::SlackClient;
pub use state::AppState;
