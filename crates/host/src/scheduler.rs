// crates/host/src/scheduler.rs

//! Daily "who is out" digest posted to every channel with someone out.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, TimeZone};
use chrono_tz::Tz;
use ooobot_core::IntervalStore;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::state::AppState;

/// Local-time window, `[hour:00, hour:00 + minutes]` inclusive, during which
/// digests go out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestWindow {
    hour: u32,
    minutes: u32,
}

impl DigestWindow {
    pub fn new(hour: u32, minutes: u32) -> Self {
        Self { hour, minutes }
    }

    pub fn contains(&self, local: NaiveTime) -> bool {
        let since_midnight = local - NaiveTime::MIN;
        let open = TimeDelta::hours(i64::from(self.hour));
        let close = open + TimeDelta::minutes(i64::from(self.minutes));
        since_midnight >= open && since_midnight <= close
    }
}

/// Digest text for each channel that has at least one absence at `now`.
pub fn channel_digests<T: TimeZone>(
    store: &IntervalStore,
    now: &DateTime<T>,
) -> BTreeMap<String, String> {
    store
        .channels_out(now)
        .into_iter()
        .map(|channel| {
            let text = store.who_is_out(&channel, now);
            (channel, text)
        })
        .collect()
}

pub struct Scheduler {
    state: AppState,
    interval: Duration,
    window: DigestWindow,
    /// Local date of the last digest round.
    last_sent: Option<NaiveDate>,
}

impl Scheduler {
    pub fn new(state: AppState, interval: Duration, window: DigestWindow) -> Self {
        Self {
            state,
            interval,
            window,
            last_sent: None,
        }
    }

    /// Tick every `interval` until `shutdown` flips or its sender is dropped.
    pub fn spawn(mut self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => self.tick().await,
                    _ = shutdown.changed() => {
                        info!("digest scheduler stopping");
                        break;
                    }
                }
            }
        })
    }

    async fn tick(&mut self) {
        let now = self.state.store.now();
        self.tick_at(&now).await;
    }

    /// Send the digests if `now` is inside the window and no round has gone
    /// out yet on `now`'s local date. Returns whether a round was sent.
    pub async fn tick_at(&mut self, now: &DateTime<Tz>) -> bool {
        let today = now.date_naive();
        if !self.window.contains(now.time()) || self.last_sent == Some(today) {
            return false;
        }
        self.last_sent = Some(today);
        self.send_digests(now).await;
        true
    }

    /// Post each channel's digest. Failures are logged per channel.
    pub async fn send_digests<T: TimeZone>(&self, now: &DateTime<T>) {
        for (channel, text) in channel_digests(&self.state.store, now) {
            let message = self.state.embellish(text).await;
            if let Err(e) = self.state.slack.post_message(&channel, &message).await {
                error!("error sending message to channel {}: {:#}", channel, e);
            }
        }
    }
}
