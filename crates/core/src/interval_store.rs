// crates/core/src/interval_store.rs

//! In-memory store of out-of-office intervals.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use crate::error::ParseError;
use crate::types::{render_digest, Absence, DATE_FORMAT};

/// Timezone every date is anchored to.
pub const ORGANIZATION_TZ: Tz = chrono_tz::America::Los_Angeles;

static DATE_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern compiles"));

/// Append-only set of absences behind a single lock.
///
/// Every read and write takes the same mutex for the duration of the call.
/// Nothing here performs I/O, so callers can hold an `Arc<IntervalStore>` from
/// any number of threads or tasks.
pub struct IntervalStore {
    absences: Mutex<Vec<Absence>>,
    tz: Tz,
}

impl IntervalStore {
    pub fn new(tz: Tz) -> Self {
        Self {
            absences: Mutex::new(Vec::new()),
            tz,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Current instant in the store's timezone.
    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }

    /// Current calendar date in the store's timezone.
    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Record that `subject` is out from `start` through `end` (inclusive).
    ///
    /// Both dates must be `YYYY-MM-DD`. An end date before the start date is
    /// rejected. Returns the stored record.
    pub fn add(
        &self,
        channel: &str,
        subject: &str,
        start: &str,
        end: &str,
    ) -> Result<Absence, ParseError> {
        let mut absences = self.lock();

        let first = parse_date(start)?;
        let last = parse_date(end)?;
        if last < first {
            return Err(ParseError::InvertedRange {
                start: first,
                end: last,
            });
        }

        let absence = Absence {
            channel: channel.to_string(),
            subject: subject.to_string(),
            start: self.start_of_day(first, start)?,
            end: self.end_of_day(last, end)?,
        };
        absences.push(absence.clone());
        drop(absences);

        info!(
            channel,
            subject,
            start,
            end,
            "added <@{}> out from {} to {}",
            subject,
            start,
            end
        );

        Ok(absence)
    }

    /// Every absence strictly containing `instant`, in insertion order.
    ///
    /// An absence that starts or ends exactly at `instant` is not included.
    pub fn query<T: TimeZone>(&self, instant: &DateTime<T>) -> Vec<Absence> {
        let at = instant.with_timezone(&self.tz);
        self.lock()
            .iter()
            .filter(|a| a.start < at && at < a.end)
            .cloned()
            .collect()
    }

    /// `query` restricted to one channel.
    pub fn query_by_channel<T: TimeZone>(
        &self,
        channel: &str,
        instant: &DateTime<T>,
    ) -> Vec<Absence> {
        let at = instant.with_timezone(&self.tz);
        self.lock()
            .iter()
            .filter(|a| a.channel == channel && a.start < at && at < a.end)
            .cloned()
            .collect()
    }

    /// Channels with at least one absence active at `instant`.
    pub fn channels_out<T: TimeZone>(&self, instant: &DateTime<T>) -> BTreeSet<String> {
        self.query(instant).into_iter().map(|a| a.channel).collect()
    }

    /// Digest text for `channel`: one line per active absence, or the
    /// "nobody out" message.
    pub fn who_is_out<T: TimeZone>(&self, channel: &str, instant: &DateTime<T>) -> String {
        render_digest(&self.query_by_channel(channel, instant))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Absence>> {
        // Records are pushed whole, so a poisoned guard still holds valid data.
        self.absences.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Earliest local midnight of `date`.
    fn start_of_day(&self, date: NaiveDate, input: &str) -> Result<DateTime<Tz>, ParseError> {
        self.tz
            .from_local_datetime(&date.and_time(NaiveTime::MIN))
            .earliest()
            .ok_or_else(|| ParseError::date(input, format!("no local midnight in {}", self.tz)))
    }

    /// Latest local 23:59:59 of `date`, whatever the length of that day.
    fn end_of_day(&self, date: NaiveDate, input: &str) -> Result<DateTime<Tz>, ParseError> {
        date.and_hms_opt(23, 59, 59)
            .and_then(|local| self.tz.from_local_datetime(&local).latest())
            .ok_or_else(|| ParseError::date(input, format!("no local 23:59:59 in {}", self.tz)))
    }
}

impl Default for IntervalStore {
    fn default() -> Self {
        Self::new(ORGANIZATION_TZ)
    }
}

fn parse_date(input: &str) -> Result<NaiveDate, ParseError> {
    if !DATE_SHAPE.is_match(input) {
        return Err(ParseError::date(input, "expected YYYY-MM-DD"));
    }
    NaiveDate::parse_from_str(input, DATE_FORMAT).map_err(|e| ParseError::date(input, e.to_string()))
}
