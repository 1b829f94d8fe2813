// crates/core/src/types.rs

use std::fmt;

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;

/// Date layout used for command input and rendered output.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Digest text when nobody in a channel is out.
pub const NOBODY_OUT: &str = "No one is currently out of office.";

/// A recorded interval during which a subject is out of office.
///
/// `start` is local midnight of the first day; `end` is local 23:59:59 of the
/// last day. Both are in the organizational timezone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Absence {
    pub channel: String,
    pub subject: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl Absence {
    /// First absent calendar day.
    pub fn first_day(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// Last absent calendar day.
    pub fn last_day(&self) -> NaiveDate {
        self.end.date_naive()
    }

    /// True when the absence covers exactly one calendar day.
    pub fn is_single_day(&self) -> bool {
        self.first_day() == self.last_day()
    }
}

impl fmt::Display for Absence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self.first_day().format(DATE_FORMAT);
        if self.is_single_day() {
            return write!(f, "<@{}> out of the office on {}.", self.subject, start);
        }
        write!(
            f,
            "<@{}> out of the office from {} to {}.",
            self.subject,
            start,
            self.last_day().format(DATE_FORMAT)
        )
    }
}

/// Renders the digest for a set of absences, one line each.
pub fn render_digest<'a>(absences: impl IntoIterator<Item = &'a Absence>) -> String {
    let lines: Vec<String> = absences.into_iter().map(ToString::to_string).collect();
    if lines.is_empty() {
        return NOBODY_OUT.to_string();
    }
    lines.join("\n")
}
