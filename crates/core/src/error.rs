// crates/core/src/error.rs

use chrono::NaiveDate;
use thiserror::Error;

/// Failures raised while turning command text into a stored absence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A start or end string is not a `YYYY-MM-DD` calendar date.
    #[error("invalid date {input:?}: {reason}")]
    Date { input: String, reason: String },

    /// The end date falls before the start date.
    #[error("end date {end} is before start date {start}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    /// The command text matches no known token pattern.
    #[error("invalid text: {0}")]
    Grammar(String),
}

impl ParseError {
    pub(crate) fn date(input: &str, reason: impl Into<String>) -> Self {
        Self::Date {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}
