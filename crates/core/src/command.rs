// crates/core/src/command.rs

//! Slash-command text grammar.
//!
//! Accepted forms:
//! - `""` -> today through today
//! - `"START"` -> START through START
//! - `"START END"` -> START through END
//!
//! Tokens are separated by exactly one space. Dates are not validated here.

use chrono::NaiveDate;

use crate::error::ParseError;
use crate::types::DATE_FORMAT;

/// Unvalidated start/end date strings taken from command text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

impl DateRange {
    fn new(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
        }
    }
}

/// Split command text into a date range. `today` fills in for empty text.
pub fn parse_command(text: &str, today: NaiveDate) -> Result<DateRange, ParseError> {
    if text.is_empty() {
        let today = today.format(DATE_FORMAT).to_string();
        return Ok(DateRange::new(&today, &today));
    }

    let tokens: Vec<&str> = text.split(' ').collect();
    match tokens.as_slice() {
        [start, end] => Ok(DateRange::new(start, end)),
        [day] => Ok(DateRange::new(day, day)),
        _ => Err(ParseError::Grammar(text.to_string())),
    }
}
