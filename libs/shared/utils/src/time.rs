//! Fixed-format parsing of calendar dates and clock times.
//!
//! Accepted shapes are exactly `YYYY-MM-DD`, 24-hour `HH:MM`, and the two
//! joined by one space. No locale handling and no offsets.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use thiserror::Error;

use shared_models::scheduling::{CLOCK_FORMAT, DATE_FORMAT};
use shared_models::SchedulingError;

static DATE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date pattern"));
static CLOCK_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2}:[0-9]{2}$").expect("valid clock pattern"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeFormatError {
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid time '{0}', expected HH:MM")]
    InvalidTime(String),
}

impl From<TimeFormatError> for SchedulingError {
    fn from(error: TimeFormatError) -> Self {
        SchedulingError::InvalidArgument(error.to_string())
    }
}

pub fn parse_date(text: &str) -> Result<NaiveDate, TimeFormatError> {
    if !DATE_SHAPE.is_match(text) {
        return Err(TimeFormatError::InvalidDate(text.to_string()));
    }

    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|_| TimeFormatError::InvalidDate(text.to_string()))
}

pub fn parse_clock_time(text: &str) -> Result<NaiveTime, TimeFormatError> {
    if !CLOCK_SHAPE.is_match(text) {
        return Err(TimeFormatError::InvalidTime(text.to_string()));
    }

    NaiveTime::parse_from_str(text, CLOCK_FORMAT)
        .map_err(|_| TimeFormatError::InvalidTime(text.to_string()))
}

pub fn parse_date_time(date_text: &str, time_text: &str) -> Result<NaiveDateTime, TimeFormatError> {
    Ok(NaiveDateTime::new(parse_date(date_text)?, parse_clock_time(time_text)?))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(CLOCK_FORMAT).to_string()
}
