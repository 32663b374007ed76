//! Candle interval identifiers and bucket arithmetic.
//!
//! Fixed-length timeframes are aligned to the Unix epoch, weeks start on
//! Monday 00:00 UTC and months on the first day of the month 00:00 UTC.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate};

use crate::domain::error::SpottraderError;

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;
const WEEK_MS: i64 = 7 * DAY_MS;
/// 1970-01-05 was the first Monday after the epoch.
const MONDAY_OFFSET_MS: i64 = 4 * DAY_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Timeframe {
    Min1,
    Min3,
    Min5,
    Min15,
    Min30,
    Hour1,
    Hour2,
    Hour4,
    Hour6,
    Hour8,
    Hour12,
    Day1,
    Day3,
    Week1,
    Month1,
}

impl Timeframe {
    pub fn all() -> &'static [Timeframe] {
        &[
            Timeframe::Min1,
            Timeframe::Min3,
            Timeframe::Min5,
            Timeframe::Min15,
            Timeframe::Min30,
            Timeframe::Hour1,
            Timeframe::Hour2,
            Timeframe::Hour4,
            Timeframe::Hour6,
            Timeframe::Hour8,
            Timeframe::Hour12,
            Timeframe::Day1,
            Timeframe::Day3,
            Timeframe::Week1,
            Timeframe::Month1,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Min1 => "1m",
            Timeframe::Min3 => "3m",
            Timeframe::Min5 => "5m",
            Timeframe::Min15 => "15m",
            Timeframe::Min30 => "30m",
            Timeframe::Hour1 => "1h",
            Timeframe::Hour2 => "2h",
            Timeframe::Hour4 => "4h",
            Timeframe::Hour6 => "6h",
            Timeframe::Hour8 => "8h",
            Timeframe::Hour12 => "12h",
            Timeframe::Day1 => "1d",
            Timeframe::Day3 => "3d",
            Timeframe::Week1 => "1w",
            Timeframe::Month1 => "1M",
        }
    }

    /// Bucket length in milliseconds, or `None` for calendar months.
    pub fn fixed_millis(&self) -> Option<i64> {
        match self {
            Timeframe::Min1 => Some(MINUTE_MS),
            Timeframe::Min3 => Some(3 * MINUTE_MS),
            Timeframe::Min5 => Some(5 * MINUTE_MS),
            Timeframe::Min15 => Some(15 * MINUTE_MS),
            Timeframe::Min30 => Some(30 * MINUTE_MS),
            Timeframe::Hour1 => Some(HOUR_MS),
            Timeframe::Hour2 => Some(2 * HOUR_MS),
            Timeframe::Hour4 => Some(4 * HOUR_MS),
            Timeframe::Hour6 => Some(6 * HOUR_MS),
            Timeframe::Hour8 => Some(8 * HOUR_MS),
            Timeframe::Hour12 => Some(12 * HOUR_MS),
            Timeframe::Day1 => Some(DAY_MS),
            Timeframe::Day3 => Some(3 * DAY_MS),
            Timeframe::Week1 => Some(WEEK_MS),
            Timeframe::Month1 => None,
        }
    }

    /// Start of the bucket containing `timestamp` (ms since epoch).
    pub fn bucket_start(&self, timestamp: i64) -> i64 {
        match self {
            Timeframe::Week1 => {
                (timestamp - MONDAY_OFFSET_MS).div_euclid(WEEK_MS) * WEEK_MS + MONDAY_OFFSET_MS
            }
            Timeframe::Month1 => month_start(timestamp).unwrap_or(timestamp),
            _ => {
                let step = self.fixed_millis().unwrap_or(MINUTE_MS);
                timestamp.div_euclid(step) * step
            }
        }
    }

    /// The boundary one step after `timestamp`.
    pub fn advance(&self, timestamp: i64) -> i64 {
        match self.fixed_millis() {
            Some(step) => timestamp + step,
            None => add_one_month(timestamp).unwrap_or(i64::MAX),
        }
    }
}

fn month_start(timestamp: i64) -> Option<i64> {
    let dt = DateTime::from_timestamp_millis(timestamp)?;
    let first = NaiveDate::from_ymd_opt(dt.year(), dt.month(), 1)?;
    Some(first.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
}

/// Same day-of-month and time in the following month, clamped to the month's
/// last day (31 Jan + 1 month = 29 Feb in a leap year).
fn add_one_month(timestamp: i64) -> Option<i64> {
    let dt = DateTime::from_timestamp_millis(timestamp)?;
    let shifted = dt.checked_add_months(chrono::Months::new(1))?;
    Some(shifted.timestamp_millis())
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = SpottraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::all()
            .iter()
            .copied()
            .find(|tf| tf.as_str() == s)
            .ok_or_else(|| SpottraderError::UnsupportedTimeframe {
                timeframe: s.to_string(),
            })
    }
}
