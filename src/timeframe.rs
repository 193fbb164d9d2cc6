// ⏱️ Timeframes - named lookback windows
// Every window is measured back from the fixed as-of date in whole calendar days.

use crate::error::ReturnsError;
use chrono::{Duration, NaiveDate};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeframe {
    OneDay,
    FiveDays,
    SixMonths,
    OneYear,
}

impl Timeframe {
    /// All timeframes, shortest first
    pub const ALL: [Timeframe; 4] = [
        Timeframe::OneDay,
        Timeframe::FiveDays,
        Timeframe::SixMonths,
        Timeframe::OneYear,
    ];

    /// Label accepted on the command line, e.g. "6 months"
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::OneDay => "1 day",
            Timeframe::FiveDays => "5 days",
            Timeframe::SixMonths => "6 months",
            Timeframe::OneYear => "1 year",
        }
    }

    /// Lookback length in calendar days
    pub fn days(&self) -> i64 {
        match self {
            Timeframe::OneDay => 1,
            Timeframe::FiveDays => 5,
            Timeframe::SixMonths => 182,
            Timeframe::OneYear => 365,
        }
    }

    /// Unaligned start of the window ending on `as_of`
    pub fn start_date(&self, as_of: NaiveDate) -> NaiveDate {
        as_of - Duration::days(self.days())
    }
}

impl FromStr for Timeframe {
    type Err = ReturnsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Timeframe::ALL
            .iter()
            .copied()
            .find(|tf| tf.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ReturnsError::UnknownTimeframe(s.to_string()))
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Timeframe {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}
