// ⚠️ Engine Errors
// The one user-visible failure path is NoTradingHistory; the rest guard lookups
// the loader cannot rule out on its own.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReturnsError {
    /// No trading date on or before the computed start date
    #[error("Requested period for {ticker} not found ({timeframe})")]
    NoTradingHistory { ticker: String, timeframe: String },

    #[error("Unknown ticker: {0}")]
    UnknownTicker(String),

    #[error("Unknown customer: {0}")]
    UnknownCustomer(String),

    /// The as-of end date has no close price for this ticker
    #[error("No close price for {ticker} on {date}")]
    MissingClose { ticker: String, date: NaiveDate },

    /// A zero start price leaves the return undefined
    #[error("Start price of {ticker} on {date} is zero")]
    ZeroStartPrice { ticker: String, date: NaiveDate },

    #[error("Unknown timeframe '{0}' (expected one of: 1 day, 5 days, 6 months, 1 year)")]
    UnknownTimeframe(String),
}

pub type ReturnsResult<T> = std::result::Result<T, ReturnsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_trading_history_message_names_ticker_and_period() {
        let err = ReturnsError::NoTradingHistory {
            ticker: "NDQ".to_string(),
            timeframe: "6 months".to_string(),
        };

        assert_eq!(err.to_string(), "Requested period for NDQ not found (6 months)");
    }

    #[test]
    fn test_missing_close_message() {
        let err = ReturnsError::MissingClose {
            ticker: "ETHI".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        };

        assert_eq!(err.to_string(), "No close price for ETHI on 2024-12-31");
    }
}
