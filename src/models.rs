// 📦 Data Model - CSV rows and the in-memory types the engine consumes
//
// Rows arrive as strings exactly as they sit in the source files. Each row type
// knows how to parse itself into domain values, so malformed input fails at the
// boundary with the offending field named.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::str::FromStr;

/// Date format of price and purchase dates ("2024-12-31")
pub const TRADE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Date format of split and ticker-change effective dates ("31/12/2024")
pub const EVENT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Closing prices of one ticker, keyed by trading date. No ordering is implied.
pub type PriceSeries = HashMap<NaiveDate, Decimal>;

// ============================================================================
// CSV ROWS
// ============================================================================

/// prices.csv: ticker,date,close_price
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PriceRow {
    pub ticker: String,
    pub date: String,
    pub close_price: String,
}

/// splits.csv: ticker,effective_date,from_quantity,to_quantity
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SplitRow {
    pub ticker: String,
    pub effective_date: String,
    pub from_quantity: String,
    pub to_quantity: String,
}

/// ticker_changes.csv: old_ticker,effective_date,new_ticker
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TickerChangeRow {
    pub old_ticker: String,
    pub effective_date: String,
    pub new_ticker: String,
}

/// portfolios.csv: customer_id,ticker,purchase_date,shares,cost_basis
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PortfolioRow {
    pub customer_id: String,
    pub ticker: String,
    pub purchase_date: String,
    pub shares: String,
    pub cost_basis: String,
}

pub fn parse_trade_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), TRADE_DATE_FORMAT)
        .with_context(|| format!("Invalid date '{}' (expected YYYY-MM-DD)", value))
}

pub fn parse_event_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), EVENT_DATE_FORMAT)
        .with_context(|| format!("Invalid effective date '{}' (expected DD/MM/YYYY)", value))
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal> {
    Decimal::from_str(value.trim())
        .with_context(|| format!("Invalid {} '{}' (expected a decimal number)", field, value))
}

fn parse_positive_u32(field: &str, value: &str) -> Result<NonZeroU32> {
    let parsed: u32 = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid {} '{}' (expected an integer)", field, value))?;
    NonZeroU32::new(parsed).ok_or_else(|| anyhow!("{} must be positive, got 0", field))
}

impl PriceRow {
    pub fn parse(&self) -> Result<(String, NaiveDate, Decimal)> {
        let date = parse_trade_date(&self.date)?;
        let close = parse_decimal("close_price", &self.close_price)?;
        if close <= Decimal::ZERO {
            return Err(anyhow!(
                "close_price must be positive, got {} for {} on {}",
                close,
                self.ticker,
                self.date
            ));
        }
        Ok((self.ticker.trim().to_string(), date, close))
    }
}

impl SplitRow {
    pub fn parse(&self) -> Result<(String, SplitEvent)> {
        let effective_date = parse_event_date(&self.effective_date)?;
        let from = parse_positive_u32("from_quantity", &self.from_quantity)?;
        let to = parse_positive_u32("to_quantity", &self.to_quantity)?;
        Ok((
            self.ticker.trim().to_string(),
            SplitEvent {
                effective_date,
                ratio: SplitRatio { from, to },
            },
        ))
    }
}

impl TickerChangeRow {
    pub fn parse(&self) -> Result<(String, NaiveDate, String)> {
        let effective_date = parse_event_date(&self.effective_date)?;
        Ok((
            self.old_ticker.trim().to_string(),
            effective_date,
            self.new_ticker.trim().to_string(),
        ))
    }
}

impl PortfolioRow {
    pub fn parse(&self) -> Result<(String, String, Lot)> {
        let purchase_date = parse_trade_date(&self.purchase_date)?;
        let shares: u64 = self
            .shares
            .trim()
            .parse()
            .with_context(|| format!("Invalid shares '{}' (expected an integer)", self.shares))?;
        if shares == 0 {
            return Err(anyhow!("shares must be positive, got 0"));
        }
        let cost_basis = parse_decimal("cost_basis", &self.cost_basis)?;
        if cost_basis < Decimal::ZERO {
            return Err(anyhow!("cost_basis must not be negative, got {}", cost_basis));
        }
        Ok((
            self.customer_id.trim().to_string(),
            self.ticker.trim().to_string(),
            Lot {
                purchase_date,
                shares,
                cost_basis,
            },
        ))
    }
}

// ============================================================================
// DOMAIN TYPES
// ============================================================================

/// A holder of `from` shares before the split holds `to` shares after it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SplitRatio {
    pub from: NonZeroU32,
    pub to: NonZeroU32,
}

impl SplitRatio {
    /// Returns None when either side is zero
    pub fn new(from: u32, to: u32) -> Option<Self> {
        Some(SplitRatio {
            from: NonZeroU32::new(from)?,
            to: NonZeroU32::new(to)?,
        })
    }

    /// Restate a pre-split price (or position value) in post-split terms: value * from / to.
    /// Multiplying before dividing keeps whole-share products exact.
    pub fn restate_price(&self, value: Decimal) -> Decimal {
        value * Decimal::from(self.from.get()) / Decimal::from(self.to.get())
    }

    /// Restate a pre-split share count in post-split terms: shares * to / from
    pub fn restate_shares(&self, shares: Decimal) -> Decimal {
        shares * Decimal::from(self.to.get()) / Decimal::from(self.from.get())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitEvent {
    pub effective_date: NaiveDate,
    pub ratio: SplitRatio,
}

/// One side of a rename. The log stores both directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickerChange {
    pub effective_date: NaiveDate,
    pub other_ticker: String,
}

/// One purchase record within a holding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lot {
    pub purchase_date: NaiveDate,
    pub shares: u64,
    /// Price per share paid at purchase
    pub cost_basis: Decimal,
}

impl Lot {
    pub fn new(purchase_date: NaiveDate, shares: u64, cost_basis: Decimal) -> Self {
        Lot {
            purchase_date,
            shares,
            cost_basis,
        }
    }

    /// Cash paid for the lot
    pub fn cost(&self) -> Decimal {
        self.cost_basis * Decimal::from(self.shares)
    }
}

/// Resolved start/end prices of one ticker after lineage and split adjustment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjustedPriceWindow {
    pub ticker: String,
    /// Every ticker treated as the same instrument, the queried one last
    pub aliases: Vec<String>,
    /// Start date after calendar alignment
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Close on start_date before split adjustment
    pub raw_start_price: Decimal,
    pub start_price: Decimal,
    pub end_price: Decimal,
}
