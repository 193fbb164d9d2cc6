// 🗂️ Dataset - the four input tables as one immutable snapshot
//
// Built once (by the loader or by hand in tests), then only ever read.
// Every engine operation borrows it, so no query can leak state into another.

use crate::models::{Lot, PriceSeries, SplitEvent, TickerChange};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// Holdings of one customer: ticker → purchase lots
pub type Holdings = BTreeMap<String, Vec<Lot>>;

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    prices: HashMap<String, PriceSeries>,
    splits: HashMap<String, Vec<SplitEvent>>,
    ticker_changes: HashMap<String, Vec<TickerChange>>,
    portfolios: HashMap<String, Holdings>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // MUTATION (load time only)
    // ========================================================================

    /// Record a close price. Returns the price it replaced, if any.
    pub fn insert_price(&mut self, ticker: &str, date: NaiveDate, close: Decimal) -> Option<Decimal> {
        self.prices
            .entry(ticker.to_string())
            .or_default()
            .insert(date, close)
    }

    /// Record a split. A second split for the same ticker and date replaces the first.
    pub fn insert_split(&mut self, ticker: &str, split: SplitEvent) -> bool {
        let events = self.splits.entry(ticker.to_string()).or_default();
        if let Some(existing) = events
            .iter_mut()
            .find(|e| e.effective_date == split.effective_date)
        {
            *existing = split;
            return true;
        }
        events.push(split);
        false
    }

    /// Record a rename in both directions
    pub fn record_ticker_change(&mut self, old_ticker: &str, effective_date: NaiveDate, new_ticker: &str) {
        self.ticker_changes
            .entry(old_ticker.to_string())
            .or_default()
            .push(TickerChange {
                effective_date,
                other_ticker: new_ticker.to_string(),
            });
        self.ticker_changes
            .entry(new_ticker.to_string())
            .or_default()
            .push(TickerChange {
                effective_date,
                other_ticker: old_ticker.to_string(),
            });
    }

    pub fn add_lot(&mut self, customer_id: &str, ticker: &str, lot: Lot) {
        self.portfolios
            .entry(customer_id.to_string())
            .or_default()
            .entry(ticker.to_string())
            .or_default()
            .push(lot);
    }

    // Builder pattern for fixtures

    pub fn with_price(mut self, ticker: &str, date: NaiveDate, close: Decimal) -> Self {
        self.insert_price(ticker, date, close);
        self
    }

    pub fn with_split(mut self, ticker: &str, split: SplitEvent) -> Self {
        self.insert_split(ticker, split);
        self
    }

    pub fn with_ticker_change(mut self, old_ticker: &str, effective_date: NaiveDate, new_ticker: &str) -> Self {
        self.record_ticker_change(old_ticker, effective_date, new_ticker);
        self
    }

    pub fn with_lot(mut self, customer_id: &str, ticker: &str, lot: Lot) -> Self {
        self.add_lot(customer_id, ticker, lot);
        self
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn price_series(&self, ticker: &str) -> Option<&PriceSeries> {
        self.prices.get(ticker)
    }

    pub fn has_prices(&self, ticker: &str) -> bool {
        self.prices.get(ticker).map_or(false, |s| !s.is_empty())
    }

    /// Splits of a ticker in stored order (empty when it never split)
    pub fn splits_for(&self, ticker: &str) -> &[SplitEvent] {
        self.splits.get(ticker).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_splits(&self, ticker: &str) -> bool {
        !self.splits_for(ticker).is_empty()
    }

    /// Rename counterparts of a ticker in log order
    pub fn changes_for(&self, ticker: &str) -> &[TickerChange] {
        self.ticker_changes
            .get(ticker)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn holdings(&self, customer_id: &str) -> Option<&Holdings> {
        self.portfolios.get(customer_id)
    }

    /// All priced tickers, sorted
    pub fn tickers(&self) -> Vec<&str> {
        let mut tickers: Vec<&str> = self.prices.keys().map(String::as_str).collect();
        tickers.sort_unstable();
        tickers
    }

    /// Tickers carrying split records, sorted
    pub fn split_tickers(&self) -> Vec<&str> {
        let mut tickers: Vec<&str> = self.splits.keys().map(String::as_str).collect();
        tickers.sort_unstable();
        tickers
    }

    /// Tickers appearing in the change log, sorted
    pub fn renamed_tickers(&self) -> Vec<&str> {
        let mut tickers: Vec<&str> = self.ticker_changes.keys().map(String::as_str).collect();
        tickers.sort_unstable();
        tickers
    }

    /// All customers, sorted
    pub fn customers(&self) -> Vec<&str> {
        let mut customers: Vec<&str> = self.portfolios.keys().map(String::as_str).collect();
        customers.sort_unstable();
        customers
    }

    pub fn price_count(&self) -> usize {
        self.prices.values().map(|s| s.len()).sum()
    }

    pub fn split_count(&self) -> usize {
        self.splits.values().map(|s| s.len()).sum()
    }

    /// Rename events (each stored twice, counted once)
    pub fn ticker_change_count(&self) -> usize {
        self.ticker_changes.values().map(|c| c.len()).sum::<usize>() / 2
    }

    pub fn lot_count(&self) -> usize {
        self.portfolios
            .values()
            .flat_map(|h| h.values())
            .map(|lots| lots.len())
            .sum()
    }
}
