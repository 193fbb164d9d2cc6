// 📈 Instrument Return Calculator - start/end prices for one ticker
//
// Pipeline per query:
//   lineage (merge renamed histories) → calendar (align start date)
//   → closes (end on the as-of date, start on the aligned date)
//   → splits (restate the start close for splits inside the window)
//
// The end close is never split-adjusted: current prices are already post-split.

use crate::calendar::CalendarIndex;
use crate::config::ReturnsConfig;
use crate::dataset::Dataset;
use crate::error::{ReturnsError, ReturnsResult};
use crate::lineage::LineageResolver;
use crate::models::AdjustedPriceWindow;
use crate::splits::SplitAdjuster;
use crate::timeframe::Timeframe;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

/// Decimal places kept on percentage returns
pub const RETURN_DP: u32 = 10;

/// Percentage return from `start` to `end`: (end / start - 1) * 100, to RETURN_DP places.
/// None when `start` is zero.
pub fn price_return(end: Decimal, start: Decimal) -> Option<Decimal> {
    let ratio = end.checked_div(start)?;
    Some(((ratio - Decimal::ONE) * Decimal::ONE_HUNDRED).round_dp(RETURN_DP))
}

/// Price return of one instrument over one timeframe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstrumentReturn {
    pub ticker: String,
    pub timeframe: Timeframe,
    pub window: AdjustedPriceWindow,
    pub return_pct: Decimal,
}

impl InstrumentReturn {
    pub fn summary(&self) -> String {
        format!(
            "{} over {} ({} to {}): {:.2}%",
            self.ticker, self.timeframe, self.window.start_date, self.window.end_date, self.return_pct
        )
    }
}

// ============================================================================
// RETURNS ENGINE
// ============================================================================

pub struct ReturnsEngine<'a> {
    dataset: &'a Dataset,
    config: &'a ReturnsConfig,
}

impl<'a> ReturnsEngine<'a> {
    pub fn new(dataset: &'a Dataset, config: &'a ReturnsConfig) -> Self {
        ReturnsEngine { dataset, config }
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn config(&self) -> &'a ReturnsConfig {
        self.config
    }

    /// Resolve the split-adjusted start and end closes of `ticker` over `timeframe`
    pub fn price_window(&self, ticker: &str, timeframe: Timeframe) -> ReturnsResult<AdjustedPriceWindow> {
        let end_date = self.config.as_of_date;
        let requested_start = timeframe.start_date(end_date);

        let lineage = LineageResolver::new(self.dataset, self.config.rename_policy).resolve(ticker);
        if lineage.prices.is_empty() {
            return Err(ReturnsError::UnknownTicker(ticker.to_string()));
        }
        if lineage.is_renamed() {
            debug!(ticker, counterparts = ?lineage.counterparts, "using merged rename history");
        }

        // Weekend or holiday: fall back to the last close before it
        let start_date = if lineage.prices.contains_key(&requested_start) {
            requested_start
        } else {
            let calendar = CalendarIndex::new(lineage.prices.keys().copied());
            let aligned = calendar
                .align(requested_start)
                .ok_or_else(|| ReturnsError::NoTradingHistory {
                    ticker: ticker.to_string(),
                    timeframe: timeframe.to_string(),
                })?;
            debug!(ticker, %requested_start, %aligned, trading_days = calendar.len(), "aligned start date");
            aligned
        };

        let end_price = *lineage
            .prices
            .get(&end_date)
            .ok_or_else(|| ReturnsError::MissingClose {
                ticker: ticker.to_string(),
                date: end_date,
            })?;
        let raw_start_price = *lineage
            .prices
            .get(&start_date)
            .ok_or_else(|| ReturnsError::MissingClose {
                ticker: ticker.to_string(),
                date: start_date,
            })?;

        let aliases = lineage.aliases();
        let start_price = SplitAdjuster::new(self.dataset).adjust_price_for_aliases(
            &aliases,
            start_date,
            end_date,
            raw_start_price,
        );

        debug!(
            ticker,
            timeframe = %timeframe,
            %requested_start,
            %start_date,
            %end_date,
            %raw_start_price,
            %start_price,
            %end_price,
            "resolved price window"
        );

        Ok(AdjustedPriceWindow {
            ticker: ticker.to_string(),
            aliases,
            start_date,
            end_date,
            raw_start_price,
            start_price,
            end_price,
        })
    }

    /// Price return of a single instrument
    pub fn instrument_return(&self, ticker: &str, timeframe: Timeframe) -> ReturnsResult<InstrumentReturn> {
        let window = self.price_window(ticker, timeframe)?;
        let return_pct = price_return(window.end_price, window.start_price).ok_or_else(|| {
            ReturnsError::ZeroStartPrice {
                ticker: ticker.to_string(),
                date: window.start_date,
            }
        })?;

        Ok(InstrumentReturn {
            ticker: ticker.to_string(),
            timeframe,
            window,
            return_pct,
        })
    }
}
