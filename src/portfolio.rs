// 💼 Portfolio Return Aggregator - investment return of a customer's holdings
//
// Each lot lands in exactly one bucket relative to its ticker's price window:
//
//   PrePeriod   purchase_date <= start_date          → start value + current value
//   InPeriod    start_date < purchase_date <= end    → contributions + current value
//   PostPeriod  purchase_date > end_date             → per PostPeriodLots policy
//
// Start and current values use split-restated share counts; contributions are the
// cash actually paid (shares bought × cost basis).
//
// Formula:
//   dollar_return = current - start - contributions
//   return_pct    = dollar_return / start * 100
// With nothing held at the start, contributions become the base.

use crate::config::{PostPeriodLots, ReturnsConfig};
use crate::dataset::Dataset;
use crate::error::{ReturnsError, ReturnsResult};
use crate::models::{AdjustedPriceWindow, Lot};
use crate::returns::{ReturnsEngine, RETURN_DP};
use crate::splits::SplitAdjuster;
use crate::timeframe::Timeframe;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

// ============================================================================
// LOT CLASSIFICATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LotPeriod {
    PrePeriod,
    InPeriod,
    PostPeriod,
}

pub fn classify_lot(purchase_date: NaiveDate, start_date: NaiveDate, end_date: NaiveDate) -> LotPeriod {
    if purchase_date <= start_date {
        LotPeriod::PrePeriod
    } else if purchase_date <= end_date {
        LotPeriod::InPeriod
    } else {
        LotPeriod::PostPeriod
    }
}

// ============================================================================
// RESULTS
// ============================================================================

/// Subtotals of one ticker within a portfolio
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoldingReturn {
    pub ticker: String,
    pub window: AdjustedPriceWindow,
    /// Split-restated shares counted in current value
    pub shares: Decimal,
    pub start_value: Decimal,
    pub current_value: Decimal,
    pub contributions: Decimal,
    pub pre_period_lots: usize,
    pub in_period_lots: usize,
    pub post_period_lots: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortfolioReturn {
    pub customer_id: String,
    pub timeframe: Timeframe,
    pub start_total: Decimal,
    pub current_total: Decimal,
    pub contribution_total: Decimal,
    pub dollar_return: Decimal,
    pub return_pct: Decimal,
    pub holdings: Vec<HoldingReturn>,
}

impl PortfolioReturn {
    pub fn summary(&self) -> String {
        format!(
            "{} over {}: start ${:.2}, contributions ${:.2}, current ${:.2}, return ${:.2} ({:.2}%)",
            self.customer_id,
            self.timeframe,
            self.start_total,
            self.contribution_total,
            self.current_total,
            self.dollar_return,
            self.return_pct
        )
    }
}

/// Dollar and percentage return from the three totals.
///
/// A zero start total falls back to contributions as the base; with no
/// contributions either, both figures are zero. Percentages keep RETURN_DP places.
pub fn investment_return(start_total: Decimal, current_total: Decimal, contribution_total: Decimal) -> (Decimal, Decimal) {
    if start_total.is_zero() {
        if contribution_total > Decimal::ZERO {
            let dollar_return = current_total - contribution_total;
            (dollar_return, (dollar_return / contribution_total * Decimal::ONE_HUNDRED).round_dp(RETURN_DP))
        } else {
            (Decimal::ZERO, Decimal::ZERO)
        }
    } else {
        let dollar_return = current_total - start_total - contribution_total;
        (dollar_return, (dollar_return / start_total * Decimal::ONE_HUNDRED).round_dp(RETURN_DP))
    }
}

// ============================================================================
// PORTFOLIO AGGREGATOR
// ============================================================================

pub struct PortfolioAggregator<'a> {
    returns: ReturnsEngine<'a>,
}

impl<'a> PortfolioAggregator<'a> {
    pub fn new(dataset: &'a Dataset, config: &'a ReturnsConfig) -> Self {
        PortfolioAggregator {
            returns: ReturnsEngine::new(dataset, config),
        }
    }

    /// Roll every lot of one ticker into its subtotals
    fn holding_return(&self, ticker: &str, lots: &[Lot], window: AdjustedPriceWindow) -> HoldingReturn {
        let adjuster = SplitAdjuster::new(self.returns.dataset());
        let policy = self.returns.config().post_period_lots;

        let mut holding = HoldingReturn {
            ticker: ticker.to_string(),
            shares: Decimal::ZERO,
            start_value: Decimal::ZERO,
            current_value: Decimal::ZERO,
            contributions: Decimal::ZERO,
            pre_period_lots: 0,
            in_period_lots: 0,
            post_period_lots: 0,
            window,
        };

        for lot in lots {
            let period = classify_lot(lot.purchase_date, holding.window.start_date, holding.window.end_date);
            let shares = adjuster.restate_shares_for_aliases(
                &holding.window.aliases,
                lot.purchase_date,
                holding.window.end_date,
                Decimal::from(lot.shares),
            );

            match period {
                LotPeriod::PrePeriod => {
                    holding.pre_period_lots += 1;
                    // Split-adjust the whole position so whole-share products stay exact
                    holding.start_value += adjuster.adjust_price_for_aliases(
                        &holding.window.aliases,
                        holding.window.start_date,
                        holding.window.end_date,
                        holding.window.raw_start_price * shares,
                    );
                }
                LotPeriod::InPeriod => {
                    holding.in_period_lots += 1;
                    holding.contributions += lot.cost();
                }
                LotPeriod::PostPeriod => {
                    holding.post_period_lots += 1;
                    warn!(
                        ticker,
                        purchase_date = %lot.purchase_date,
                        end_date = %holding.window.end_date,
                        ?policy,
                        "lot purchased after the period end"
                    );
                    if policy == PostPeriodLots::Exclude {
                        continue;
                    }
                }
            }

            holding.shares += shares;
            holding.current_value += holding.window.end_price * shares;
        }

        holding
    }

    /// Investment return of every holding of `customer_id` over `timeframe`
    pub fn portfolio_return(&self, customer_id: &str, timeframe: Timeframe) -> ReturnsResult<PortfolioReturn> {
        let holdings = self
            .returns
            .dataset()
            .holdings(customer_id)
            .ok_or_else(|| ReturnsError::UnknownCustomer(customer_id.to_string()))?;

        let mut start_total = Decimal::ZERO;
        let mut current_total = Decimal::ZERO;
        let mut contribution_total = Decimal::ZERO;
        let mut results = Vec::with_capacity(holdings.len());

        for (ticker, lots) in holdings {
            // Each ticker aligns against its own trading calendar
            let window = self.returns.price_window(ticker, timeframe)?;
            let holding = self.holding_return(ticker, lots, window);

            start_total += holding.start_value;
            current_total += holding.current_value;
            contribution_total += holding.contributions;
            results.push(holding);
        }

        let (dollar_return, return_pct) = investment_return(start_total, current_total, contribution_total);

        info!(
            customer_id,
            timeframe = %timeframe,
            %start_total,
            %contribution_total,
            %current_total,
            %dollar_return,
            %return_pct,
            "portfolio return computed"
        );

        Ok(PortfolioReturn {
            customer_id: customer_id.to_string(),
            timeframe,
            start_total,
            current_total,
            contribution_total,
            dollar_return,
            return_pct,
            holdings: results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SplitEvent, SplitRatio};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// TEST closes at $100 on the last trading day of 2023 and at `end` a year later
    fn test_prices(end: Decimal) -> Dataset {
        Dataset::new()
            .with_price("TEST", date(2023, 12, 31), dec!(100))
            .with_price("TEST", date(2024, 12, 31), end)
    }

    fn run(data: &Dataset, config: &ReturnsConfig, customer_id: &str) -> PortfolioReturn {
        PortfolioAggregator::new(data, config)
            .portfolio_return(customer_id, Timeframe::OneYear)
            .unwrap()
    }

    #[test]
    fn test_classify_lot_boundaries() {
        let start = date(2024, 1, 1);
        let end = date(2024, 12, 31);

        assert_eq!(classify_lot(start, start, end), LotPeriod::PrePeriod);
        assert_eq!(classify_lot(date(2024, 1, 2), start, end), LotPeriod::InPeriod);
        assert_eq!(classify_lot(end, start, end), LotPeriod::InPeriod);
        assert_eq!(classify_lot(date(2025, 1, 1), start, end), LotPeriod::PostPeriod);
    }

    #[test]
    fn test_portfolio_return() {
        // 10 shares bought before the period, price $100 → $110
        let data = test_prices(dec!(110)).with_lot("TEST001", "TEST", Lot::new(date(2023, 1, 1), 10, dec!(100)));
        let config = ReturnsConfig::default();

        let result = run(&data, &config, "TEST001");

        assert_eq!(result.start_total, dec!(1000));
        assert_eq!(result.current_total, dec!(1100));
        assert_eq!(result.contribution_total, dec!(0));
        assert_eq!(result.dollar_return, dec!(100));
        assert_eq!(result.return_pct, dec!(10));
    }

    #[test]
    fn test_portfolio_return_with_contributions() {
        // 10 shares before the period, 5 more mid-period at $105, ends at $110
        let data = test_prices(dec!(110))
            .with_lot("TEST002", "TEST", Lot::new(date(2023, 6, 1), 10, dec!(100)))
            .with_lot("TEST002", "TEST", Lot::new(date(2024, 6, 1), 5, dec!(105)));
        let config = ReturnsConfig::default();

        let result = run(&data, &config, "TEST002");

        assert_eq!(result.start_total, dec!(1000));
        assert_eq!(result.contribution_total, dec!(525));
        assert_eq!(result.current_total, dec!(1650));
        assert_eq!(result.dollar_return, dec!(125));
        assert_eq!(result.return_pct, dec!(12.5));

        let holding = &result.holdings[0];
        assert_eq!(holding.pre_period_lots, 1);
        assert_eq!(holding.in_period_lots, 1);
        assert_eq!(holding.shares, dec!(15));
    }

    #[test]
    fn test_portfolio_return_with_split() {
        // 2-for-1 split mid-period: 10 shares become 20, $100 start restates to $50
        let data = test_prices(dec!(55))
            .with_split(
                "TEST",
                SplitEvent {
                    effective_date: date(2024, 6, 1),
                    ratio: SplitRatio::new(1, 2).unwrap(),
                },
            )
            .with_lot("TEST003", "TEST", Lot::new(date(2023, 6, 1), 10, dec!(100)));
        let config = ReturnsConfig::default();

        let result = run(&data, &config, "TEST003");

        assert_eq!(result.holdings[0].window.start_price, dec!(50));
        assert_eq!(result.holdings[0].shares, dec!(20));
        assert_eq!(result.start_total, dec!(1000));
        assert_eq!(result.current_total, dec!(1100));
        assert_eq!(result.contribution_total, dec!(0));
        assert_eq!(result.dollar_return, dec!(100));
    }

    #[test]
    fn test_split_before_window_restates_shares_only() {
        // Split predates the window: the start close is already post-split
        let data = Dataset::new()
            .with_price("TEST", date(2023, 12, 29), dec!(50))
            .with_price("TEST", date(2024, 12, 31), dec!(55))
            .with_split(
                "TEST",
                SplitEvent {
                    effective_date: date(2023, 6, 1),
                    ratio: SplitRatio::new(1, 2).unwrap(),
                },
            )
            .with_lot("TEST005", "TEST", Lot::new(date(2023, 1, 1), 10, dec!(100)));
        let config = ReturnsConfig::default();

        let result = run(&data, &config, "TEST005");

        assert_eq!(result.holdings[0].window.start_price, dec!(50));
        assert_eq!(result.holdings[0].shares, dec!(20));
        assert_eq!(result.start_total, dec!(1000));
        assert_eq!(result.current_total, dec!(1100));
        assert_eq!(result.contribution_total, dec!(0));
    }

    #[test]
    fn test_in_period_lot_contributes_shares_actually_bought() {
        // 5 shares at $105 become 10 after the split; cash paid stays 525
        let data = test_prices(dec!(55))
            .with_split(
                "TEST",
                SplitEvent {
                    effective_date: date(2024, 6, 1),
                    ratio: SplitRatio::new(1, 2).unwrap(),
                },
            )
            .with_lot("TEST006", "TEST", Lot::new(date(2024, 3, 1), 5, dec!(105)));
        let config = ReturnsConfig::default();

        let result = run(&data, &config, "TEST006");

        assert_eq!(result.holdings[0].shares, dec!(10));
        assert_eq!(result.start_total, dec!(0));
        assert_eq!(result.contribution_total, dec!(525));
        assert_eq!(result.current_total, dec!(550));
        assert_eq!(result.dollar_return, dec!(25));
        assert_eq!(result.return_pct.round_dp(2), dec!(4.76));
    }

    #[test]
    fn test_one_for_three_split_totals_are_exact() {
        let data = test_prices(dec!(34))
            .with_split(
                "TEST",
                SplitEvent {
                    effective_date: date(2024, 5, 1),
                    ratio: SplitRatio::new(1, 3).unwrap(),
                },
            )
            .with_lot("TEST007", "TEST", Lot::new(date(2023, 6, 1), 10, dec!(100)));
        let config = ReturnsConfig::default();

        let result = run(&data, &config, "TEST007");

        assert_eq!(result.start_total, dec!(1000));
        assert_eq!(result.current_total, dec!(1020));
        assert_eq!(result.return_pct, dec!(2));
    }

    #[test]
    fn test_portfolio_return_with_ticker_change() {
        let data = Dataset::new()
            .with_price("OLD", date(2023, 12, 31), dec!(100))
            .with_price("NEW", date(2024, 12, 31), dec!(110))
            .with_ticker_change("OLD", date(2024, 6, 1), "NEW")
            .with_lot("TEST004", "OLD", Lot::new(date(2023, 6, 1), 10, dec!(100)));
        let config = ReturnsConfig::default();

        let result = run(&data, &config, "TEST004");

        assert_eq!(result.start_total, dec!(1000));
        assert_eq!(result.current_total, dec!(1100));
        assert_eq!(result.contribution_total, dec!(0));
        assert_eq!(result.dollar_return, dec!(100));
    }

    #[test]
    fn test_only_contributions_uses_contributions_as_base() {
        let data = test_prices(dec!(110)).with_lot("NEWBIE", "TEST", Lot::new(date(2024, 3, 1), 10, dec!(100)));
        let config = ReturnsConfig::default();

        let result = run(&data, &config, "NEWBIE");

        assert_eq!(result.start_total, dec!(0));
        assert_eq!(result.contribution_total, dec!(1000));
        assert_eq!(result.current_total, dec!(1100));
        assert_eq!(result.dollar_return, dec!(100));
        assert_eq!(result.return_pct, dec!(10));
    }

    #[test]
    fn test_zero_base_reports_zero_return() {
        assert_eq!(
            investment_return(Decimal::ZERO, dec!(500), Decimal::ZERO),
            (Decimal::ZERO, Decimal::ZERO)
        );
    }

    #[test]
    fn test_post_period_lot_counts_in_current_by_default() {
        let data = Dataset::new()
            .with_price("TEST", date(2023, 12, 29), dec!(100))
            .with_price("TEST", date(2024, 6, 28), dec!(110))
            .with_lot("LATE", "TEST", Lot::new(date(2023, 6, 1), 10, dec!(100)))
            .with_lot("LATE", "TEST", Lot::new(date(2024, 9, 2), 5, dec!(120)));
        let config = ReturnsConfig::default().with_as_of_date(date(2024, 6, 28));

        let result = PortfolioAggregator::new(&data, &config)
            .portfolio_return("LATE", Timeframe::SixMonths)
            .unwrap();

        assert_eq!(result.holdings[0].post_period_lots, 1);
        assert_eq!(result.start_total, dec!(1000));
        assert_eq!(result.contribution_total, dec!(0));
        assert_eq!(result.current_total, dec!(1650));
    }

    #[test]
    fn test_post_period_lot_excluded_by_policy() {
        let data = Dataset::new()
            .with_price("TEST", date(2023, 12, 29), dec!(100))
            .with_price("TEST", date(2024, 6, 28), dec!(110))
            .with_lot("LATE", "TEST", Lot::new(date(2023, 6, 1), 10, dec!(100)))
            .with_lot("LATE", "TEST", Lot::new(date(2024, 9, 2), 5, dec!(120)));
        let config = ReturnsConfig::default()
            .with_as_of_date(date(2024, 6, 28))
            .with_post_period_lots(PostPeriodLots::Exclude);

        let result = PortfolioAggregator::new(&data, &config)
            .portfolio_return("LATE", Timeframe::SixMonths)
            .unwrap();

        assert_eq!(result.current_total, dec!(1100));
        assert_eq!(result.dollar_return, dec!(100));
        assert_eq!(result.holdings[0].shares, dec!(10));
    }

    #[test]
    fn test_multiple_tickers_sum() {
        let data = test_prices(dec!(110))
            .with_price("ALT", date(2023, 12, 29), dec!(20))
            .with_price("ALT", date(2024, 12, 31), dec!(18))
            .with_lot("MIX", "TEST", Lot::new(date(2023, 1, 1), 10, dec!(90)))
            .with_lot("MIX", "ALT", Lot::new(date(2023, 1, 1), 50, dec!(25)));
        let config = ReturnsConfig::default();

        let result = run(&data, &config, "MIX");

        // TEST 1000 → 1100, ALT 1000 → 900
        assert_eq!(result.holdings.len(), 2);
        assert_eq!(result.holdings[0].ticker, "ALT");
        assert_eq!(result.start_total, dec!(2000));
        assert_eq!(result.current_total, dec!(2000));
        assert_eq!(result.dollar_return, dec!(0));
        assert_eq!(result.return_pct, dec!(0));
    }

    #[test]
    fn test_unknown_customer() {
        let data = test_prices(dec!(110));
        let config = ReturnsConfig::default();

        let err = PortfolioAggregator::new(&data, &config)
            .portfolio_return("NOBODY", Timeframe::OneYear)
            .unwrap_err();

        assert_eq!(err, ReturnsError::UnknownCustomer("NOBODY".to_string()));
    }

    #[test]
    fn test_missing_history_for_any_holding_is_fatal() {
        let data = test_prices(dec!(110))
            .with_price("IPO", date(2024, 11, 1), dec!(10))
            .with_price("IPO", date(2024, 12, 31), dec!(12))
            .with_lot("EARLY", "TEST", Lot::new(date(2023, 1, 1), 1, dec!(100)))
            .with_lot("EARLY", "IPO", Lot::new(date(2024, 11, 1), 1, dec!(10)));
        let config = ReturnsConfig::default();

        let err = PortfolioAggregator::new(&data, &config)
            .portfolio_return("EARLY", Timeframe::OneYear)
            .unwrap_err();

        assert!(matches!(err, ReturnsError::NoTradingHistory { ref ticker, .. } if ticker == "IPO"));
    }
}
