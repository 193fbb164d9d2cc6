// ✂️ Split Adjuster - restate historical prices and share counts across splits
//
// Only splits strictly inside the interval count: a split effective exactly on
// either boundary is left alone. Qualifying splits compound in stored order.

use crate::dataset::Dataset;
use crate::models::SplitEvent;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

/// Splits effective strictly between `start` and `end`, in stored order
pub fn splits_within(splits: &[SplitEvent], start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = &SplitEvent> {
    splits
        .iter()
        .filter(move |split| start < split.effective_date && split.effective_date < end)
}

/// Scale `price` (or a position value) by from/to for every split inside (start, end)
pub fn adjust_price(splits: &[SplitEvent], start: NaiveDate, end: NaiveDate, price: Decimal) -> Decimal {
    splits_within(splits, start, end).fold(price, |adjusted, split| split.ratio.restate_price(adjusted))
}

/// Scale `shares` by to/from for every split inside (start, end)
pub fn restate_shares(splits: &[SplitEvent], start: NaiveDate, end: NaiveDate, shares: Decimal) -> Decimal {
    splits_within(splits, start, end).fold(shares, |restated, split| split.ratio.restate_shares(restated))
}

// ============================================================================
// SPLIT ADJUSTER (dataset-backed)
// ============================================================================

pub struct SplitAdjuster<'a> {
    dataset: &'a Dataset,
}

impl<'a> SplitAdjuster<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        SplitAdjuster { dataset }
    }

    /// Adjust a price for one ticker's splits
    pub fn adjust_price(&self, ticker: &str, start: NaiveDate, end: NaiveDate, price: Decimal) -> Decimal {
        let adjusted = adjust_price(self.dataset.splits_for(ticker), start, end, price);
        if adjusted != price {
            debug!(ticker, %start, %end, %price, %adjusted, "split-adjusted price");
        }
        adjusted
    }

    /// Adjust a price for the splits of every alias in turn
    pub fn adjust_price_for_aliases(&self, aliases: &[String], start: NaiveDate, end: NaiveDate, price: Decimal) -> Decimal {
        aliases
            .iter()
            .filter(|alias| self.dataset.has_splits(alias))
            .fold(price, |adjusted, alias| self.adjust_price(alias, start, end, adjusted))
    }

    /// Share count held at `end` for `shares` bought on `purchase_date`
    pub fn restate_shares_for_aliases(
        &self,
        aliases: &[String],
        purchase_date: NaiveDate,
        end: NaiveDate,
        shares: Decimal,
    ) -> Decimal {
        aliases.iter().fold(shares, |restated, alias| {
            restate_shares(self.dataset.splits_for(alias), purchase_date, end, restated)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SplitRatio;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn split(on: NaiveDate, from: u32, to: u32) -> SplitEvent {
        SplitEvent {
            effective_date: on,
            ratio: SplitRatio::new(from, to).unwrap(),
        }
    }

    #[test]
    fn test_split_inside_window_scales_price() {
        let splits = vec![split(date(2024, 3, 15), 1, 5)];
        let adjusted = adjust_price(&splits, date(2024, 1, 1), date(2024, 12, 31), dec!(126.93));

        assert_eq!(adjusted, dec!(25.386));
    }

    #[test]
    fn test_split_on_boundaries_not_applied() {
        let start = date(2024, 1, 1);
        let end = date(2024, 12, 31);

        let on_start = vec![split(start, 1, 2)];
        let on_end = vec![split(end, 1, 2)];

        assert_eq!(adjust_price(&on_start, start, end, dec!(100)), dec!(100));
        assert_eq!(adjust_price(&on_end, start, end, dec!(100)), dec!(100));
    }

    #[test]
    fn test_split_outside_window_ignored() {
        let splits = vec![split(date(2023, 6, 1), 1, 2), split(date(2025, 2, 1), 1, 2)];
        assert_eq!(adjust_price(&splits, date(2024, 1, 1), date(2024, 12, 31), dec!(100)), dec!(100));
    }

    #[test]
    fn test_two_splits_compound() {
        let splits = vec![split(date(2024, 3, 1), 1, 2), split(date(2024, 9, 1), 1, 2)];
        let adjusted = adjust_price(&splits, date(2024, 1, 1), date(2024, 12, 31), dec!(100));

        assert_eq!(adjusted, dec!(25));
    }

    #[test]
    fn test_reverse_split_raises_price() {
        let splits = vec![split(date(2024, 3, 1), 10, 1)];
        assert_eq!(adjust_price(&splits, date(2024, 1, 1), date(2024, 12, 31), dec!(2)), dec!(20));
    }

    #[test]
    fn test_restate_shares() {
        let splits = vec![split(date(2024, 6, 1), 2, 3)];

        let restated = restate_shares(&splits, date(2023, 6, 1), date(2024, 12, 31), dec!(10));
        assert_eq!(restated, dec!(15));

        // Bought after the split: already post-split shares
        let later = restate_shares(&splits, date(2024, 7, 1), date(2024, 12, 31), dec!(10));
        assert_eq!(later, dec!(10));
    }

    #[test]
    fn test_adjuster_applies_every_alias() {
        let data = Dataset::new()
            .with_split("OLD", split(date(2024, 3, 1), 1, 2))
            .with_split("NEW", split(date(2024, 9, 1), 1, 2));
        let adjuster = SplitAdjuster::new(&data);
        let aliases = vec!["NEW".to_string(), "OLD".to_string()];

        let adjusted = adjuster.adjust_price_for_aliases(&aliases, date(2024, 1, 1), date(2024, 12, 31), dec!(100));
        assert_eq!(adjusted, dec!(25));

        let shares = adjuster.restate_shares_for_aliases(&aliases, date(2023, 1, 1), date(2024, 12, 31), dec!(10));
        assert_eq!(shares, dec!(40));
    }

    #[test]
    fn test_adjuster_without_splits_is_identity() {
        let data = Dataset::new();
        let adjuster = SplitAdjuster::new(&data);

        assert_eq!(adjuster.adjust_price("TEST", date(2024, 1, 1), date(2024, 12, 31), dec!(42.5)), dec!(42.5));
    }
}
