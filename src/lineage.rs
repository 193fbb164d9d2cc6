// 🔗 Lineage Resolver - one continuous history across ticker renames
//
// "OLD renamed to NEW" means the two symbols are the same instrument. Resolving a
// ticker yields every equivalent symbol plus a price series that unions all of
// their histories. The union is built into a fresh series owned by the caller;
// the dataset itself is never touched.

use crate::config::RenamePolicy;
use crate::dataset::Dataset;
use crate::models::PriceSeries;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// A ticker together with the symbols it is equivalent to
#[derive(Debug, Clone, PartialEq)]
pub struct Lineage {
    pub ticker: String,

    /// Rename counterparts in merge order (the queried ticker excluded)
    pub counterparts: Vec<String>,

    /// Own closes overlaid with every counterpart's closes
    pub prices: PriceSeries,
}

impl Lineage {
    /// Counterparts followed by the queried ticker itself
    pub fn aliases(&self) -> Vec<String> {
        let mut aliases = self.counterparts.clone();
        aliases.push(self.ticker.clone());
        aliases
    }

    pub fn is_renamed(&self) -> bool {
        !self.counterparts.is_empty()
    }
}

pub struct LineageResolver<'a> {
    dataset: &'a Dataset,
    policy: RenamePolicy,
}

impl<'a> LineageResolver<'a> {
    pub fn new(dataset: &'a Dataset, policy: RenamePolicy) -> Self {
        LineageResolver { dataset, policy }
    }

    /// Symbols equivalent to `ticker`, in change-log order, without repeats.
    ///
    /// Effective dates are not consulted: a rename links the full histories.
    pub fn counterparts(&self, ticker: &str) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(ticker);
        let mut found = Vec::new();

        match self.policy {
            RenamePolicy::SingleHop => {
                for change in self.dataset.changes_for(ticker) {
                    if seen.insert(change.other_ticker.as_str()) {
                        found.push(change.other_ticker.clone());
                    }
                }
            }
            RenamePolicy::Transitive => {
                let mut queue: VecDeque<&str> = VecDeque::from([ticker]);
                while let Some(current) = queue.pop_front() {
                    for change in self.dataset.changes_for(current) {
                        let other = change.other_ticker.as_str();
                        if seen.insert(other) {
                            found.push(other.to_string());
                            queue.push_back(other);
                        }
                    }
                }
            }
        }

        found
    }

    /// Resolve `ticker` into its lineage.
    ///
    /// The ticker's own closes come first; each counterpart's closes are laid over
    /// them in order, so on a shared date the later series wins.
    pub fn resolve(&self, ticker: &str) -> Lineage {
        let counterparts = self.counterparts(ticker);
        let mut prices = self
            .dataset
            .price_series(ticker)
            .cloned()
            .unwrap_or_default();

        for other in &counterparts {
            if let Some(series) = self.dataset.price_series(other) {
                debug!(ticker, alias = %other, closes = series.len(), "merging renamed ticker history");
                prices.extend(series.iter().map(|(date, close)| (*date, *close)));
            }
        }

        Lineage {
            ticker: ticker.to_string(),
            counterparts,
            prices,
        }
    }
}
