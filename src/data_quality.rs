// ✅ Data Quality Engine - semantic checks over a loaded dataset
//
// The loader already rejects rows it cannot parse. This pass looks at the tables
// as a whole: prices that cannot anchor a return, renames that lead nowhere,
// lots that cannot be valued. Critical issues stop the run before any return is
// computed; warnings and info are logged and reported.

use crate::config::{RenamePolicy, ReturnsConfig};
use crate::dataset::Dataset;
use crate::lineage::LineageResolver;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{info, warn};

// ============================================================================
// QUALITY REPORT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Critical, // A return computed from this data would be wrong or impossible
    Warning,  // Data is questionable; some queries may fail or mislead
    Info,     // Data is valid but unused
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityIssue {
    pub severity: Severity,
    /// Table the issue was found in: prices, splits, ticker_changes, portfolios
    pub table: String,
    /// Ticker or customer the issue concerns
    pub subject: String,
    pub issue: String,
    pub recommendation: String,
    /// Set when the issue only affects one customer's portfolio
    pub customer_id: Option<String>,
}

impl QualityIssue {
    fn new(severity: Severity, table: &str, subject: &str, issue: String, recommendation: &str) -> Self {
        QualityIssue {
            severity,
            table: table.to_string(),
            subject: subject.to_string(),
            issue,
            recommendation: recommendation.to_string(),
            customer_id: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct QualityReport {
    pub issues: Vec<QualityIssue>,
}

impl QualityReport {
    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn summary(&self) -> String {
        format!(
            "Issues: {} ({} critical, {} warnings, {} info)",
            self.issues.len(),
            self.count(Severity::Critical),
            self.count(Severity::Warning),
            self.count(Severity::Info)
        )
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has_critical_issues(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Critical)
    }

    pub fn critical_issues(&self) -> impl Iterator<Item = &QualityIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Critical)
    }

    /// Critical issues that invalidate a query. Customer-scoped issues only block
    /// a portfolio query for that customer; instrument queries pass `None`.
    pub fn blocking_issues<'r>(&'r self, customer_id: Option<&'r str>) -> impl Iterator<Item = &'r QualityIssue> + 'r {
        self.critical_issues()
            .filter(move |i| match i.customer_id.as_deref() {
                None => true,
                Some(owner) => Some(owner) == customer_id,
            })
    }
}

// ============================================================================
// DATA QUALITY ENGINE
// ============================================================================

#[derive(Debug, Default)]
pub struct DataQualityEngine;

impl DataQualityEngine {
    pub fn new() -> Self {
        DataQualityEngine
    }

    /// Run every check and log each issue found
    pub fn validate(&self, dataset: &Dataset, config: &ReturnsConfig) -> QualityReport {
        let mut issues = Vec::new();

        // Rule 1: Close prices are positive
        issues.extend(self.validate_prices(dataset));

        // Rule 2: Splits belong to priced tickers
        issues.extend(self.validate_splits(dataset));

        // Rule 3: Renames link distinct, priced tickers
        issues.extend(self.validate_ticker_changes(dataset, config.rename_policy));

        // Rule 4: Lots are valuable and valuable as of the end date
        issues.extend(self.validate_portfolios(dataset, config));

        let report = QualityReport { issues };

        for issue in &report.issues {
            match issue.severity {
                Severity::Critical | Severity::Warning => warn!(
                    severity = ?issue.severity,
                    table = %issue.table,
                    subject = %issue.subject,
                    "{}",
                    issue.issue
                ),
                Severity::Info => info!(table = %issue.table, subject = %issue.subject, "{}", issue.issue),
            }
        }

        report
    }

    fn validate_prices(&self, dataset: &Dataset) -> Vec<QualityIssue> {
        let mut issues = Vec::new();

        for ticker in dataset.tickers() {
            let Some(series) = dataset.price_series(ticker) else {
                continue;
            };
            let mut bad: Vec<_> = series
                .iter()
                .filter(|(_, close)| **close <= Decimal::ZERO)
                .map(|(date, _)| *date)
                .collect();
            if bad.is_empty() {
                continue;
            }
            bad.sort_unstable();

            issues.push(QualityIssue::new(
                Severity::Critical,
                "prices",
                ticker,
                format!(
                    "{} non-positive close price(s), first on {}",
                    bad.len(),
                    bad[0]
                ),
                "Correct or remove the close prices; a zero start price leaves returns undefined",
            ));
        }

        issues
    }

    fn validate_splits(&self, dataset: &Dataset) -> Vec<QualityIssue> {
        dataset
            .split_tickers()
            .into_iter()
            .filter(|ticker| !dataset.has_prices(ticker))
            .map(|ticker| {
                QualityIssue::new(
                    Severity::Info,
                    "splits",
                    ticker,
                    format!("{} split record(s) for a ticker with no prices", dataset.splits_for(ticker).len()),
                    "Splits only apply through a priced ticker or one of its renames",
                )
            })
            .collect()
    }

    fn validate_ticker_changes(&self, dataset: &Dataset, policy: RenamePolicy) -> Vec<QualityIssue> {
        let mut issues = Vec::new();
        let mut unpriced: BTreeSet<&str> = BTreeSet::new();

        let single_hop = LineageResolver::new(dataset, RenamePolicy::SingleHop);
        let transitive = LineageResolver::new(dataset, RenamePolicy::Transitive);

        for ticker in dataset.renamed_tickers() {
            let changes = dataset.changes_for(ticker);

            if changes.iter().any(|c| c.other_ticker == ticker) {
                issues.push(QualityIssue::new(
                    Severity::Warning,
                    "ticker_changes",
                    ticker,
                    "Ticker renamed to itself".to_string(),
                    "Remove the self-referencing change row",
                ));
            }

            for change in changes {
                if change.other_ticker != ticker && !dataset.has_prices(&change.other_ticker) {
                    unpriced.insert(change.other_ticker.as_str());
                }
            }

            if policy == RenamePolicy::SingleHop {
                let direct = single_hop.counterparts(ticker);
                let reachable = transitive.counterparts(ticker);
                if reachable.len() > direct.len() {
                    let unreached: Vec<&str> = reachable
                        .iter()
                        .filter(|t| !direct.contains(t))
                        .map(String::as_str)
                        .collect();
                    issues.push(QualityIssue::new(
                        Severity::Warning,
                        "ticker_changes",
                        ticker,
                        format!("Rename chain reaches {} beyond one hop", unreached.join(", ")),
                        "Set rename_policy to \"transitive\" to merge the whole chain",
                    ));
                }
            }
        }

        for ticker in unpriced {
            issues.push(QualityIssue::new(
                Severity::Warning,
                "ticker_changes",
                ticker,
                "Rename counterpart has no price history".to_string(),
                "Add prices for the counterpart or drop the change row",
            ));
        }

        issues
    }

    fn validate_portfolios(&self, dataset: &Dataset, config: &ReturnsConfig) -> Vec<QualityIssue> {
        let mut issues = Vec::new();
        let resolver = LineageResolver::new(dataset, config.rename_policy);

        for customer_id in dataset.customers() {
            let Some(holdings) = dataset.holdings(customer_id) else {
                continue;
            };
            let first = issues.len();

            for (ticker, lots) in holdings {
                let subject = format!("{}/{}", customer_id, ticker);

                for lot in lots {
                    if lot.shares == 0 {
                        issues.push(QualityIssue::new(
                            Severity::Critical,
                            "portfolios",
                            &subject,
                            format!("Lot bought {} has zero shares", lot.purchase_date),
                            "Remove the lot or correct its share count",
                        ));
                    }
                    if lot.cost_basis < Decimal::ZERO {
                        issues.push(QualityIssue::new(
                            Severity::Critical,
                            "portfolios",
                            &subject,
                            format!("Lot bought {} has negative cost basis {}", lot.purchase_date, lot.cost_basis),
                            "Correct the cost basis",
                        ));
                    }
                    if lot.purchase_date > config.as_of_date {
                        issues.push(QualityIssue::new(
                            Severity::Warning,
                            "portfolios",
                            &subject,
                            format!(
                                "Lot bought {} is after the as-of date {}",
                                lot.purchase_date, config.as_of_date
                            ),
                            "Check the as-of date; the lot is handled by the post_period_lots policy",
                        ));
                    }
                }

                let lineage = resolver.resolve(ticker);
                if lineage.prices.is_empty() {
                    issues.push(QualityIssue::new(
                        Severity::Critical,
                        "portfolios",
                        &subject,
                        format!("Held ticker {} has no price history under any alias", ticker),
                        "Add prices for the ticker or a ticker change linking it to a priced symbol",
                    ));
                } else if !lineage.prices.contains_key(&config.as_of_date) {
                    issues.push(QualityIssue::new(
                        Severity::Warning,
                        "portfolios",
                        &subject,
                        format!("Held ticker {} has no close on {}", ticker, config.as_of_date),
                        "Portfolio returns for this customer will fail until the close is added",
                    ));
                }
            }

            for issue in &mut issues[first..] {
                issue.customer_id = Some(customer_id.to_string());
            }
        }

        issues
    }
}
