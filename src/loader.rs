// 📂 CSV Loader - source files → Dataset
//
// Four files, one table each:
//   prices.csv          ticker,date,close_price
//   splits.csv          ticker,effective_date,from_quantity,to_quantity
//   ticker_changes.csv  old_ticker,effective_date,new_ticker
//   portfolios.csv      customer_id,ticker,purchase_date,shares,cost_basis
//
// Any malformed row aborts the load with the file and line number attached.

use crate::config::ReturnsConfig;
use crate::dataset::Dataset;
use crate::models::{PortfolioRow, PriceRow, SplitRow, TickerChangeRow};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// What a load produced, for logging and the CLI summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub prices: usize,
    /// Rows that repeated an existing (ticker, date) and overwrote it
    pub duplicate_prices: usize,
    pub splits: usize,
    pub replaced_splits: usize,
    pub ticker_changes: usize,
    pub lots: usize,
}

// ============================================================================
// GENERIC ROW READER
// ============================================================================

/// Deserialize every row of a headed CSV and hand it to `apply`; errors carry the line number
fn for_each_row<R, T, F>(reader: R, source: &str, mut apply: F) -> Result<()>
where
    R: Read,
    T: DeserializeOwned,
    F: FnMut(T) -> Result<()>,
{
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    for (index, result) in rdr.deserialize().enumerate() {
        let line = index + 2; // 1-indexed + header row
        let row: T = result
            .with_context(|| format!("Failed to parse CSV line {} in {}", line, source))?;
        apply(row).with_context(|| format!("Invalid row at line {} in {}", line, source))?;
    }

    Ok(())
}

// ============================================================================
// TABLE LOADERS
// ============================================================================

pub fn load_prices<R: Read>(reader: R, source: &str, dataset: &mut Dataset, summary: &mut LoadSummary) -> Result<()> {
    for_each_row(reader, source, |row: PriceRow| {
        let (ticker, date, close) = row.parse()?;
        if dataset.insert_price(&ticker, date, close).is_some() {
            summary.duplicate_prices += 1;
        } else {
            summary.prices += 1;
        }
        Ok(())
    })
}

pub fn load_splits<R: Read>(reader: R, source: &str, dataset: &mut Dataset, summary: &mut LoadSummary) -> Result<()> {
    for_each_row(reader, source, |row: SplitRow| {
        let (ticker, split) = row.parse()?;
        if dataset.insert_split(&ticker, split) {
            summary.replaced_splits += 1;
        } else {
            summary.splits += 1;
        }
        Ok(())
    })
}

pub fn load_ticker_changes<R: Read>(
    reader: R,
    source: &str,
    dataset: &mut Dataset,
    summary: &mut LoadSummary,
) -> Result<()> {
    for_each_row(reader, source, |row: TickerChangeRow| {
        let (old_ticker, effective_date, new_ticker) = row.parse()?;
        dataset.record_ticker_change(&old_ticker, effective_date, &new_ticker);
        summary.ticker_changes += 1;
        Ok(())
    })
}

pub fn load_portfolios<R: Read>(
    reader: R,
    source: &str,
    dataset: &mut Dataset,
    summary: &mut LoadSummary,
) -> Result<()> {
    for_each_row(reader, source, |row: PortfolioRow| {
        let (customer_id, ticker, lot) = row.parse()?;
        dataset.add_lot(&customer_id, &ticker, lot);
        summary.lots += 1;
        Ok(())
    })
}

// ============================================================================
// FILE ENTRY POINT
// ============================================================================

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))
}

/// Load all four tables from the locations named in the config.
///
/// The price file is required. The other three may be absent: a market with no
/// splits, renames or portfolios is still a valid input for price returns.
pub fn load_dataset(config: &ReturnsConfig) -> Result<(Dataset, LoadSummary)> {
    let mut dataset = Dataset::new();
    let mut summary = LoadSummary::default();

    let prices_path = config.prices_path();
    load_prices(
        open(&prices_path)?,
        &prices_path.display().to_string(),
        &mut dataset,
        &mut summary,
    )?;

    let splits_path = config.splits_path();
    if splits_path.exists() {
        load_splits(
            open(&splits_path)?,
            &splits_path.display().to_string(),
            &mut dataset,
            &mut summary,
        )?;
    } else {
        warn!(path = %splits_path.display(), "splits file not found, assuming no splits");
    }

    let changes_path = config.ticker_changes_path();
    if changes_path.exists() {
        load_ticker_changes(
            open(&changes_path)?,
            &changes_path.display().to_string(),
            &mut dataset,
            &mut summary,
        )?;
    } else {
        warn!(path = %changes_path.display(), "ticker changes file not found, assuming no renames");
    }

    let portfolios_path = config.portfolios_path();
    if portfolios_path.exists() {
        load_portfolios(
            open(&portfolios_path)?,
            &portfolios_path.display().to_string(),
            &mut dataset,
            &mut summary,
        )?;
    } else {
        warn!(path = %portfolios_path.display(), "portfolios file not found, portfolio mode unavailable");
    }

    if summary.duplicate_prices > 0 {
        warn!(duplicates = summary.duplicate_prices, "duplicate price rows overwrote earlier closes");
    }
    if summary.replaced_splits > 0 {
        warn!(replaced = summary.replaced_splits, "duplicate split rows replaced earlier ratios");
    }

    info!(
        prices = summary.prices,
        splits = summary.splits,
        ticker_changes = summary.ticker_changes,
        lots = summary.lots,
        "dataset loaded"
    );

    Ok((dataset, summary))
}
