// ⚙️ Configuration - where the data lives and which policies apply
// Loaded from a JSON file; every field is optional and falls back to its default.

use anyhow::{Context as AnyhowContext, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// POLICIES
// ============================================================================

/// How far the lineage resolver follows the rename graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenamePolicy {
    /// Direct counterparts only (A→B, never A→B→C)
    #[default]
    SingleHop,

    /// Every ticker reachable through any chain of renames
    Transitive,
}

/// Treatment of lots purchased after the window's end date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostPeriodLots {
    /// Valued at the end price in current value, absent from start and contributions
    #[default]
    CountInCurrent,

    /// Left out of every total
    Exclude,
}

// ============================================================================
// RETURNS CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReturnsConfig {
    /// Reference end date every timeframe is measured back from
    pub as_of_date: NaiveDate,

    /// Directory holding the CSV files
    pub data_dir: PathBuf,

    pub prices_file: String,
    pub splits_file: String,
    pub ticker_changes_file: String,
    pub portfolios_file: String,

    pub rename_policy: RenamePolicy,
    pub post_period_lots: PostPeriodLots,
}

/// 2024-12-31, the close the bundled data ends on
pub fn default_as_of_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or(NaiveDate::MIN)
}

impl Default for ReturnsConfig {
    fn default() -> Self {
        ReturnsConfig {
            as_of_date: default_as_of_date(),
            data_dir: PathBuf::from("."),
            prices_file: "prices.csv".to_string(),
            splits_file: "splits.csv".to_string(),
            ticker_changes_file: "ticker_changes.csv".to_string(),
            portfolios_file: "portfolios.csv".to_string(),
            rename_policy: RenamePolicy::default(),
            post_period_lots: PostPeriodLots::default(),
        }
    }
}

impl ReturnsConfig {
    /// Load config from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse config JSON")
    }

    pub fn with_as_of_date(mut self, as_of_date: NaiveDate) -> Self {
        self.as_of_date = as_of_date;
        self
    }

    pub fn with_data_dir<P: Into<PathBuf>>(mut self, data_dir: P) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_rename_policy(mut self, policy: RenamePolicy) -> Self {
        self.rename_policy = policy;
        self
    }

    pub fn with_post_period_lots(mut self, policy: PostPeriodLots) -> Self {
        self.post_period_lots = policy;
        self
    }

    pub fn prices_path(&self) -> PathBuf {
        self.data_dir.join(&self.prices_file)
    }

    pub fn splits_path(&self) -> PathBuf {
        self.data_dir.join(&self.splits_file)
    }

    pub fn ticker_changes_path(&self) -> PathBuf {
        self.data_dir.join(&self.ticker_changes_file)
    }

    pub fn portfolios_path(&self) -> PathBuf {
        self.data_dir.join(&self.portfolios_file)
    }
}
