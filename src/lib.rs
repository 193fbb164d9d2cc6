// Investment Returns - Core Library
// Split- and rename-adjusted price returns and customer portfolio returns,
// computed from CSV market data. Exposes all modules for the CLI and tests.

pub mod error;
pub mod config;
pub mod timeframe;
pub mod models;
pub mod dataset;
pub mod loader;
pub mod calendar;      // Calendar Index - merge sort + prior-date lookup
pub mod lineage;       // Lineage Resolver - merged histories across renames
pub mod splits;        // Split Adjuster
pub mod returns;       // Instrument Return Calculator
pub mod portfolio;     // Portfolio Return Aggregator
pub mod data_quality;  // Data Quality Engine - semantic checks after load

// Re-export commonly used types
pub use error::{ReturnsError, ReturnsResult};
pub use config::{PostPeriodLots, RenamePolicy, ReturnsConfig};
pub use timeframe::Timeframe;
pub use models::{
    AdjustedPriceWindow, Lot, PriceSeries, SplitEvent, SplitRatio, TickerChange,
    parse_event_date, parse_trade_date,
};
pub use dataset::{Dataset, Holdings};
pub use loader::{
    LoadSummary,
    load_dataset, load_portfolios, load_prices, load_splits, load_ticker_changes,
};
pub use calendar::{Alignment, CalendarIndex, merge_sort};
pub use lineage::{Lineage, LineageResolver};
pub use splits::SplitAdjuster;
pub use returns::{InstrumentReturn, ReturnsEngine, RETURN_DP, price_return};
pub use portfolio::{
    HoldingReturn, LotPeriod, PortfolioAggregator, PortfolioReturn,
    classify_lot, investment_return,
};
pub use data_quality::{DataQualityEngine, QualityIssue, QualityReport, Severity};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
