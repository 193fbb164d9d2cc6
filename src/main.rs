use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use investment_returns::{
    load_dataset, DataQualityEngine, InstrumentReturn, PortfolioAggregator, PortfolioReturn,
    ReturnsConfig, ReturnsEngine, Timeframe,
};

#[derive(Parser)]
#[command(name = "investment-returns", version, about = "Split- and rename-adjusted investment returns")]
struct Cli {
    /// JSON config file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding prices.csv, splits.csv, ticker_changes.csv and portfolios.csv
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Reference end date (YYYY-MM-DD)
    #[arg(long, global = true)]
    as_of: Option<NaiveDate>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// -v for info logs, -vv for debug
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Price return of a single instrument
    Price { ticker: String, timeframe: Timeframe },

    /// Investment return of a customer's holdings
    Portfolio { customer_id: String, timeframe: Timeframe },

    /// List accepted timeframe labels
    Timeframes,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(cli: &Cli) -> Result<ReturnsConfig> {
    let mut config = match &cli.config {
        Some(path) => ReturnsConfig::from_file(path)?,
        None => ReturnsConfig::default(),
    };

    if let Some(dir) = &cli.data_dir {
        config = config.with_data_dir(dir);
    }
    if let Some(as_of) = cli.as_of {
        config = config.with_as_of_date(as_of);
    }

    Ok(config)
}

fn run(cli: &Cli) -> Result<()> {
    if let Command::Timeframes = cli.command {
        for timeframe in Timeframe::ALL {
            println!("{:<10} {:>4} days", timeframe.label(), timeframe.days());
        }
        return Ok(());
    }

    let config = build_config(cli)?;
    let (dataset, _) = load_dataset(&config)?;

    // Customer-scoped issues only block that customer's portfolio query
    let queried_customer = match &cli.command {
        Command::Portfolio { customer_id, .. } => Some(customer_id.as_str()),
        _ => None,
    };
    let report = DataQualityEngine::new().validate(&dataset, &config);
    let blocking: Vec<_> = report.blocking_issues(queried_customer).collect();
    if !blocking.is_empty() {
        for issue in &blocking {
            eprintln!("   {} [{}]: {}", issue.table, issue.subject, issue.issue);
        }
        bail!("Data quality check failed: {}", report.summary());
    }

    match &cli.command {
        Command::Price { ticker, timeframe } => {
            let result = ReturnsEngine::new(&dataset, &config).instrument_return(ticker, *timeframe)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_instrument_return(&result);
            }
        }
        Command::Portfolio { customer_id, timeframe } => {
            let result = PortfolioAggregator::new(&dataset, &config).portfolio_return(customer_id, *timeframe)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_portfolio_return(&result);
            }
        }
        Command::Timeframes => {}
    }

    Ok(())
}

fn print_instrument_return(result: &InstrumentReturn) {
    let window = &result.window;

    println!("📈 {} ({})", result.ticker, result.timeframe);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Period {} to {}", window.start_date, window.end_date);
    if window.aliases.len() > 1 {
        println!("Aliases:     {}", window.aliases.join(", "));
    }
    if window.start_price != window.raw_start_price {
        println!("Start price: {} (split-adjusted from {})", window.start_price, window.raw_start_price);
    } else {
        println!("Start price: {}", window.start_price);
    }
    println!("End price:   {}", window.end_price);
    println!("Return:      {:.2}%", result.return_pct);
}

fn print_portfolio_return(result: &PortfolioReturn) {
    println!("💼 {} ({})", result.customer_id, result.timeframe);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for holding in &result.holdings {
        println!(
            "  {:<8} Period {} to {}  start ${:.2}  contributions ${:.2}  current ${:.2}",
            holding.ticker,
            holding.window.start_date,
            holding.window.end_date,
            holding.start_value,
            holding.contributions,
            holding.current_value
        );
    }

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Start value:   ${:.2}", result.start_total);
    println!("Contributions: ${:.2}", result.contribution_total);
    println!("Current value: ${:.2}", result.current_total);
    println!("Dollar return: ${:.2}", result.dollar_return);
    println!("Return:        {:.2}%", result.return_pct);
}
