//! Command-line arguments for the quote exporter.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use std::path::PathBuf;

use clap::Parser;
use quote_core::model::DateMode;
use quote_core::provider::{Interval, Lookback};

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Symbols to fetch, separated by `!` (for example `^DJI!BK`).
    pub symbols: Option<String>,

    /// Comma-separated tickers file used when no symbols are given.
    /// The first column of each row is the symbol; `INDEX:` stands for `^`.
    #[clap(long, env = "QUOTE_TICKERS_FILE")]
    pub tickers_file: Option<PathBuf>,

    /// Write quotes.qif, quicken_quotes.csv and gnucash_quotes.csv into this directory.
    #[clap(long)]
    pub export_dir: Option<PathBuf>,

    /// History lookback window.
    #[clap(long, value_enum, default_value_t = Lookback::OneMonth)]
    pub period: Lookback,

    /// History interval.
    #[clap(long, value_enum, default_value_t = Interval::Daily)]
    pub interval: Interval,

    /// Date reported next to a snapshot last price.
    #[clap(long, value_enum, default_value_t = DateMode::Series)]
    pub date_mode: DateMode,

    /// Answer from a JSON fixture instead of Yahoo Finance.
    #[clap(long)]
    pub replay: Option<PathBuf>,
}
