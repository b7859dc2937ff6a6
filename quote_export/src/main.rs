//! Quote Export: fetches quotes and recent price history for a list of symbols
//! and prints them as a `!key:value` stream on stdout. Optionally writes QIF,
//! Quicken CSV and GnuCash CSV price files for import into those applications.
//!
//! Usage example (CLI):
//! ```bash
//! quote_export '^DJI!BK'
//! quote_export --tickers-file ./tickers.txt --export-dir ./out
//! DEBUG=1 quote_export --replay ./fixture.json 'VFIAX'
//! ```
//!
//! Symbols come from the positional argument, else from the tickers file, else
//! the built-in `^DJI!BK`. A symbol that cannot be fetched ends its block with
//! `!success:0`; the process still exits with status 0.
//!
//! Setting `DEBUG` echoes every emitted pair to stderr and turns on debug
//! logging, including the provider's request log.
#![warn(missing_docs)]
mod args;

use std::io::{self, BufWriter};

use crate::args::Args;
use chrono::Local;
use clap::Parser;
use log::{debug, info};
use quote_core::config::{self, resolve_symbols};
use quote_core::format::KvStream;
use quote_core::provider::{MarketDataProvider, ReplayProvider, YahooProvider};
use quote_core::{ExportConfig, ExportDriver, ExportError, ExportFiles};
use quote_core::Result;

fn main() -> Result<(), ExportError> {
    let debug_mode = config::debug_enabled();
    init_logger(debug_mode);
    let args = Args::parse();
    debug!("{:?}", args);

    let mut config = ExportConfig::new(Local::now().date_naive());
    config.window = args.period;
    config.interval = args.interval;
    config.date_mode = args.date_mode;
    config.export_dir = args.export_dir.clone();
    config.echo = debug_mode;

    let symbols = resolve_symbols(args.symbols.as_deref(), args.tickers_file.as_deref())?;
    info!("Symbols: {:?}", symbols);

    let provider: Box<dyn MarketDataProvider> = match &args.replay {
        Some(path) => Box::new(ReplayProvider::from_path(path)?),
        None => Box::new(YahooProvider::new()?),
    };
    info!("Using {} provider", provider.name());

    let mut kv = KvStream::new(BufWriter::new(io::stdout().lock()));
    if config.echo {
        kv = kv.with_echo(Box::new(io::stderr()));
    }

    let mut files = match config.export_dir.as_deref() {
        Some(dir) => Some(ExportFiles::create(dir)?),
        None => None,
    };

    let driver = ExportDriver::new(&provider, &config);
    let summary = driver.run(&symbols, &mut kv, files.as_mut())?;

    if let Some(files) = files {
        let paths = files.finish()?;
        info!("Exported {} rows to {} files", summary.exported_rows, paths.len());
    }
    Ok(())
}

fn init_logger(debug_mode: bool) {
    let level = if debug_mode {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}
