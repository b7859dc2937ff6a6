//! Run configuration and symbol-list resolution.
//!
//! The binary parses its arguments with clap and turns them into an
//! `ExportConfig`; everything below the CLI only sees this struct.
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::{debug, info, warn};

use crate::model::DateMode;
use crate::provider::{Interval, Lookback};
use crate::result::Result;
use crate::symbol::{DEFAULT_SYMBOLS, Symbol, SymbolParser};

/// Environment variable that turns on diagnostic echo and debug logging.
pub const DEBUG_ENV: &str = "DEBUG";

/// Everything the export driver needs to know about a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    /// History lookback window.
    pub window: Lookback,
    /// History interval.
    pub interval: Interval,
    /// Date reported next to a snapshot last price.
    pub date_mode: DateMode,
    /// Directory for the QIF/Quicken/GnuCash files; `None` disables batch export.
    pub export_dir: Option<PathBuf>,
    /// Echo every emitted pair to stderr.
    pub echo: bool,
    /// Run date.
    pub today: NaiveDate,
}

impl ExportConfig {
    /// Defaults: one month of daily history, series dates, no export, no echo.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            window: Lookback::default(),
            interval: Interval::default(),
            date_mode: DateMode::default(),
            export_dir: None,
            echo: false,
            today,
        }
    }

    /// `true` when batch export to files is requested.
    pub fn batch_export(&self) -> bool {
        self.export_dir.is_some()
    }
}

/// `true` when `DEBUG` is set to anything non-empty.
pub fn debug_enabled() -> bool {
    env::var_os(DEBUG_ENV).is_some_and(|v| !v.is_empty())
}

/// Decide which symbols to process.
///
/// The `!`-delimited argument wins; otherwise the tickers file is read when it
/// exists; otherwise the built-in default list is used.
pub fn resolve_symbols(argument: Option<&str>, tickers_file: Option<&Path>) -> Result<Vec<Symbol>> {
    if let Some(list) = argument {
        let symbols = Symbol::parse_delimited(list);
        if !symbols.is_empty() {
            debug!("Symbols from argument: {:?}", symbols);
            return Ok(symbols);
        }
        warn!("Symbol argument {:?} names no symbols, falling back", list);
    }

    if let Some(path) = tickers_file {
        if path.is_file() {
            let file = File::open(path)?;
            let symbols = Symbol::parse_from_file(BufReader::new(file))?;
            info!("Read {} symbols from {}", symbols.len(), path.display());
            return Ok(symbols);
        }
        warn!("Tickers file {} not found, using defaults", path.display());
    }

    Ok(Symbol::parse_delimited(DEFAULT_SYMBOLS))
}
