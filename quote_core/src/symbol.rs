//! Instrument symbols and helpers for reading symbol lists from the CLI and files.
//!
//! A `Symbol` is kept exactly as the caller supplied it, including the leading
//! `^` index marker used by the provider. Quicken-facing exports spell that
//! marker `INDEX:` instead; `Symbol::export_id` does the substitution and the
//! tickers file reader maps it back.
use std::collections::HashSet;
use std::fmt;
use std::io::BufRead;

use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};

use crate::error::ExportError;

/// Leading marker the provider uses for index symbols.
pub const INDEX_MARKER: &str = "^";
/// Prefix Quicken uses for index symbols.
pub const QUICKEN_INDEX_PREFIX: &str = "INDEX:";
/// Separator of the positional symbol list argument.
pub const LIST_SEPARATOR: char = '!';
// Windows editors, Quicken among them, prefix saved CSV files with one.
const BYTE_ORDER_MARK: char = '\u{feff}';

/// Symbols used when neither an argument nor a tickers file is available.
pub const DEFAULT_SYMBOLS: &str = "^DJI!BK";

/// Identifier of a tradable instrument or index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Wrap a raw identifier, trimming surrounding whitespace.
    pub fn new(raw: &str) -> Self {
        Symbol(raw.trim().to_string())
    }

    /// Build a symbol from its Quicken spelling (`INDEX:DJI` becomes `^DJI`).
    pub fn from_export_id(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.strip_prefix(QUICKEN_INDEX_PREFIX) {
            Some(rest) => Symbol(format!("{}{}", INDEX_MARKER, rest)),
            None => Symbol(trimmed.to_string()),
        }
    }

    /// The identifier as supplied.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` when the symbol carries the index marker.
    pub fn is_index(&self) -> bool {
        self.0.starts_with(INDEX_MARKER)
    }

    /// Identifier used in QIF and Quicken CSV output.
    pub fn export_id(&self) -> String {
        match self.0.strip_prefix(INDEX_MARKER) {
            Some(rest) => format!("{}{}", QUICKEN_INDEX_PREFIX, rest),
            None => self.0.clone(),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parsing of symbol lists from the CLI argument and from tickers files.
pub trait SymbolParser: Sized {
    /// Split a `!`-delimited list. Empty entries are skipped; order and
    /// duplicates are kept as given.
    fn parse_delimited(list: &str) -> Vec<Self>;

    /// Read a comma-separated tickers file.
    ///
    /// Fields may be quoted and may contain commas. The first column of each row is the symbol; rows whose first column is
    /// empty are skipped. `INDEX:` prefixes are mapped back to `^` and
    /// duplicates are dropped, keeping the first occurrence.
    fn parse_from_file<R: BufRead>(reader: R) -> Result<Vec<Self>, ExportError>;
}

impl SymbolParser for Symbol {
    fn parse_delimited(list: &str) -> Vec<Self> {
        list.split(LIST_SEPARATOR)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Symbol::new)
            .collect()
    }

    fn parse_from_file<R: BufRead>(reader: R) -> Result<Vec<Self>, ExportError> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let mut seen = HashSet::new();
        let mut symbols = Vec::new();

        for record_result in csv_reader.records() {
            let record = record_result.map_err(|e| ExportError::ParseTickersFile(e.to_string()))?;
            let first = record
                .get(0)
                .unwrap_or_default()
                .trim_start_matches(BYTE_ORDER_MARK)
                .trim();
            if first.is_empty() {
                continue;
            }

            let symbol = Symbol::from_export_id(first);
            if seen.insert(symbol.clone()) {
                symbols.push(symbol);
            }
        }
        Ok(symbols)
    }
}
