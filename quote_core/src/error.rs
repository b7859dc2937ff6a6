//! Error types shared by the core library and the export binary.
//!
//! `ExportError` unifies the failure cases that can stop a run (I/O on the
//! output streams, unreadable tickers files or replay fixtures, HTTP client
//! setup). Per-symbol provider failures are `ProviderError`s and never escape
//! the driver: they are folded into the record as a `SymbolIssue`.
use std::io;

use thiserror::Error;

/// Unified error type for the whole workspace.
#[derive(Error, Debug)]
pub enum ExportError {
    /// I/O error from the output streams, export files or input files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error while reading the tickers file into `Symbol` values.
    #[error("Parse tickers file error: {0}")]
    ParseTickersFile(String),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failure reported by a market data provider for one call on one symbol.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The provider does not know the symbol.
    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    /// Connection, timeout or non-success HTTP status.
    #[error("network error: {0}")]
    Network(String),

    /// The payload did not have the expected shape.
    #[error("unexpected response format: {0}")]
    ResponseFormat(String),

    /// Any other provider-reported failure, carried verbatim.
    #[error("{0}")]
    Other(String),
}
