//!
//! Quote export pipeline: provider answers in, key/value stream and price
//! import files out.
//!
//! This crate aggregates:
//! - `error`: unified error type `ExportError` and per-call `ProviderError`.
//! - `result`: handy `Result<T, ExportError>` alias.
//! - `symbol`: instrument symbols and symbol-list parsing.
//! - `value` / `rounding`: scalar field values and 9-decimal rounding.
//! - `provider`: the market data provider contract, Yahoo and replay providers.
//! - `model`: the normalized per-symbol `QuoteRecord`.
//! - `format`: key/value, QIF, Quicken CSV and GnuCash CSV encodings.
//! - `driver`: the per-symbol export loop and batch export files.
//! - `config`: run configuration and symbol-list resolution.
#![warn(missing_docs)]
pub mod config;
pub mod driver;
pub mod error;
pub mod format;
pub mod model;
pub mod provider;
pub mod result;
pub mod rounding;
pub mod symbol;
pub mod value;

pub use config::ExportConfig;
pub use driver::{ExportDriver, ExportFiles, RunSummary};
pub use error::{ExportError, ProviderError};
pub use model::QuoteRecord;
pub use result::Result;
pub use symbol::Symbol;
