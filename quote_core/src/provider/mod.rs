//! Market data provider contract and the raw result types it returns.
//!
//! The pipeline only needs three blocking calls per symbol. Each call returns
//! its own `Result`, so a failure is attached to the call that produced it
//! instead of living in a shared error registry.
//!
//! - `yahoo` talks to the Yahoo Finance chart endpoint.
//! - `replay` answers from a JSON fixture file.
use std::collections::BTreeMap;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ProviderError;
use crate::symbol::Symbol;
use crate::value::Scalar;

pub mod replay;
pub mod yahoo;

pub use replay::ReplayProvider;
pub use yahoo::YahooProvider;

/// Field map keyed by provider field name, iterated in key order.
pub type FieldMap = BTreeMap<String, Scalar>;

/// Descriptive, slow-changing facts about an instrument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticInfo {
    /// Every field the provider supplied.
    pub fields: FieldMap,
}

/// Lightweight latest-value quote.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FastSnapshot {
    /// Every field the provider supplied.
    pub fields: FieldMap,
}

/// One historical row as returned by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryBar {
    /// Trading day.
    pub date: NaiveDate,
    /// Numeric fields for the day (`open`, `high`, `low`, `close`, `volume`, ...).
    pub fields: BTreeMap<String, f64>,
}

impl HistoryBar {
    /// Create a bar with no fields yet.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field insertion.
    pub fn with(mut self, field: &str, value: f64) -> Self {
        self.fields.insert(field.to_string(), value);
        self
    }
}

/// How far back the history request reaches.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Display, EnumString)]
pub enum Lookback {
    #[value(name = "5d")]
    #[strum(serialize = "5d")]
    FiveDays,
    #[default]
    #[value(name = "1mo")]
    #[strum(serialize = "1mo")]
    OneMonth,
    #[value(name = "3mo")]
    #[strum(serialize = "3mo")]
    ThreeMonths,
    #[value(name = "6mo")]
    #[strum(serialize = "6mo")]
    SixMonths,
    #[value(name = "1y")]
    #[strum(serialize = "1y")]
    OneYear,
}

/// Spacing between history rows.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Display, EnumString)]
pub enum Interval {
    #[default]
    #[value(name = "1d")]
    #[strum(serialize = "1d")]
    Daily,
    #[value(name = "1wk")]
    #[strum(serialize = "1wk")]
    Weekly,
    #[value(name = "1mo")]
    #[strum(serialize = "1mo")]
    Monthly,
}

/// Source of quote data for the export driver.
///
/// Calls are blocking and independent; an implementation may parallelize
/// internally, but must hand back a complete answer per call.
pub trait MarketDataProvider {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Descriptive facts (currency, exchange, timezone, quote type, ...).
    fn fetch_static_info(&self, symbol: &Symbol) -> Result<StaticInfo, ProviderError>;

    /// Latest price, volume and quote type.
    fn fetch_fast_snapshot(&self, symbol: &Symbol) -> Result<FastSnapshot, ProviderError>;

    /// Rows for the lookback window at the given interval, in provider order.
    fn fetch_history(
        &self,
        symbol: &Symbol,
        window: Lookback,
        interval: Interval,
    ) -> Result<Vec<HistoryBar>, ProviderError>;
}

impl<P: MarketDataProvider + ?Sized> MarketDataProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_static_info(&self, symbol: &Symbol) -> Result<StaticInfo, ProviderError> {
        (**self).fetch_static_info(symbol)
    }

    fn fetch_fast_snapshot(&self, symbol: &Symbol) -> Result<FastSnapshot, ProviderError> {
        (**self).fetch_fast_snapshot(symbol)
    }

    fn fetch_history(
        &self,
        symbol: &Symbol,
        window: Lookback,
        interval: Interval,
    ) -> Result<Vec<HistoryBar>, ProviderError> {
        (**self).fetch_history(symbol, window, interval)
    }
}
