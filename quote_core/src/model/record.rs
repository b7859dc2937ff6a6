//! Normalized per-symbol quote record and the rules that build it.
//!
//! `QuoteRecord::build` takes the three raw provider answers for one symbol and
//! produces a record whose invariants hold by construction:
//!
//! - every floating value is rounded to 9 decimals, missing or non-finite
//!   numbers are absent (never zero);
//! - the series is date-ascending with one point per date;
//! - `success()` is true exactly when there is a series point or a last price.
//!
//! Provider failures do not abort construction; they become `SymbolIssue`s and
//! whatever data the other calls produced is kept.
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::NaiveDate;
use clap::ValueEnum;
use log::{debug, warn};
use strum::Display;

use super::issue::{ProviderCall, SymbolIssue};
use crate::error::ProviderError;
use crate::provider::{FastSnapshot, FieldMap, HistoryBar, StaticInfo};
use crate::rounding::round9;
use crate::symbol::Symbol;
use crate::value::Scalar;

/// Quote type value that marks a fund.
pub const FUND_QUOTE_TYPE: &str = "MUTUALFUND";
/// Key holding the quote type in info and snapshot maps.
pub const QUOTE_TYPE_KEY: &str = "quoteType";
/// Case-insensitive key fragment identifying the snapshot's last price.
pub const LAST_PRICE_MARKER: &str = "lastprice";
/// Series field the derived `last`/`nav` value is taken from.
pub const CLOSE_FIELD: &str = "close";

/// Fund or equity/index; selects the label of the close-derived value.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum InstrumentKind {
    #[strum(serialize = "fund")]
    Fund,
    #[strum(serialize = "equity")]
    Equity,
}

impl InstrumentKind {
    /// Classify from a provider quote type (`MUTUALFUND`, `EQUITY`, `INDEX`, ...).
    pub fn from_quote_type(quote_type: Option<&str>) -> Self {
        match quote_type {
            Some(t) if t.trim().eq_ignore_ascii_case(FUND_QUOTE_TYPE) => InstrumentKind::Fund,
            _ => InstrumentKind::Equity,
        }
    }

    /// Key for the close-derived value: `nav` for funds, `last` otherwise.
    pub fn price_label(self) -> &'static str {
        match self {
            InstrumentKind::Fund => "nav",
            InstrumentKind::Equity => "last",
        }
    }
}

/// Which date accompanies a last price taken from the fast snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Display)]
#[strum(serialize_all = "lowercase")]
pub enum DateMode {
    /// Date of the newest series point, or the run date when there is none.
    #[default]
    Series,
    /// Always the run date.
    Today,
}

/// Where the last price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    /// The fast snapshot's last-price field.
    Snapshot,
    /// The close of the newest series point.
    Series,
}

/// Most recent known price and its date.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LastQuote {
    pub price: f64,
    pub date: NaiveDate,
    pub source: PriceSource,
}

/// One trading day of the series.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    /// Rounded numeric fields; only those the provider supplied.
    pub fields: BTreeMap<String, f64>,
}

impl PricePoint {
    /// Value of `field` when present.
    pub fn get(&self, field: &str) -> Option<f64> {
        self.fields.get(field).copied()
    }

    /// Close price when present.
    pub fn close(&self) -> Option<f64> {
        self.get(CLOSE_FIELD)
    }
}

/// The three raw answers for one symbol, as the provider returned them.
#[allow(missing_docs)]
#[derive(Debug, Clone)]
pub struct ProviderAnswers {
    pub info: Result<StaticInfo, ProviderError>,
    pub snapshot: Result<FastSnapshot, ProviderError>,
    pub history: Result<Vec<HistoryBar>, ProviderError>,
}

/// Normalized facts about one symbol for one run.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRecord {
    pub symbol: Symbol,
    pub isin: Option<String>,
    pub exchange: Option<String>,
    pub kind: InstrumentKind,
    /// Static info fields, normalized, key-sorted.
    pub info: FieldMap,
    /// Fast snapshot fields, normalized, key-sorted.
    pub snapshot: FieldMap,
    pub series: Vec<PricePoint>,
    pub last: Option<LastQuote>,
    pub issues: Vec<SymbolIssue>,
}

impl QuoteRecord {
    /// Build a record from raw provider answers.
    ///
    /// `today` is the run date, used when the date next to a snapshot price
    /// cannot come from the series.
    pub fn build(
        symbol: Symbol,
        answers: ProviderAnswers,
        mode: DateMode,
        today: NaiveDate,
    ) -> Self {
        let mut issues = Vec::new();

        let info = match answers.info {
            Ok(info) => normalize_fields(info.fields),
            Err(error) => {
                issues.push(SymbolIssue::ProviderFailure {
                    call: ProviderCall::Info,
                    error,
                });
                FieldMap::new()
            }
        };

        let snapshot = match answers.snapshot {
            Ok(snapshot) => normalize_fields(snapshot.fields),
            Err(error) => {
                issues.push(SymbolIssue::ProviderFailure {
                    call: ProviderCall::Snapshot,
                    error,
                });
                FieldMap::new()
            }
        };

        let series = match answers.history {
            Ok(bars) => {
                let series = normalize_series(&symbol, bars);
                if series.is_empty() {
                    issues.push(SymbolIssue::PartialData(
                        "history: no price data in window".to_string(),
                    ));
                }
                series
            }
            Err(error) => {
                issues.push(SymbolIssue::ProviderFailure {
                    call: ProviderCall::History,
                    error,
                });
                Vec::new()
            }
        };

        let quote_type = text_field(&snapshot, QUOTE_TYPE_KEY).or_else(|| text_field(&info, QUOTE_TYPE_KEY));
        let kind = InstrumentKind::from_quote_type(quote_type);

        let last = derive_last(&snapshot, &series, mode, today, &mut issues);

        let record = QuoteRecord {
            isin: text_field(&info, "isin")
                .filter(|isin| *isin != "-")
                .map(str::to_string),
            exchange: first_text(&info, &snapshot, "exchange", "exchange"),
            symbol,
            kind,
            info,
            snapshot,
            series,
            last,
            issues,
        };
        debug!(
            "{}: kind={} points={} last={:?} issues={}",
            record.symbol,
            record.kind,
            record.series.len(),
            record.last_price(),
            record.issues.len()
        );
        record
    }

    /// `true` when at least one series point or a last price was obtained.
    pub fn success(&self) -> bool {
        !self.series.is_empty() || self.last.is_some()
    }

    /// Most recent known price.
    pub fn last_price(&self) -> Option<f64> {
        self.last.map(|l| l.price)
    }

    /// Date of the most recent known price.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.last.map(|l| l.date)
    }

    /// All issue texts joined, `None` when nothing went wrong.
    pub fn error_message(&self) -> Option<String> {
        if self.issues.is_empty() {
            return None;
        }
        let parts: Vec<String> = self.issues.iter().map(|i| i.to_string()).collect();
        Some(parts.join("; "))
    }
}

fn normalize_fields(fields: FieldMap) -> FieldMap {
    fields
        .into_iter()
        .filter_map(|(key, value)| value.normalized().map(|v| (key, v)))
        .collect()
}

fn normalize_series(symbol: &Symbol, bars: Vec<HistoryBar>) -> Vec<PricePoint> {
    let mut by_date: BTreeMap<NaiveDate, BTreeMap<String, f64>> = BTreeMap::new();

    for bar in bars {
        let fields: BTreeMap<String, f64> = bar
            .fields
            .into_iter()
            .filter(|(_, v)| v.is_finite())
            .map(|(k, v)| (k, round9(v)))
            .collect();
        if fields.is_empty() {
            continue;
        }

        match by_date.entry(bar.date) {
            Entry::Occupied(mut slot) => {
                warn!("{}: duplicate row for {}, keeping the later one", symbol, bar.date);
                slot.insert(fields);
            }
            Entry::Vacant(slot) => {
                slot.insert(fields);
            }
        }
    }

    by_date
        .into_iter()
        .map(|(date, fields)| PricePoint { date, fields })
        .collect()
}

fn derive_last(
    snapshot: &FieldMap,
    series: &[PricePoint],
    mode: DateMode,
    today: NaiveDate,
    issues: &mut Vec<SymbolIssue>,
) -> Option<LastQuote> {
    if let Some((key, value)) = last_price_field(snapshot) {
        match value.as_f64() {
            Some(price) => {
                let date = match mode {
                    DateMode::Today => today,
                    DateMode::Series => series.last().map_or(today, |p| p.date),
                };
                return Some(LastQuote {
                    price: round9(price),
                    date,
                    source: PriceSource::Snapshot,
                });
            }
            None => issues.push(SymbolIssue::MalformedField {
                field: key.clone(),
                value: value.to_string(),
            }),
        }
    }

    series.iter().rev().find_map(|point| {
        point.close().map(|price| LastQuote {
            price,
            date: point.date,
            source: PriceSource::Series,
        })
    })
}

/// The snapshot entry whose key contains `lastprice`, case-insensitively.
pub(crate) fn last_price_field(fields: &FieldMap) -> Option<(&String, &Scalar)> {
    fields
        .iter()
        .find(|(key, _)| is_last_price_key(key))
}

fn is_last_price_key(key: &str) -> bool {
    key.to_ascii_lowercase().contains(LAST_PRICE_MARKER)
}

fn text_field<'a>(fields: &'a FieldMap, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Scalar::as_str).map(str::trim).filter(|s| !s.is_empty())
}

fn first_text(info: &FieldMap, snapshot: &FieldMap, info_key: &str, snapshot_key: &str) -> Option<String> {
    text_field(info, info_key)
        .or_else(|| text_field(snapshot, snapshot_key))
        .map(str::to_string)
}
