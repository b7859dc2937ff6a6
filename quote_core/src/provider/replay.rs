//! Provider that answers from a JSON fixture instead of the network.
//!
//! The fixture maps each symbol to canned answers:
//!
//! ```json
//! {
//!   "BK": {
//!     "info": { "currency": "USD", "exchange": "NYQ" },
//!     "snapshot": { "lastPrice": 57.12, "quoteType": "EQUITY" },
//!     "history": [ { "date": "2024-01-05", "close": 57.12, "volume": 3100000 } ],
//!     "errors": { "info": "rate limited" }
//!   }
//! }
//! ```
//!
//! A missing section or a `null` answers with empty data; an `errors` entry for
//! a section makes that call fail with the given message. Unknown symbols fail
//! every call.
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::NaiveDate;
use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{FastSnapshot, FieldMap, HistoryBar, Interval, Lookback, MarketDataProvider, StaticInfo};
use crate::error::{ExportError, ProviderError};
use crate::symbol::Symbol;
use crate::value::Scalar;

/// Canned answers for one symbol.
#[derive(Debug, Clone, Default, Deserialize)]
struct ReplayEntry {
    #[serde(default)]
    info: Option<Map<String, Value>>,
    #[serde(default)]
    snapshot: Option<Map<String, Value>>,
    #[serde(default)]
    history: Option<Vec<Map<String, Value>>>,
    #[serde(default)]
    errors: HashMap<String, String>,
}

impl ReplayEntry {
    fn failure(&self, section: &str) -> Option<ProviderError> {
        self.errors
            .get(section)
            .map(|message| ProviderError::Other(message.clone()))
    }
}

/// In-memory provider loaded from a fixture.
#[derive(Debug, Clone, Default)]
pub struct ReplayProvider {
    entries: HashMap<Symbol, ReplayEntry>,
}

impl ReplayProvider {
    /// Parse a fixture from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ExportError> {
        let entries: HashMap<Symbol, ReplayEntry> = serde_json::from_reader(reader)?;
        debug!("Replay fixture holds {} symbols", entries.len());
        Ok(Self { entries })
    }

    /// Load a fixture file.
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    fn entry(&self, symbol: &Symbol) -> Result<&ReplayEntry, ProviderError> {
        self.entries
            .get(symbol)
            .ok_or_else(|| ProviderError::SymbolNotFound(symbol.to_string()))
    }
}

impl MarketDataProvider for ReplayProvider {
    fn name(&self) -> &str {
        "replay"
    }

    fn fetch_static_info(&self, symbol: &Symbol) -> Result<StaticInfo, ProviderError> {
        let entry = self.entry(symbol)?;
        if let Some(err) = entry.failure("info") {
            return Err(err);
        }
        Ok(StaticInfo {
            fields: to_field_map(entry.info.as_ref()),
        })
    }

    fn fetch_fast_snapshot(&self, symbol: &Symbol) -> Result<FastSnapshot, ProviderError> {
        let entry = self.entry(symbol)?;
        if let Some(err) = entry.failure("snapshot") {
            return Err(err);
        }
        Ok(FastSnapshot {
            fields: to_field_map(entry.snapshot.as_ref()),
        })
    }

    fn fetch_history(
        &self,
        symbol: &Symbol,
        window: Lookback,
        interval: Interval,
    ) -> Result<Vec<HistoryBar>, ProviderError> {
        let entry = self.entry(symbol)?;
        if let Some(err) = entry.failure("history") {
            return Err(err);
        }
        debug!("Replaying {} history ({} / {})", symbol, window, interval);

        entry
            .history
            .iter()
            .flatten()
            .map(to_history_bar)
            .collect()
    }
}

fn to_field_map(section: Option<&Map<String, Value>>) -> FieldMap {
    section
        .into_iter()
        .flatten()
        .filter_map(|(key, value)| Scalar::from_json(value).map(|v| (key.clone(), v)))
        .collect()
}

fn to_history_bar(row: &Map<String, Value>) -> Result<HistoryBar, ProviderError> {
    let raw_date = row
        .get("date")
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::ResponseFormat("history row without date".into()))?;
    let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
        .map_err(|e| ProviderError::ResponseFormat(format!("bad date {:?}: {}", raw_date, e)))?;

    let fields: BTreeMap<String, f64> = row
        .iter()
        .filter(|(key, _)| key.as_str() != "date")
        .filter_map(|(key, value)| value.as_f64().map(|v| (key.clone(), v)))
        .collect();

    Ok(HistoryBar { date, fields })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "BK": {
            "info": {"currency": "USD", "exchange": "NYQ", "isin": null},
            "snapshot": {"lastPrice": 57.12},
            "history": [{"date": "2024-01-05", "close": 57.12, "volume": 3100000, "note": "x"}]
        },
        "VFIAX": {
            "errors": {"history": "No data found for this date range"}
        }
    }"#;

    fn provider() -> ReplayProvider {
        ReplayProvider::from_reader(FIXTURE.as_bytes()).unwrap()
    }

    #[test]
    fn replays_sections() {
        let p = provider();
        let bk = Symbol::new("BK");

        let info = p.fetch_static_info(&bk).unwrap();
        assert_eq!(info.fields.len(), 2);

        let history = p.fetch_history(&bk, Lookback::OneMonth, Interval::Daily).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].fields.get("close"), Some(&57.12));
        assert!(!history[0].fields.contains_key("note"));
    }

    #[test]
    fn configured_errors_fail_only_their_call() {
        let p = provider();
        let fund = Symbol::new("VFIAX");
        assert!(p.fetch_static_info(&fund).unwrap().fields.is_empty());
        assert_eq!(
            p.fetch_history(&fund, Lookback::OneMonth, Interval::Daily),
            Err(ProviderError::Other("No data found for this date range".into()))
        );
    }

    #[test]
    fn unknown_symbol_is_not_found() {
        let p = provider();
        let err = p.fetch_fast_snapshot(&Symbol::new("ZZZ")).unwrap_err();
        assert_eq!(err, ProviderError::SymbolNotFound("ZZZ".into()));
    }

    #[test]
    fn rejects_malformed_dates() {
        let p = ReplayProvider::from_reader(
            r#"{"X": {"history": [{"date": "01/05/2024", "close": 1.0}]}}"#.as_bytes(),
        )
        .unwrap();
        let err = p
            .fetch_history(&Symbol::new("X"), Lookback::OneMonth, Interval::Daily)
            .unwrap_err();
        assert!(matches!(err, ProviderError::ResponseFormat(_)));
    }
}
