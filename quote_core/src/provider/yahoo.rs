//! Yahoo Finance provider over the public v8 chart endpoint.
//!
//! One chart request answers each trait call: the `meta` block carries the
//! descriptive and latest-value fields, `timestamp` plus `indicators` carry the
//! history. There is no retry and no caching; a failed request fails that call
//! for that symbol only.
use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, NaiveDate};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{FastSnapshot, FieldMap, HistoryBar, Interval, Lookback, MarketDataProvider, StaticInfo};
use crate::error::{ExportError, ProviderError};
use crate::symbol::Symbol;
use crate::value::Scalar;

const BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const TIMEOUT_SECS: u64 = 30;
/// Range used for the info and snapshot calls, which only need `meta`.
const META_RANGE: &str = "1d";

/// `meta` key -> static info key.
const INFO_FIELDS: &[(&str, &str)] = &[
    ("currency", "currency"),
    ("exchangeName", "exchange"),
    ("fullExchangeName", "fullExchangeName"),
    ("instrumentType", "quoteType"),
    ("timezone", "timeZoneShortName"),
    ("exchangeTimezoneName", "exchangeTimezoneName"),
    ("longName", "longName"),
    ("shortName", "shortName"),
    ("symbol", "symbol"),
    ("firstTradeDate", "firstTradeDate"),
];

/// `meta` key -> fast snapshot key.
const SNAPSHOT_FIELDS: &[(&str, &str)] = &[
    ("regularMarketPrice", "lastPrice"),
    ("chartPreviousClose", "previousClose"),
    ("regularMarketDayHigh", "dayHigh"),
    ("regularMarketDayLow", "dayLow"),
    ("regularMarketVolume", "lastVolume"),
    ("fiftyTwoWeekHigh", "yearHigh"),
    ("fiftyTwoWeekLow", "yearLow"),
    ("currency", "currency"),
    ("exchangeName", "exchange"),
    ("exchangeTimezoneName", "timezone"),
    ("instrumentType", "quoteType"),
];

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Map<String, Value>,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance chart API client.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooProvider {
    /// Build a provider with a browser user agent and a request timeout.
    pub fn new() -> Result<Self, ExportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Point the provider at another chart endpoint (mirrors, local stubs).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn chart_url(&self, symbol: &Symbol) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(symbol.as_str()))
    }

    fn fetch_chart(
        &self,
        symbol: &Symbol,
        range: &str,
        interval: &str,
    ) -> Result<ChartData, ProviderError> {
        let url = self.chart_url(symbol);
        debug!("GET {} range={} interval={}", url, range, interval);

        let response = self
            .client
            .get(&url)
            .query(&[("range", range), ("interval", interval), ("includeAdjustedClose", "true")])
            .send()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        debug!("{} answered HTTP {}", symbol, status);

        // Yahoo reports unknown symbols as 404 with a regular chart error body.
        let body: ChartResponse = match response.json() {
            Ok(body) => body,
            Err(e) if status.is_success() => {
                return Err(ProviderError::ResponseFormat(format!(
                    "failed to parse response for {}: {}",
                    symbol, e
                )));
            }
            Err(_) => {
                return Err(ProviderError::Network(format!("HTTP {} for {}", status, symbol)));
            }
        };

        parse_chart(symbol, body)
    }
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch_static_info(&self, symbol: &Symbol) -> Result<StaticInfo, ProviderError> {
        let data = self.fetch_chart(symbol, META_RANGE, &Interval::Daily.to_string())?;
        Ok(StaticInfo {
            fields: pick_fields(&data.meta, INFO_FIELDS),
        })
    }

    fn fetch_fast_snapshot(&self, symbol: &Symbol) -> Result<FastSnapshot, ProviderError> {
        let data = self.fetch_chart(symbol, META_RANGE, &Interval::Daily.to_string())?;
        Ok(FastSnapshot {
            fields: pick_fields(&data.meta, SNAPSHOT_FIELDS),
        })
    }

    fn fetch_history(
        &self,
        symbol: &Symbol,
        window: Lookback,
        interval: Interval,
    ) -> Result<Vec<HistoryBar>, ProviderError> {
        let data = self.fetch_chart(symbol, &window.to_string(), &interval.to_string())?;
        parse_history(data)
    }
}

fn parse_chart(symbol: &Symbol, body: ChartResponse) -> Result<ChartData, ProviderError> {
    if let Some(err) = body.chart.error {
        return Err(if err.code == "Not Found" {
            ProviderError::SymbolNotFound(symbol.to_string())
        } else {
            ProviderError::Other(format!("{}: {}", err.code, err.description))
        });
    }

    body.chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| ProviderError::ResponseFormat("empty result with no error".into()))
}

fn pick_fields(meta: &Map<String, Value>, mapping: &[(&str, &str)]) -> FieldMap {
    mapping
        .iter()
        .filter_map(|(source, target)| {
            meta.get(*source)
                .and_then(Scalar::from_json)
                .map(|value| (target.to_string(), value))
        })
        .collect()
}

fn parse_history(data: ChartData) -> Result<Vec<HistoryBar>, ProviderError> {
    // Daily stamps sit at the exchange open; shift by the exchange offset so
    // the calendar day is the exchange's, not UTC's.
    let gmt_offset = data.meta.get("gmtoffset").and_then(Value::as_i64).unwrap_or(0);

    let timestamps = match data.timestamp {
        Some(ts) => ts,
        None => return Ok(Vec::new()),
    };

    let indicators = data
        .indicators
        .ok_or_else(|| ProviderError::ResponseFormat("no indicators".into()))?;
    let quote = indicators.quote.into_iter().next().unwrap_or_default();
    let adj_closes = indicators
        .adjclose
        .and_then(|v| v.into_iter().next())
        .map(|a| a.adjclose)
        .unwrap_or_default();

    let mut bars = Vec::with_capacity(timestamps.len());
    let mut skipped = 0usize;

    for (i, &ts) in timestamps.iter().enumerate() {
        let date = exchange_date(ts, gmt_offset)
            .ok_or_else(|| ProviderError::ResponseFormat(format!("invalid timestamp: {}", ts)))?;

        let mut fields = BTreeMap::new();
        let columns = [
            ("open", quote.open.get(i).copied().flatten()),
            ("high", quote.high.get(i).copied().flatten()),
            ("low", quote.low.get(i).copied().flatten()),
            ("close", quote.close.get(i).copied().flatten()),
            ("adjclose", adj_closes.get(i).copied().flatten()),
            ("volume", quote.volume.get(i).copied().flatten().map(|v| v as f64)),
        ];
        for (name, value) in columns {
            if let Some(v) = value {
                fields.insert(name.to_string(), v);
            }
        }

        // Holidays come back as rows of nulls.
        if fields.is_empty() {
            skipped += 1;
            continue;
        }
        bars.push(HistoryBar { date, fields });
    }

    if skipped > 0 {
        warn!("Skipped {} empty rows out of {}", skipped, timestamps.len());
    }
    Ok(bars)
}

fn exchange_date(timestamp: i64, gmt_offset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp + gmt_offset, 0).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart(json: &str) -> ChartResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn chart_url_escapes_symbol() {
        let provider = YahooProvider::new()
            .unwrap()
            .with_base_url("http://localhost/chart/");
        assert_eq!(provider.chart_url(&Symbol::new("^DJI")), "http://localhost/chart/%5EDJI");
        assert_eq!(provider.chart_url(&Symbol::new("BRK-B")), "http://localhost/chart/BRK-B");
        assert_eq!(
            provider.chart_url(&Symbol::new("EURUSD=X")),
            "http://localhost/chart/EURUSD%3DX"
        );
    }

    #[test]
    fn not_found_maps_to_symbol_not_found() {
        let body = chart(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#,
        );
        let err = parse_chart(&Symbol::new("NOPE"), body).unwrap_err();
        assert_eq!(err, ProviderError::SymbolNotFound("NOPE".into()));
    }

    #[test]
    fn parses_meta_and_history() {
        let body = chart(
            r#"{"chart":{"result":[{
                "meta":{"currency":"USD","symbol":"BK","exchangeName":"NYQ","instrumentType":"EQUITY",
                        "timezone":"EST","exchangeTimezoneName":"America/New_York","gmtoffset":-18000,
                        "regularMarketPrice":57.12,"regularMarketVolume":3100000},
                "timestamp":[1704378600,1704465000,1704551400],
                "indicators":{"quote":[{"open":[56.0,null,57.0],"high":[56.5,null,57.5],
                        "low":[55.5,null,56.5],"close":[56.25,null,57.12],"volume":[100,null,200]}],
                        "adjclose":[{"adjclose":[56.2,null,57.1]}]}
            }],"error":null}}"#,
        );
        let data = parse_chart(&Symbol::new("BK"), body).unwrap();

        let info = pick_fields(&data.meta, INFO_FIELDS);
        assert_eq!(info.get("exchange"), Some(&Scalar::Text("NYQ".into())));
        assert_eq!(info.get("quoteType"), Some(&Scalar::Text("EQUITY".into())));
        assert_eq!(info.get("timeZoneShortName"), Some(&Scalar::Text("EST".into())));

        let snapshot = pick_fields(&data.meta, SNAPSHOT_FIELDS);
        assert_eq!(snapshot.get("lastPrice"), Some(&Scalar::Number(57.12)));
        assert_eq!(snapshot.get("lastVolume"), Some(&Scalar::Integer(3_100_000)));

        let bars = parse_history(data).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
        assert_eq!(bars[0].fields.get("close"), Some(&56.25));
        assert_eq!(bars[0].fields.get("volume"), Some(&100.0));
        assert_eq!(bars[1].date, NaiveDate::from_ymd_opt(2024, 1, 6).unwrap());
    }

    #[test]
    fn missing_timestamps_mean_no_rows() {
        let body = chart(r#"{"chart":{"result":[{"meta":{"symbol":"X"}}],"error":null}}"#);
        let data = parse_chart(&Symbol::new("X"), body).unwrap();
        assert!(parse_history(data).unwrap().is_empty());
    }
}
