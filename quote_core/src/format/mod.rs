//! Output encodings for a `QuoteRecord`.
//!
//! - `kv`: streaming `!key:value` pairs for the console.
//! - `qif`: QIF `!Type:Prices` entries.
//! - `quicken`: Quicken price-import CSV.
//! - `gnucash`: GnuCash price-import CSV.
//!
//! The three file encodings share the same rows (see [`export_rows`]) and only
//! differ in line grammar. Each one is a [`RowEncoder`].
use std::io::{self, Write};

use chrono::NaiveDate;
use csv::{QuoteStyle, WriterBuilder};

use crate::model::QuoteRecord;

pub mod gnucash;
pub mod kv;
pub mod qif;
pub mod quicken;

pub use gnucash::GnuCashCsv;
pub use kv::KvStream;
pub use qif::QifPrices;
pub use quicken::QuickenCsv;

/// `MM/DD/YYYY`, as Quicken and GnuCash expect.
pub const EXPORT_DATE_FORMAT: &str = "%m/%d/%Y";
/// `YYYY-MM-DD`.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// One dated price line for the file exports.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportRow {
    pub date: NaiveDate,
    pub close: f64,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub volume: Option<f64>,
}

impl ExportRow {
    /// Date in export spelling.
    pub fn export_date(&self) -> String {
        self.date.format(EXPORT_DATE_FORMAT).to_string()
    }
}

/// Rows a record contributes to the file exports.
///
/// Every series point with a close becomes a row. Without any, a last price
/// and its date make a single row. A record with neither contributes nothing.
pub fn export_rows(record: &QuoteRecord) -> Vec<ExportRow> {
    let rows: Vec<ExportRow> = record
        .series
        .iter()
        .filter_map(|point| {
            point.close().map(|close| ExportRow {
                date: point.date,
                close,
                high: point.get("high"),
                low: point.get("low"),
                volume: point.get("volume"),
            })
        })
        .collect();

    if !rows.is_empty() {
        return rows;
    }

    record
        .last
        .map(|last| ExportRow {
            date: last.date,
            close: last.price,
            high: None,
            low: None,
            volume: None,
        })
        .into_iter()
        .collect()
}

/// A line-oriented file encoding fed one export row at a time.
pub trait RowEncoder {
    /// Name of the file this encoding is written to in batch mode.
    fn file_name(&self) -> &'static str;

    /// Write the line(s) for one row.
    fn write_row(&self, record: &QuoteRecord, row: &ExportRow, out: &mut dyn Write) -> io::Result<()>;

    /// Write every row of `record`; returns how many rows were written.
    fn encode(&self, record: &QuoteRecord, out: &mut dyn Write) -> io::Result<usize> {
        let rows = export_rows(record);
        for row in &rows {
            self.write_row(record, row, out)?;
        }
        Ok(rows.len())
    }
}

/// Write one CSV line with the given quoting rule.
pub(crate) fn write_csv_row<I, F>(out: &mut dyn Write, style: QuoteStyle, fields: I) -> io::Result<()>
where
    I: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(style)
        .from_writer(out);
    writer.write_record(fields)?;
    writer.flush()
}

/// Write an optional number, empty when absent.
pub(crate) fn opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::model::{DateMode, ProviderAnswers};
    use crate::provider::{FastSnapshot, FieldMap, HistoryBar, StaticInfo};
    use crate::symbol::Symbol;
    use crate::value::Scalar;

    #[test]
    fn rows_skip_points_without_close() {
        let r = record(
            "BK",
            None,
            vec![
                HistoryBar::new(day(4)).with("volume", 10.0),
                HistoryBar::new(day(5)).with("close", 57.0).with("high", 58.0),
            ],
        );
        let rows = export_rows(&r);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].high, Some(58.0));
        assert_eq!(rows[0].low, None);
        assert_eq!(rows[0].export_date(), "01/05/2024");
    }

    #[test]
    fn snapshot_only_record_yields_one_row() {
        let mut snapshot = FieldMap::new();
        snapshot.insert("lastPrice".into(), Scalar::Number(57.12));
        let r = QuoteRecord::build(
            Symbol::new("BK"),
            ProviderAnswers {
                info: Ok(StaticInfo::default()),
                snapshot: Ok(FastSnapshot { fields: snapshot }),
                history: Ok(vec![]),
            },
            DateMode::Today,
            day(8),
        );
        let rows = export_rows(&r);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].close, 57.12);
        assert_eq!(rows[0].date, day(8));
    }

    #[test]
    fn failed_record_yields_nothing() {
        assert!(export_rows(&failed("NOPE")).is_empty());
    }
}
