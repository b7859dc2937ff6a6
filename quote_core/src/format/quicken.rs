//! Quicken price-import CSV.
//!
//! `symbol,close,---,date,---,high,low,volume,*` per row. The `---` and `*`
//! columns are placeholders Quicken expects to be there; missing high, low or
//! volume leave their column empty.
use std::io::{self, Write};

use csv::QuoteStyle;

use super::{ExportRow, RowEncoder, opt, write_csv_row};
use crate::model::QuoteRecord;

const PLACEHOLDER: &str = "---";
const TRAILER: &str = "*";

/// Quicken CSV encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuickenCsv;

impl RowEncoder for QuickenCsv {
    fn file_name(&self) -> &'static str {
        "quicken_quotes.csv"
    }

    fn write_row(&self, record: &QuoteRecord, row: &ExportRow, out: &mut dyn Write) -> io::Result<()> {
        let fields = [
            record.symbol.export_id(),
            row.close.to_string(),
            PLACEHOLDER.to_string(),
            row.export_date(),
            PLACEHOLDER.to_string(),
            opt(row.high),
            opt(row.low),
            opt(row.volume),
            TRAILER.to_string(),
        ];
        write_csv_row(out, QuoteStyle::Necessary, fields)
    }
}
