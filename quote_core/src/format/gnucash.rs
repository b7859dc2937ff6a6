//! GnuCash price-import CSV: `"exchange","symbol","date",close,"USD"`.
//!
//! The symbol keeps its `^` marker and the currency column is always `USD`.
use std::io::{self, Write};

use csv::QuoteStyle;

use super::{ExportRow, RowEncoder, write_csv_row};
use crate::model::QuoteRecord;

const CURRENCY: &str = "USD";

/// GnuCash CSV encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct GnuCashCsv;

impl RowEncoder for GnuCashCsv {
    fn file_name(&self) -> &'static str {
        "gnucash_quotes.csv"
    }

    fn write_row(&self, record: &QuoteRecord, row: &ExportRow, out: &mut dyn Write) -> io::Result<()> {
        let fields = [
            record.exchange.clone().unwrap_or_default(),
            record.symbol.to_string(),
            row.export_date(),
            row.close.to_string(),
            CURRENCY.to_string(),
        ];
        write_csv_row(out, QuoteStyle::NonNumeric, fields)
    }
}
