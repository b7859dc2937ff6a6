//! QIF price entries.
//!
//! Each row becomes a three-line record:
//!
//! ```text
//! !Type:Prices
//! "INDEX:DJI",37440.34,"01/05/2024"
//! ^
//! ```
use std::io::{self, Write};

use super::{ExportRow, RowEncoder};
use crate::model::QuoteRecord;

/// QIF `!Type:Prices` encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct QifPrices;

impl RowEncoder for QifPrices {
    fn file_name(&self) -> &'static str {
        "quotes.qif"
    }

    fn write_row(&self, record: &QuoteRecord, row: &ExportRow, out: &mut dyn Write) -> io::Result<()> {
        write!(
            out,
            "!Type:Prices\n\"{}\",{},\"{}\"\n^\n",
            record.symbol.export_id(),
            row.close,
            row.export_date()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::test_support::{day, encode, failed, record};
    use crate::provider::HistoryBar;

    #[test]
    fn writes_one_entry_per_row_with_index_prefix() {
        let r = record(
            "^DJI",
            Some("DJI"),
            vec![
                HistoryBar::new(day(4)).with("close", 37430.19),
                HistoryBar::new(day(5)).with("close", 37440.34),
            ],
        );
        let (rows, text) = encode(&QifPrices, &r);
        assert_eq!(rows, 2);
        assert_eq!(
            text,
            "!Type:Prices\n\"INDEX:DJI\",37430.19,\"01/04/2024\"\n^\n\
             !Type:Prices\n\"INDEX:DJI\",37440.34,\"01/05/2024\"\n^\n"
        );
    }

    #[test]
    fn failed_record_writes_nothing() {
        assert_eq!(encode(&QifPrices, &failed("NOPE")), (0, String::new()));
    }
}
