//! Streaming key/value encoding.
//!
//! Every pair is written as `!{key}:{value}` with nothing between pairs, so a
//! whole record is one unbroken run of fields that ends with `!success:1` or
//! `!success:0`. Keys have spaces replaced by underscores; values are written
//! in their natural string form without quoting.
//!
//! When an echo sink is attached, each pair is also written to it as
//! `{key}:{value}` on its own line. The echo never changes what reaches the
//! primary stream: if writing to it fails, it is dropped with a warning.
use std::fmt::Display;
use std::io::{self, Write};

use log::warn;

use super::{EXPORT_DATE_FORMAT, ISO_DATE_FORMAT};
use crate::model::record::{CLOSE_FIELD, last_price_field};
use crate::model::{PriceSource, PricePoint, QuoteRecord};

/// Series fields in the order they are emitted; others follow alphabetically.
const CANONICAL_FIELDS: &[&str] = &["open", "high", "low", CLOSE_FIELD, "adjclose", "volume"];

/// Replace spaces so a key never breaks the stream grammar.
pub fn normalize_key(key: &str) -> String {
    key.replace(' ', "_")
}

/// Key/value writer over a primary stream with an optional diagnostic echo.
pub struct KvStream<W: Write> {
    out: W,
    echo: Option<Box<dyn Write>>,
}

impl<W: Write> KvStream<W> {
    /// Stream to `out` only.
    pub fn new(out: W) -> Self {
        Self { out, echo: None }
    }

    /// Also echo every pair to `echo`, one per line.
    pub fn with_echo(mut self, echo: Box<dyn Write>) -> Self {
        self.echo = Some(echo);
        self
    }

    /// Write one pair.
    pub fn emit(&mut self, key: &str, value: impl Display) -> io::Result<()> {
        write!(self.out, "!{}:{}", normalize_key(key), value)?;
        if let Some(echo) = self.echo.as_mut() {
            if let Err(e) = writeln!(echo, "{}:{}", key, value) {
                self.drop_echo(e);
            }
        }
        Ok(())
    }

    fn drop_echo(&mut self, error: io::Error) {
        warn!("Diagnostic echo failed, disabling it: {}", error);
        self.echo = None;
    }

    /// Write the full block for one record.
    pub fn write_record(&mut self, record: &QuoteRecord) -> io::Result<()> {
        self.emit("ticker", &record.symbol)?;
        if let Some(isin) = &record.isin {
            self.emit("isin", isin)?;
        }

        for (key, value) in &record.info {
            self.emit(key, value)?;
        }

        let label = record.kind.price_label();
        let price_key = last_price_field(&record.snapshot).map(|(key, _)| key);
        for (key, value) in &record.snapshot {
            self.emit(key, value)?;
            if Some(key) != price_key {
                continue;
            }
            if let Some(last) = record.last.filter(|l| l.source == PriceSource::Snapshot) {
                self.emit(label, last.price)?;
                self.emit("date", last.date.format(EXPORT_DATE_FORMAT))?;
            }
        }

        for point in &record.series {
            self.write_point(point, label)?;
        }

        if let Some(message) = record.error_message() {
            self.emit("error", message)?;
        }
        self.emit("success", u8::from(record.success()))
    }

    fn write_point(&mut self, point: &PricePoint, label: &str) -> io::Result<()> {
        self.emit("isodate", point.date.format(ISO_DATE_FORMAT))?;
        self.emit("date", point.date.format(EXPORT_DATE_FORMAT))?;

        let canonical = CANONICAL_FIELDS
            .iter()
            .filter_map(|name| point.fields.get_key_value(*name));
        let others = point
            .fields
            .iter()
            .filter(|(name, _)| !CANONICAL_FIELDS.contains(&name.as_str()));

        for (name, value) in canonical.chain(others) {
            self.emit(name, value)?;
            if name == CLOSE_FIELD {
                self.emit(label, value)?;
            }
        }
        Ok(())
    }

    /// Flush the primary stream and the echo.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()?;
        if let Some(echo) = self.echo.as_mut() {
            if let Err(e) = echo.flush() {
                self.drop_echo(e);
            }
        }
        Ok(())
    }

    /// Give back the primary stream.
    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::model::{DateMode, ProviderAnswers};
    use crate::provider::{FastSnapshot, FieldMap, HistoryBar, StaticInfo};
    use crate::symbol::Symbol;
    use crate::value::Scalar;
    use chrono::NaiveDate;
    use std::sync::{Arc, Mutex};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn render(record: &QuoteRecord) -> String {
        let mut stream = KvStream::new(Vec::new());
        stream.write_record(record).unwrap();
        String::from_utf8(stream.into_inner()).unwrap()
    }

    fn record(
        symbol: &str,
        info: &[(&str, Scalar)],
        snapshot: &[(&str, Scalar)],
        history: Vec<HistoryBar>,
    ) -> QuoteRecord {
        let to_map = |pairs: &[(&str, Scalar)]| -> FieldMap {
            pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
        };
        QuoteRecord::build(
            Symbol::new(symbol),
            ProviderAnswers {
                info: Ok(StaticInfo { fields: to_map(info) }),
                snapshot: Ok(FastSnapshot { fields: to_map(snapshot) }),
                history: Ok(history),
            },
            DateMode::Series,
            day(8),
        )
    }

    #[test]
    fn emits_close_then_last_for_equities() {
        let r = record(
            "^DJI",
            &[("currency", Scalar::from("USD"))],
            &[],
            vec![HistoryBar::new(day(5)).with("close", 100.123456789).with("volume", 12.0)],
        );
        assert_eq!(
            render(&r),
            "!ticker:^DJI!currency:USD!isodate:2024-01-05!date:01/05/2024\
             !close:100.123456789!last:100.123456789!volume:12!success:1"
        );
    }

    #[test]
    fn funds_emit_nav() {
        let r = record(
            "VFIAX",
            &[],
            &[("quoteType", Scalar::from("MUTUALFUND"))],
            vec![HistoryBar::new(day(5)).with("close", 450.5)],
        );
        let out = render(&r);
        assert!(out.contains("!close:450.5!nav:450.5"));
        assert!(!out.contains("!last:"));
    }

    #[test]
    fn derived_last_follows_last_price_field() {
        let r = record(
            "BK",
            &[],
            &[
                ("dayHigh", Scalar::Number(58.0)),
                ("lastPrice", Scalar::Number(57.12)),
                ("open", Scalar::Number(56.9)),
            ],
            vec![HistoryBar::new(day(5)).with("close", 57.0)],
        );
        let out = render(&r);
        assert!(out.starts_with(
            "!ticker:BK!dayHigh:58!lastPrice:57.12!last:57.12!date:01/05/2024!open:56.9!isodate:"
        ));
    }

    #[test]
    fn derived_last_follows_only_the_chosen_key() {
        let r = record(
            "BK",
            &[],
            &[
                ("lastPrice", Scalar::Number(57.12)),
                ("regularMarketLastPrice", Scalar::Number(57.3)),
            ],
            vec![HistoryBar::new(day(5)).with("close", 57.0)],
        );
        let out = render(&r);
        assert!(out.starts_with(
            "!ticker:BK!lastPrice:57.12!last:57.12!date:01/05/2024!regularMarketLastPrice:57.3!isodate:"
        ));
        assert_eq!(out.matches("!last:57.12").count(), 1);
    }

    #[test]
    fn large_prices_keep_nine_decimals() {
        let r = record(
            "BRK-A",
            &[],
            &[],
            vec![HistoryBar::new(day(5)).with("close", 1234567.1234567891234)],
        );
        assert!(render(&r).contains("!close:1234567.123456789!last:1234567.123456789!"));
    }

    #[test]
    fn series_fields_follow_canonical_order() {
        let r = record(
            "BK",
            &[],
            &[],
            vec![HistoryBar::new(day(5))
                .with("volume", 1.0)
                .with("close", 2.0)
                .with("dividends", 0.5)
                .with("open", 3.0)],
        );
        assert!(render(&r).contains("!open:3!close:2!last:2!volume:1!dividends:0.5!success:1"));
    }

    #[test]
    fn failed_record_ends_with_error_and_zero() {
        let err = ProviderError::SymbolNotFound("NOPE".into());
        let r = QuoteRecord::build(
            Symbol::new("NOPE"),
            ProviderAnswers {
                info: Err(err.clone()),
                snapshot: Err(err.clone()),
                history: Err(err),
            },
            DateMode::Series,
            day(8),
        );
        let out = render(&r);
        assert!(out.starts_with("!ticker:NOPE!error:info: symbol not found: NOPE;"));
        assert!(out.ends_with("!success:0"));
    }

    #[test]
    fn spaces_in_keys_become_underscores() {
        let r = record("BK", &[("long name", Scalar::from("Bank of New York"))], &[], vec![]);
        assert!(render(&r).contains("!long_name:Bank of New York"));
    }

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn failing_echo_is_dropped_without_touching_primary() {
        let r = record("BK", &[], &[], vec![HistoryBar::new(day(5)).with("close", 57.0)]);
        let plain = render(&r);

        let mut stream = KvStream::new(Vec::new()).with_echo(Box::new(BrokenSink));
        stream.write_record(&r).unwrap();
        stream.flush().unwrap();
        assert!(stream.echo.is_none());
        assert_eq!(String::from_utf8(stream.into_inner()).unwrap(), plain);
    }

    #[test]
    fn echo_does_not_change_primary_output() {
        let r = record(
            "BK",
            &[("long name", Scalar::from("BNY"))],
            &[],
            vec![HistoryBar::new(day(5)).with("close", 57.0)],
        );
        let plain = render(&r);

        let echo = SharedBuf::default();
        let mut stream = KvStream::new(Vec::new()).with_echo(Box::new(echo.clone()));
        stream.write_record(&r).unwrap();
        let primary = String::from_utf8(stream.into_inner()).unwrap();
        assert_eq!(primary, plain);

        let echoed = String::from_utf8(echo.0.lock().unwrap().clone()).unwrap();
        assert!(echoed.starts_with("ticker:BK\nlong name:BNY\n"));
        assert!(echoed.ends_with("success:1\n"));
    }
}
