//! Export driver: walks the symbol list and feeds every record to the encoders.
//!
//! Symbols are processed one after another and independently. Whatever a
//! provider call does for one symbol, the driver still builds a record for it
//! and writes its key/value block, so every requested symbol ends with a
//! `success` field. Only I/O errors on the output streams stop a run.
//!
//! In batch mode the three export files are opened once by `ExportFiles`,
//! appended to for every symbol and flushed once at the end. They are
//! `BufWriter`s, so an early return still flushes them on drop.
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::config::ExportConfig;
use crate::format::{GnuCashCsv, KvStream, QifPrices, QuickenCsv, RowEncoder};
use crate::model::{ProviderAnswers, QuoteRecord};
use crate::provider::MarketDataProvider;
use crate::result::Result;
use crate::symbol::Symbol;

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Symbols processed.
    pub processed: usize,
    /// Symbols that ended with `success:1`.
    pub succeeded: usize,
    /// Symbols that ended with `success:0`.
    pub failed: usize,
    /// Rows written to each export file.
    pub exported_rows: usize,
}

struct ExportFile {
    encoder: Box<dyn RowEncoder>,
    path: PathBuf,
    writer: BufWriter<File>,
}

/// The QIF, Quicken and GnuCash files of one batch run.
pub struct ExportFiles {
    files: Vec<ExportFile>,
}

impl ExportFiles {
    /// Create (or truncate) the three export files in `dir`.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let encoders: Vec<Box<dyn RowEncoder>> =
            vec![Box::new(QifPrices), Box::new(QuickenCsv), Box::new(GnuCashCsv)];

        let mut files = Vec::with_capacity(encoders.len());
        for encoder in encoders {
            let path = dir.join(encoder.file_name());
            let writer = BufWriter::new(File::create(&path)?);
            debug!("Opened export file {}", path.display());
            files.push(ExportFile {
                encoder,
                path,
                writer,
            });
        }
        Ok(Self { files })
    }

    /// Append `record` to every file; returns the rows written per file.
    pub fn write_record(&mut self, record: &QuoteRecord) -> Result<usize> {
        let mut rows = 0;
        for file in &mut self.files {
            rows = file.encoder.encode(record, &mut file.writer)?;
        }
        Ok(rows)
    }

    /// Flush and close every file; returns their paths in QIF, Quicken,
    /// GnuCash order.
    pub fn finish(self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(self.files.len());
        for mut file in self.files {
            file.writer.flush()?;
            info!("Wrote {}", file.path.display());
            paths.push(file.path);
        }
        Ok(paths)
    }
}

/// Drives one run over a provider.
pub struct ExportDriver<'a, P: MarketDataProvider> {
    provider: &'a P,
    config: &'a ExportConfig,
}

impl<'a, P: MarketDataProvider> ExportDriver<'a, P> {
    /// Bind a provider and a configuration.
    pub fn new(provider: &'a P, config: &'a ExportConfig) -> Self {
        Self { provider, config }
    }

    /// Ask the provider about `symbol` and build its record.
    pub fn fetch_record(&self, symbol: &Symbol) -> QuoteRecord {
        debug!("Fetching {} from {}", symbol, self.provider.name());
        let answers = ProviderAnswers {
            info: self.provider.fetch_static_info(symbol),
            snapshot: self.provider.fetch_fast_snapshot(symbol),
            history: self
                .provider
                .fetch_history(symbol, self.config.window, self.config.interval),
        };
        QuoteRecord::build(symbol.clone(), answers, self.config.date_mode, self.config.today)
    }

    /// Process every symbol, writing key/value blocks to `kv` and, when
    /// given, export rows to `files`.
    pub fn run<W: Write>(
        &self,
        symbols: &[Symbol],
        kv: &mut KvStream<W>,
        mut files: Option<&mut ExportFiles>,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for symbol in symbols {
            let record = self.fetch_record(symbol);

            kv.write_record(&record)?;
            if let Some(files) = files.as_deref_mut() {
                summary.exported_rows += files.write_record(&record)?;
            }

            summary.processed += 1;
            if record.success() {
                summary.succeeded += 1;
                if let Some(message) = record.error_message() {
                    warn!("{}: partial data: {}", symbol, message);
                }
            } else {
                summary.failed += 1;
                warn!(
                    "{}: no data: {}",
                    symbol,
                    record.error_message().unwrap_or_default()
                );
            }
        }

        kv.flush()?;
        info!(
            "Processed {} symbols: {} succeeded, {} failed",
            summary.processed, summary.succeeded, summary.failed
        );
        Ok(summary)
    }
}
