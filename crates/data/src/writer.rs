//! CSV output of scan reports and backtest trade lists.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use option_insight_backtest::BacktestResult;
use option_insight_strategy::ReportRow;
use tracing::info;

use crate::records::{CsvRecord, ReportRecord, TradeRecord};

/// File name of the scan report.
pub const REPORT_FILE: &str = "report.csv";

/// Writes result files into an output directory, creating it on demand.
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Writes ranked scan rows to `report.csv`.
    ///
    /// An empty report still produces a file with only the header row.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn write_report(&self, rows: &[ReportRow]) -> Result<PathBuf> {
        let path = self.output_dir.join(REPORT_FILE);
        let records: Vec<ReportRecord> = rows.iter().map(ReportRecord::from).collect();
        self.write_csv(&path, &records)?;
        info!(rows = rows.len(), path = %path.display(), "Wrote scan report");
        Ok(path)
    }

    /// Writes the trade list of a backtest to
    /// `backtest_<SYMBOL>_<start>_<end>.csv`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn write_trades(&self, result: &BacktestResult) -> Result<PathBuf> {
        let cfg = &result.config;
        let path = self.output_dir.join(format!(
            "backtest_{}_{}_{}.csv",
            cfg.symbol, cfg.start, cfg.end
        ));
        let records: Vec<TradeRecord> = result.trades.iter().map(TradeRecord::from).collect();
        self.write_csv(&path, &records)?;
        info!(trades = records.len(), path = %path.display(), "Wrote backtest trades");
        Ok(path)
    }

    fn write_csv<T: CsvRecord>(&self, path: &Path, records: &[T]) -> Result<()> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!(
                "Failed to create output directory {}",
                self.output_dir.display()
            )
        })?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(true)
            .from_path(path)
            .with_context(|| format!("Failed to create CSV file {}", path.display()))?;

        if records.is_empty() {
            // serde only emits headers alongside the first record
            writer
                .write_record(T::HEADER)
                .context("Failed to write CSV header")?;
        }
        for record in records {
            writer
                .serialize(record)
                .context("Failed to serialize CSV record")?;
        }
        writer.flush().context("Failed to flush CSV writer")?;
        Ok(())
    }
}
