//! Returns report export.
//!
//! The reporting variant of the workflow: take a closing-price table, derive
//! log-returns and percentage change, and persist all three side by side in
//! an output directory together with a JSON manifest. The original tooling
//! wrote a spreadsheet workbook with one sheet per table; here each table is
//! one CSV artifact.

use crate::analysis::closes::PriceField;
use crate::analysis::returns::{log_returns, pct_change};
use crate::data::provider::{DataError, PriceProvider};
use crate::table::WideTable;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Paths of the artifacts written by [`write_report`].
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub dir: PathBuf,
    pub closes_csv: PathBuf,
    pub log_returns_csv: PathBuf,
    pub pct_change_csv: PathBuf,
    pub manifest: PathBuf,
}

/// Manifest describing one report run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportManifest {
    pub tickers: Vec<String>,
    pub close_rows: usize,
    pub return_rows: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub written_at: chrono::DateTime<chrono::Utc>,
}

/// Fetch one price field for a set of tickers straight into a wide table.
///
/// Per-ticker failures are recorded and skipped, never aborting the batch;
/// the table holds the tickers that succeeded, in input order.
pub fn fetch_closes(
    provider: &dyn PriceProvider,
    tickers: &[&str],
    from: NaiveDate,
    field: PriceField,
) -> (WideTable, Vec<(String, DataError)>) {
    let mut columns: Vec<(String, BTreeMap<NaiveDate, f64>)> = Vec::new();
    let mut skipped: Vec<(String, DataError)> = Vec::new();

    for ticker in tickers {
        match provider.fetch(ticker, from) {
            Ok(fetched) => {
                let series: BTreeMap<NaiveDate, f64> = fetched
                    .bars
                    .iter()
                    .map(|b| (b.date, field.extract(b)))
                    .collect();
                columns.push((ticker.to_string(), series));
            }
            Err(e) => skipped.push((ticker.to_string(), e)),
        }
    }

    (WideTable::from_columns(columns), skipped)
}

/// Write closes, log-returns, and percentage change to `output_dir`.
pub fn write_report(output_dir: &Path, closes: &WideTable) -> Result<ReportPaths> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create report directory {}", output_dir.display()))?;

    let returns = log_returns(closes);
    let pct = pct_change(closes);

    let closes_csv = output_dir.join("closes.csv");
    let log_returns_csv = output_dir.join("log_returns.csv");
    let pct_change_csv = output_dir.join("pct_change.csv");

    closes
        .write_csv(&closes_csv)
        .context("failed to write closes.csv")?;
    returns
        .write_csv(&log_returns_csv)
        .context("failed to write log_returns.csv")?;
    pct.write_csv(&pct_change_csv)
        .context("failed to write pct_change.csv")?;

    let manifest = ReportManifest {
        tickers: closes.tickers().to_vec(),
        close_rows: closes.height(),
        return_rows: returns.height(),
        start_date: closes.dates().first().copied(),
        end_date: closes.dates().last().copied(),
        written_at: chrono::Utc::now(),
    };
    let manifest_path = output_dir.join("manifest.json");
    let json =
        serde_json::to_string_pretty(&manifest).context("failed to serialize report manifest")?;
    std::fs::write(&manifest_path, json)
        .with_context(|| format!("failed to write {}", manifest_path.display()))?;

    Ok(ReportPaths {
        dir: output_dir.to_path_buf(),
        closes_csv,
        log_returns_csv,
        pct_change_csv,
        manifest: manifest_path,
    })
}
