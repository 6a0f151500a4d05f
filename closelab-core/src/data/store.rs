//! Per-ticker CSV store.
//!
//! Layout: `{data_dir}/{TICKER}.csv`, one daily bar per row, sorted by date.
//! The aggregate closing table lives in the same directory under the `0-`
//! prefix so directory scans can exclude it.
//!
//! Features:
//! - Atomic writes (write to .tmp, rename into place)
//! - Overwrite-on-rewrite: re-fetching a ticker replaces its file wholesale
//! - Metadata sidecar per ticker ({TICKER}.meta.json: hash, date range, source)

use super::provider::{DataError, PriceBar};
use crate::analysis::closes::AGGREGATE_PREFIX;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Metadata sidecar for a stored ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMeta {
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub bar_count: usize,
    pub data_hash: String,
    pub source: String,
    pub fetched_at: chrono::NaiveDateTime,
}

/// Store status for a single ticker, derived from its sidecar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStatus {
    pub ticker: String,
    pub stored: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub bar_count: Option<usize>,
}

/// The per-ticker CSV store.
pub struct CsvStore {
    data_dir: PathBuf,
}

impl CsvStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Root directory of the store.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path to the CSV file for a ticker.
    pub fn series_path(&self, ticker: &str) -> PathBuf {
        self.data_dir.join(format!("{ticker}.csv"))
    }

    /// Path to the metadata sidecar for a ticker.
    fn meta_path(&self, ticker: &str) -> PathBuf {
        self.data_dir.join(format!("{ticker}.meta.json"))
    }

    /// Write the full series for a ticker, replacing any existing file.
    ///
    /// Creates the data directory if absent. The write is atomic: the CSV is
    /// written to a .tmp path and renamed into place.
    pub fn write(&self, ticker: &str, bars: &[PriceBar]) -> Result<(), DataError> {
        if bars.is_empty() {
            return Err(DataError::Store(format!("no bars to store for {ticker}")));
        }

        fs::create_dir_all(&self.data_dir)
            .map_err(|e| DataError::Store(format!("failed to create data dir: {e}")))?;

        let df = bars_to_dataframe(bars)?;
        let path = self.series_path(ticker);
        let tmp_path = path.with_extension("csv.tmp");

        write_csv(&df, &tmp_path)?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::Store(format!("atomic rename failed: {e}"))
        })?;

        let meta = StoreMeta {
            ticker: ticker.to_string(),
            start_date: bars.first().unwrap().date,
            end_date: bars.last().unwrap().date,
            bar_count: bars.len(),
            data_hash: blake3::hash(
                &serde_json::to_vec(bars)
                    .map_err(|e| DataError::Store(format!("hash serialization: {e}")))?,
            )
            .to_hex()
            .to_string(),
            source: "eodhd".to_string(),
            fetched_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::Store(format!("meta serialization: {e}")))?;
        fs::write(self.meta_path(ticker), meta_json)
            .map_err(|e| DataError::Store(format!("meta write: {e}")))?;

        Ok(())
    }

    /// Load the stored series for a ticker, sorted by date ascending.
    pub fn load(&self, ticker: &str) -> Result<Vec<PriceBar>, DataError> {
        load_series(&self.series_path(ticker))
    }

    /// Tickers with a series file in the store, sorted.
    ///
    /// Excludes the aggregate output (files under the `0-` prefix) and
    /// anything that is not a `.csv` file.
    pub fn list_tickers(&self) -> Result<Vec<String>, DataError> {
        if !self.data_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.data_dir)
            .map_err(|e| DataError::Store(format!("read data dir: {e}")))?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DataError::Store(format!("dir entry: {e}")))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem.starts_with(AGGREGATE_PREFIX) {
                continue;
            }
            tickers.push(stem.to_string());
        }

        tickers.sort();
        Ok(tickers)
    }

    /// Read the metadata sidecar for a ticker, if present and parseable.
    pub fn get_meta(&self, ticker: &str) -> Option<StoreMeta> {
        let content = fs::read_to_string(self.meta_path(ticker)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Report which tickers are stored, and their date ranges.
    pub fn status(&self, tickers: &[&str]) -> Vec<StoreStatus> {
        tickers
            .iter()
            .map(|t| {
                let meta = self.get_meta(t);
                StoreStatus {
                    ticker: t.to_string(),
                    stored: self.series_path(t).exists(),
                    start_date: meta.as_ref().map(|m| m.start_date),
                    end_date: meta.as_ref().map(|m| m.end_date),
                    bar_count: meta.as_ref().map(|m| m.bar_count),
                }
            })
            .collect()
    }
}

/// Load one per-ticker series CSV into bars, sorted ascending.
pub fn load_series(path: &Path) -> Result<Vec<PriceBar>, DataError> {
    if !path.exists() {
        return Err(DataError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_schema(Some(Arc::new(series_schema())))
        .finish()
        .and_then(|lf| lf.collect())
        .map_err(|e| DataError::MalformedTable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let mut bars = dataframe_to_bars(&df, path)?;
    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

/// Canonical schema of a per-ticker series file.
fn series_schema() -> Schema {
    Schema::from_iter(vec![
        Field::new("date".into(), DataType::String),
        Field::new("open".into(), DataType::Float64),
        Field::new("high".into(), DataType::Float64),
        Field::new("low".into(), DataType::Float64),
        Field::new("close".into(), DataType::Float64),
        Field::new("adjusted_close".into(), DataType::Float64),
        Field::new("volume".into(), DataType::UInt64),
    ])
}

// ── CSV I/O helpers ─────────────────────────────────────────────────

/// Convert bars to a DataFrame with ISO date strings.
fn bars_to_dataframe(bars: &[PriceBar]) -> Result<DataFrame, DataError> {
    let dates: Vec<String> = bars.iter().map(|b| b.date.to_string()).collect();
    let opens: Vec<f64> = bars.iter().map(|b| b.open).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let adj_closes: Vec<f64> = bars.iter().map(|b| b.adjusted_close).collect();
    let volumes: Vec<u64> = bars.iter().map(|b| b.volume).collect();

    DataFrame::new(vec![
        Column::new("date".into(), dates),
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("adjusted_close".into(), adj_closes),
        Column::new("volume".into(), volumes),
    ])
    .map_err(|e| DataError::Store(format!("dataframe creation: {e}")))
}

/// Write a DataFrame to a CSV file.
fn write_csv(df: &DataFrame, path: &Path) -> Result<(), DataError> {
    let mut file =
        fs::File::create(path).map_err(|e| DataError::Store(format!("create file: {e}")))?;
    CsvWriter::new(&mut file)
        .finish(&mut df.clone())
        .map_err(|e| DataError::Store(format!("write csv: {e}")))?;
    Ok(())
}

/// Convert a series DataFrame back to bars.
fn dataframe_to_bars(df: &DataFrame, path: &Path) -> Result<Vec<PriceBar>, DataError> {
    let malformed = |reason: String| DataError::MalformedTable {
        path: path.to_path_buf(),
        reason,
    };

    let col = |name: &str| {
        df.column(name)
            .map_err(|e| malformed(format!("column {name}: {e}")))
    };

    let date_ca = col("date")?
        .str()
        .map_err(|e| malformed(format!("date column type: {e}")))?
        .clone();
    let open_ca = col("open")?
        .f64()
        .map_err(|e| malformed(format!("open column type: {e}")))?
        .clone();
    let high_ca = col("high")?
        .f64()
        .map_err(|e| malformed(format!("high column type: {e}")))?
        .clone();
    let low_ca = col("low")?
        .f64()
        .map_err(|e| malformed(format!("low column type: {e}")))?
        .clone();
    let close_ca = col("close")?
        .f64()
        .map_err(|e| malformed(format!("close column type: {e}")))?
        .clone();
    let adj_ca = col("adjusted_close")?
        .f64()
        .map_err(|e| malformed(format!("adjusted_close column type: {e}")))?
        .clone();
    let vol_ca = col("volume")?
        .u64()
        .map_err(|e| malformed(format!("volume column type: {e}")))?
        .clone();

    let n = df.height();
    let mut bars = Vec::with_capacity(n);

    for i in 0..n {
        let date_str = date_ca
            .get(i)
            .ok_or_else(|| malformed(format!("null date at row {i}")))?;
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .map_err(|e| malformed(format!("bad date '{date_str}' at row {i}: {e}")))?;

        bars.push(PriceBar {
            date,
            open: open_ca.get(i).unwrap_or(f64::NAN),
            high: high_ca.get(i).unwrap_or(f64::NAN),
            low: low_ca.get(i).unwrap_or(f64::NAN),
            close: close_ca.get(i).unwrap_or(f64::NAN),
            adjusted_close: adj_ca.get(i).unwrap_or(f64::NAN),
            volume: vol_ca.get(i).unwrap_or(0),
        });
    }

    Ok(bars)
}
