//! Date-indexed wide tables.
//!
//! A `WideTable` holds one row per date and one column per ticker, with
//! explicit `None` cells where a series has no observation for a date. It is
//! the typed replacement for the loose frames this tooling grew out of: both
//! the closing-price aggregate and derived returns tables are `WideTable`s.
//!
//! Invariants: `rows.len() == dates.len()`, every row has `tickers.len()`
//! cells, dates strictly ascending.

use crate::data::provider::DataError;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::Path;

/// A date-indexed numeric table with one column per ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    dates: Vec<NaiveDate>,
    tickers: Vec<String>,
    rows: Vec<Vec<Option<f64>>>,
}

impl WideTable {
    /// An empty table with no columns and no rows.
    pub fn empty() -> Self {
        Self {
            dates: Vec::new(),
            tickers: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Build a table from per-ticker series by outer join on date.
    ///
    /// The date index is the sorted union of every series' dates; a cell is
    /// `None` where a series lacks that date. Column order follows the input.
    pub fn from_columns(columns: Vec<(String, BTreeMap<NaiveDate, f64>)>) -> Self {
        let mut all_dates = BTreeSet::new();
        for (_, series) in &columns {
            all_dates.extend(series.keys().copied());
        }
        let dates: Vec<NaiveDate> = all_dates.into_iter().collect();

        let tickers: Vec<String> = columns.iter().map(|(t, _)| t.clone()).collect();
        let rows: Vec<Vec<Option<f64>>> = dates
            .iter()
            .map(|date| {
                columns
                    .iter()
                    .map(|(_, series)| series.get(date).copied())
                    .collect()
            })
            .collect();

        Self {
            dates,
            tickers,
            rows,
        }
    }

    /// Build a table from pre-assembled parts. Internal constructor for the
    /// analysis routines; lengths must already agree.
    pub(crate) fn from_parts(
        dates: Vec<NaiveDate>,
        tickers: Vec<String>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> Self {
        debug_assert_eq!(dates.len(), rows.len());
        debug_assert!(rows.iter().all(|r| r.len() == tickers.len()));
        Self {
            dates,
            tickers,
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Number of rows (dates).
    pub fn height(&self) -> usize {
        self.dates.len()
    }

    /// Number of columns (tickers).
    pub fn width(&self) -> usize {
        self.tickers.len()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn rows(&self) -> &[Vec<Option<f64>>] {
        &self.rows
    }

    /// Cell lookup by row and column index.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.rows.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    /// One column's values, in date order.
    pub fn column(&self, ticker: &str) -> Option<Vec<Option<f64>>> {
        let col = self.tickers.iter().position(|t| t == ticker)?;
        Some(self.rows.iter().map(|r| r[col]).collect())
    }

    /// Write the table as CSV: `date,<tickers...>`, empty cell for `None`.
    pub fn write_csv(&self, path: &Path) -> Result<(), DataError> {
        let write_err = |e: std::io::Error| DataError::Store(format!("write {}: {e}", path.display()));

        let mut file = fs::File::create(path).map_err(write_err)?;
        write!(file, "date").map_err(write_err)?;
        for ticker in &self.tickers {
            write!(file, ",{ticker}").map_err(write_err)?;
        }
        writeln!(file).map_err(write_err)?;

        for (date, row) in self.dates.iter().zip(&self.rows) {
            write!(file, "{date}").map_err(write_err)?;
            for cell in row {
                match cell {
                    Some(v) => write!(file, ",{v}").map_err(write_err)?,
                    None => write!(file, ",").map_err(write_err)?,
                }
            }
            writeln!(file).map_err(write_err)?;
        }

        Ok(())
    }

    /// Read a table previously written by `write_csv`.
    ///
    /// Read failures are typed: a missing file is `FileNotFound`, anything
    /// unparseable is `MalformedTable`. Rows are re-sorted by date.
    pub fn read_csv(path: &Path) -> Result<Self, DataError> {
        if !path.exists() {
            return Err(DataError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let malformed = |reason: String| DataError::MalformedTable {
            path: path.to_path_buf(),
            reason,
        };

        let mut rdr = csv::Reader::from_path(path).map_err(|e| malformed(e.to_string()))?;

        let headers = rdr.headers().map_err(|e| malformed(e.to_string()))?.clone();
        let mut header_iter = headers.iter();
        match header_iter.next() {
            Some("date") => {}
            other => {
                return Err(malformed(format!(
                    "expected leading 'date' column, found {other:?}"
                )))
            }
        }
        let tickers: Vec<String> = header_iter.map(str::to_string).collect();

        let mut keyed: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
        for record in rdr.records() {
            let record = record.map_err(|e| malformed(e.to_string()))?;
            let mut fields = record.iter();
            let date_str = fields
                .next()
                .ok_or_else(|| malformed("empty record".into()))?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
                .map_err(|e| malformed(format!("bad date '{date_str}': {e}")))?;

            let mut row = Vec::with_capacity(tickers.len());
            for field in fields {
                if field.is_empty() {
                    row.push(None);
                } else {
                    let v: f64 = field
                        .parse()
                        .map_err(|e| malformed(format!("bad value '{field}': {e}")))?;
                    row.push(Some(v));
                }
            }
            if row.len() != tickers.len() {
                return Err(malformed(format!(
                    "row for {date} has {} cells, expected {}",
                    row.len(),
                    tickers.len()
                )));
            }
            keyed.insert(date, row);
        }

        let (dates, rows): (Vec<_>, Vec<_>) = keyed.into_iter().unzip();
        Ok(Self {
            dates,
            tickers,
            rows,
        })
    }
}
