//! Closing-price aggregation.
//!
//! Scans a data directory of per-ticker series files, pulls one price field
//! out of each, and merges them into a single date-aligned wide table by
//! outer join. The result is persisted next to its inputs under the `0-`
//! prefix, which the scan itself excludes — re-running never re-ingests a
//! previous aggregate.

use crate::data::provider::{DataError, PriceBar};
use crate::data::store::{load_series, CsvStore};
use crate::table::WideTable;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;

/// Filename prefix marking aggregate outputs, excluded from directory scans.
pub const AGGREGATE_PREFIX: &str = "0-";

/// Filename of the persisted closing-price aggregate.
pub const AGGREGATE_FILENAME: &str = "0-closes.csv";

/// Which price field to aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Close,
    AdjustedClose,
}

impl PriceField {
    pub(crate) fn extract(self, bar: &PriceBar) -> f64 {
        match self {
            PriceField::Close => bar.close,
            PriceField::AdjustedClose => bar.adjusted_close,
        }
    }
}

/// Merge every per-ticker series in `dir` into one closing-price table.
///
/// Column names are the file stems; the date index is the union of all
/// series' dates. The merged table is written to `{dir}/0-closes.csv` and
/// returned. An empty (or absent) directory yields an empty table.
pub fn aggregate_closes(dir: &Path, field: PriceField) -> Result<WideTable, DataError> {
    let store = CsvStore::new(dir);
    let tickers = store.list_tickers()?;

    let mut columns: Vec<(String, BTreeMap<NaiveDate, f64>)> = Vec::with_capacity(tickers.len());
    for ticker in &tickers {
        let bars = load_series(&store.series_path(ticker))?;
        let series: BTreeMap<NaiveDate, f64> =
            bars.iter().map(|b| (b.date, field.extract(b))).collect();
        columns.push((ticker.clone(), series));
    }

    let table = WideTable::from_columns(columns);

    std::fs::create_dir_all(dir).map_err(|e| DataError::Store(format!("create dir: {e}")))?;
    table.write_csv(&dir.join(AGGREGATE_FILENAME))?;

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_data_dir() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = env::temp_dir().join(format!("closelab_agg_{}_{id}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn bar(date: &str, close: f64) -> PriceBar {
        PriceBar {
            date: d(date),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            adjusted_close: close * 0.9,
            volume: 1000,
        }
    }

    #[test]
    fn merges_by_outer_join_on_date() {
        let dir = temp_data_dir();
        let store = CsvStore::new(&dir);
        store
            .write(
                "AAA",
                &[
                    bar("2023-01-01", 10.0),
                    bar("2023-01-02", 11.0),
                    bar("2023-01-03", 12.0),
                ],
            )
            .unwrap();
        store
            .write(
                "BBB",
                &[
                    bar("2023-01-02", 20.0),
                    bar("2023-01-03", 21.0),
                    bar("2023-01-04", 22.0),
                ],
            )
            .unwrap();

        let table = aggregate_closes(&dir, PriceField::Close).unwrap();

        assert_eq!(table.height(), 4);
        assert_eq!(
            table.dates(),
            &[d("2023-01-01"), d("2023-01-02"), d("2023-01-03"), d("2023-01-04")]
        );
        assert_eq!(table.tickers(), &["AAA".to_string(), "BBB".to_string()]);
        assert_eq!(table.get(0, 1), None); // BBB missing on 01-01
        assert_eq!(table.get(3, 0), None); // AAA missing on 01-04
        assert_eq!(table.get(1, 0), Some(11.0));
        assert_eq!(table.get(3, 1), Some(22.0));

        assert!(dir.join(AGGREGATE_FILENAME).exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn adjusted_close_field_is_selectable() {
        let dir = temp_data_dir();
        let store = CsvStore::new(&dir);
        store.write("AAA", &[bar("2023-01-01", 10.0)]).unwrap();

        let table = aggregate_closes(&dir, PriceField::AdjustedClose).unwrap();
        assert_eq!(table.get(0, 0), Some(9.0));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_directory_yields_empty_table() {
        let dir = temp_data_dir();
        fs::create_dir_all(&dir).unwrap();

        let table = aggregate_closes(&dir, PriceField::Close).unwrap();
        assert!(table.is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn rerun_does_not_ingest_prior_aggregate() {
        let dir = temp_data_dir();
        let store = CsvStore::new(&dir);
        store
            .write("AAA", &[bar("2023-01-01", 10.0), bar("2023-01-02", 11.0)])
            .unwrap();

        let first = aggregate_closes(&dir, PriceField::Close).unwrap();
        let second = aggregate_closes(&dir, PriceField::Close).unwrap();

        assert_eq!(first, second);
        assert_eq!(second.width(), 1);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn malformed_series_propagates() {
        let dir = temp_data_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("BAD.csv"),
            "date,open,high,low,close,adjusted_close,volume\n2023-01-01,x,x,x,x,x,x\n",
        )
        .unwrap();

        let err = aggregate_closes(&dir, PriceField::Close).unwrap_err();
        assert!(matches!(err, DataError::MalformedTable { .. }));

        let _ = fs::remove_dir_all(&dir);
    }
}
