//! Baseline-relative transforms for charting.
//!
//! Rendering itself lives outside the core; these are the pure reshapes a
//! chart front-end needs: rebase every column to its first observation so
//! relative performance is comparable across tickers. Persisted data is
//! never modified.

use crate::table::WideTable;

/// Divide every column by its first present observation.
///
/// Cells before a column's first observation stay missing.
pub fn rebase_to_first(table: &WideTable) -> WideTable {
    scale_by_first(table, |v, first| v / first)
}

/// Percent change of every column from its first present observation.
pub fn pct_from_first(table: &WideTable) -> WideTable {
    scale_by_first(table, |v, first| (v / first - 1.0) * 100.0)
}

fn scale_by_first(table: &WideTable, f: impl Fn(f64, f64) -> f64) -> WideTable {
    let firsts: Vec<Option<f64>> = table
        .tickers()
        .iter()
        .enumerate()
        .map(|(col, _)| (0..table.height()).find_map(|row| table.get(row, col)))
        .collect();

    let rows = table
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .zip(&firsts)
                .map(|(cell, first)| match (cell, first) {
                    (Some(v), Some(first)) if *first != 0.0 => Some(f(*v, *first)),
                    _ => None,
                })
                .collect()
        })
        .collect();

    WideTable::from_parts(table.dates().to_vec(), table.tickers().to_vec(), rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn d(days: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + chrono::Duration::days(days)
    }

    fn one_column(values: &[f64]) -> WideTable {
        let series: BTreeMap<_, _> = values.iter().enumerate().map(|(i, v)| (d(i as i64), *v)).collect();
        WideTable::from_columns(vec![("AAA".into(), series)])
    }

    #[test]
    fn rebased_column_starts_at_one() {
        let rebased = rebase_to_first(&one_column(&[50.0, 55.0, 45.0]));
        assert_eq!(rebased.get(0, 0), Some(1.0));
        assert!((rebased.get(1, 0).unwrap() - 1.1).abs() < 1e-12);
        assert!((rebased.get(2, 0).unwrap() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn pct_from_first_starts_at_zero() {
        let pct = pct_from_first(&one_column(&[200.0, 210.0]));
        assert_eq!(pct.get(0, 0), Some(0.0));
        assert!((pct.get(1, 0).unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn leading_gap_uses_first_present_observation() {
        let mut series: BTreeMap<_, _> = BTreeMap::new();
        series.insert(d(1), 10.0);
        series.insert(d(2), 12.0);
        let other: BTreeMap<_, _> = [(d(0), 1.0), (d(1), 2.0), (d(2), 3.0)].into();
        let table = WideTable::from_columns(vec![("GAP".into(), series), ("FULL".into(), other)]);

        let rebased = rebase_to_first(&table);
        assert_eq!(rebased.get(0, 0), None);
        assert_eq!(rebased.get(1, 0), Some(1.0));
        assert!((rebased.get(2, 0).unwrap() - 1.2).abs() < 1e-12);
    }

    #[test]
    fn shape_is_preserved() {
        let table = one_column(&[1.0, 2.0, 3.0]);
        let rebased = rebase_to_first(&table);
        assert_eq!(rebased.height(), table.height());
        assert_eq!(rebased.dates(), table.dates());
        assert_eq!(rebased.tickers(), table.tickers());
    }
}
