//! Date-over-date returns.
//!
//! Log-returns are the first difference of the natural log along the date
//! axis; simple percentage change is the companion measure. Both drop the
//! leading row, which has no prior value to difference against, so output
//! row count is always input row count minus one.

use crate::data::provider::DataError;
use crate::table::WideTable;
use std::path::Path;

/// Load a persisted closing table and compute its log-returns.
///
/// A read failure (missing or malformed file) propagates as a typed error —
/// it is never logged and ignored.
pub fn returns_from_closes(dir: &Path, filename: &str) -> Result<WideTable, DataError> {
    let closes = WideTable::read_csv(&dir.join(filename))?;
    Ok(log_returns(&closes))
}

/// Natural-log first difference of every column.
///
/// A cell is `None` when either operand is missing or non-positive (the log
/// of a non-positive price is undefined).
pub fn log_returns(closes: &WideTable) -> WideTable {
    diff_rows(closes, |prev, cur| {
        if prev > 0.0 && cur > 0.0 {
            Some(cur.ln() - prev.ln())
        } else {
            None
        }
    })
}

/// Simple period-over-period percentage change of every column.
///
/// A cell is `None` when either operand is missing or the prior value is zero.
pub fn pct_change(closes: &WideTable) -> WideTable {
    diff_rows(closes, |prev, cur| {
        if prev != 0.0 {
            Some(cur / prev - 1.0)
        } else {
            None
        }
    })
}

/// Apply a pairwise row transform, dropping the leading row.
fn diff_rows(closes: &WideTable, f: impl Fn(f64, f64) -> Option<f64>) -> WideTable {
    let tickers = closes.tickers().to_vec();
    if closes.height() < 2 {
        return WideTable::from_parts(Vec::new(), tickers, Vec::new());
    }

    let dates = closes.dates()[1..].to_vec();
    let rows = closes
        .rows()
        .windows(2)
        .map(|pair| {
            pair[0]
                .iter()
                .zip(&pair[1])
                .map(|(prev, cur)| match (prev, cur) {
                    (Some(p), Some(c)) => f(*p, *c),
                    _ => None,
                })
                .collect()
        })
        .collect();

    WideTable::from_parts(dates, tickers, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn table(values: &[(&str, f64)]) -> WideTable {
        let series: BTreeMap<_, _> = values.iter().map(|(s, v)| (d(s), *v)).collect();
        WideTable::from_columns(vec![("AAA".into(), series)])
    }

    #[test]
    fn drops_leading_row_and_keeps_columns() {
        let closes = table(&[
            ("2023-01-01", 100.0),
            ("2023-01-02", 110.0),
            ("2023-01-03", 99.0),
        ]);
        let returns = log_returns(&closes);

        assert_eq!(returns.height(), closes.height() - 1);
        assert_eq!(returns.tickers(), closes.tickers());
        assert_eq!(returns.dates(), &closes.dates()[1..]);

        let expected = (110.0f64 / 100.0).ln();
        assert!((returns.get(0, 0).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn missing_operand_yields_missing_cell() {
        let aaa: BTreeMap<_, _> = [(d("2023-01-01"), 100.0), (d("2023-01-03"), 120.0)].into();
        let bbb: BTreeMap<_, _> = [
            (d("2023-01-01"), 50.0),
            (d("2023-01-02"), 55.0),
            (d("2023-01-03"), 60.0),
        ]
        .into();
        let closes = WideTable::from_columns(vec![("AAA".into(), aaa), ("BBB".into(), bbb)]);

        let returns = log_returns(&closes);
        assert_eq!(returns.height(), 2);
        // AAA has no 01-02 observation, so both adjacent diffs are missing.
        assert_eq!(returns.get(0, 0), None);
        assert_eq!(returns.get(1, 0), None);
        assert!(returns.get(0, 1).is_some());
    }

    #[test]
    fn non_positive_price_has_no_log_return() {
        let closes = table(&[("2023-01-01", 0.0), ("2023-01-02", 10.0)]);
        assert_eq!(log_returns(&closes).get(0, 0), None);
    }

    #[test]
    fn pct_change_matches_hand_computation() {
        let closes = table(&[("2023-01-01", 100.0), ("2023-01-02", 90.0)]);
        let pct = pct_change(&closes);
        assert!((pct.get(0, 0).unwrap() - (-0.1)).abs() < 1e-12);
    }

    #[test]
    fn single_row_input_gives_empty_output() {
        let closes = table(&[("2023-01-01", 100.0)]);
        let returns = log_returns(&closes);
        assert_eq!(returns.height(), 0);
        assert_eq!(returns.tickers(), closes.tickers());
    }

    #[test]
    fn read_failure_propagates_typed() {
        let err = returns_from_closes(std::path::Path::new("/nonexistent"), "0-closes.csv")
            .unwrap_err();
        assert!(matches!(err, DataError::FileNotFound { .. }));
    }

    proptest! {
        #[test]
        fn row_count_is_input_minus_one(prices in proptest::collection::vec(1.0f64..1000.0, 2..60)) {
            let start = d("2020-01-01");
            let series: BTreeMap<_, _> = prices
                .iter()
                .enumerate()
                .map(|(i, p)| (start + chrono::Duration::days(i as i64), *p))
                .collect();
            let closes = WideTable::from_columns(vec![("AAA".into(), series)]);

            let returns = log_returns(&closes);
            prop_assert_eq!(returns.height(), closes.height() - 1);
            prop_assert_eq!(returns.tickers(), closes.tickers());

            let pct = pct_change(&closes);
            prop_assert_eq!(pct.height(), closes.height() - 1);
        }
    }
}
