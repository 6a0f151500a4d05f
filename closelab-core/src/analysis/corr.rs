//! Pairwise Pearson correlation over a wide table.
//!
//! Missing-data policy: pairwise-complete deletion — each pair of columns is
//! correlated over the rows where both have an observation. Pairs with fewer
//! than two complete rows, or with zero variance on either side, come out as
//! NaN. The diagonal is exactly 1.0.

use crate::table::WideTable;

/// Symmetric ticker-by-ticker correlation matrix.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    tickers: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Coefficient for the pair at (row, col).
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row][col]
    }

    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    pub fn size(&self) -> usize {
        self.tickers.len()
    }
}

/// Compute the full pairwise Pearson correlation matrix of a table's columns.
pub fn correlation(table: &WideTable) -> CorrelationMatrix {
    let n = table.width();
    let mut values = vec![vec![f64::NAN; n]; n];

    for i in 0..n {
        values[i][i] = 1.0;
        for j in (i + 1)..n {
            let r = pearson_pairwise(table, i, j);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        tickers: table.tickers().to_vec(),
        values,
    }
}

/// Pearson coefficient of two columns over their pairwise-complete rows.
fn pearson_pairwise(table: &WideTable, i: usize, j: usize) -> f64 {
    let pairs: Vec<(f64, f64)> = (0..table.height())
        .filter_map(|row| match (table.get(row, i), table.get(row, j)) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        })
        .collect();

    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        return f64::NAN;
    }
    cov / denom
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn d(days: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + chrono::Duration::days(days)
    }

    fn series(values: &[f64]) -> BTreeMap<NaiveDate, f64> {
        values.iter().enumerate().map(|(i, v)| (d(i as i64), *v)).collect()
    }

    #[test]
    fn perfectly_correlated_and_anticorrelated() {
        let table = WideTable::from_columns(vec![
            ("UP".into(), series(&[1.0, 2.0, 3.0, 4.0])),
            ("UP2".into(), series(&[10.0, 20.0, 30.0, 40.0])),
            ("DOWN".into(), series(&[4.0, 3.0, 2.0, 1.0])),
        ]);
        let corr = correlation(&table);

        assert!((corr.get(0, 1) - 1.0).abs() < 1e-12);
        assert!((corr.get(0, 2) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn symmetric_with_unit_diagonal() {
        let table = WideTable::from_columns(vec![
            ("A".into(), series(&[1.0, 3.0, 2.0, 5.0, 4.0])),
            ("B".into(), series(&[2.0, 1.0, 4.0, 3.0, 6.0])),
            ("C".into(), series(&[9.0, 7.0, 8.0, 5.0, 6.0])),
        ]);
        let corr = correlation(&table);

        for i in 0..corr.size() {
            assert!((corr.get(i, i) - 1.0).abs() < 1e-12);
            for j in 0..corr.size() {
                assert_eq!(corr.get(i, j).to_bits(), corr.get(j, i).to_bits());
                assert!(corr.get(i, j) >= -1.0 - 1e-12 && corr.get(i, j) <= 1.0 + 1e-12);
            }
        }
    }

    #[test]
    fn pairwise_complete_ignores_missing_rows() {
        let mut a = series(&[1.0, 2.0, 3.0, 4.0]);
        a.remove(&d(1));
        let table = WideTable::from_columns(vec![
            ("A".into(), a),
            ("B".into(), series(&[2.0, 99.0, 4.0, 6.0])),
        ]);
        let corr = correlation(&table);

        // Complete rows are 0, 2, 3: A=[1,3,4], B=[2,4,6] — perfectly linear.
        assert!((corr.get(0, 1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn too_few_pairs_or_constant_column_is_nan() {
        let table = WideTable::from_columns(vec![
            ("A".into(), series(&[1.0])),
            ("B".into(), series(&[2.0])),
        ]);
        assert!(correlation(&table).get(0, 1).is_nan());

        let table = WideTable::from_columns(vec![
            ("FLAT".into(), series(&[5.0, 5.0, 5.0])),
            ("B".into(), series(&[1.0, 2.0, 3.0])),
        ]);
        assert!(correlation(&table).get(0, 1).is_nan());
    }

    #[test]
    fn empty_table_gives_empty_matrix() {
        let corr = correlation(&WideTable::empty());
        assert_eq!(corr.size(), 0);
    }
}
