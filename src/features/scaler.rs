//! Min-max scaling of the leading numeric columns.
//!
//! ```text
//! x_scaled = (x - x_min) / (x_max - x_min)
//! ```
//! A constant column has zero range; it is shifted by its minimum and left
//! unscaled. Values outside the fitted bounds are not clipped.

use ndarray::{Array1, Array2, ArrayViewMut1, Axis};
use serde::Serialize;

use crate::error::{Result, ValuationError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinMaxScaler {
    min: Vec<f64>,
    range: Vec<f64>,
}

impl MinMaxScaler {
    /// Fits bounds on the first `n_columns` columns of `x`.
    pub fn fit(x: &Array2<f64>, n_columns: usize) -> Result<Self> {
        let (rows, cols) = x.dim();
        if rows == 0 {
            return Err(ValuationError::InsufficientData(
                "cannot fit scaler on an empty matrix".to_string(),
            ));
        }
        if n_columns > cols {
            return Err(ValuationError::Training(format!(
                "scaler asked for {n_columns} columns, matrix has {cols}"
            )));
        }

        let mut min = Vec::with_capacity(n_columns);
        let mut max = Vec::with_capacity(n_columns);
        for column in x.axis_iter(Axis(1)).take(n_columns) {
            min.push(column.iter().copied().fold(f64::INFINITY, f64::min));
            max.push(column.iter().copied().fold(f64::NEG_INFINITY, f64::max));
        }

        let range = min
            .iter()
            .zip(&max)
            .map(|(lo, hi)| if hi > lo { hi - lo } else { 1.0 })
            .collect();

        Ok(Self { min, range })
    }

    /// Scales the numeric columns of every row in place.
    pub fn transform(&self, x: &mut Array2<f64>) {
        for row in x.axis_iter_mut(Axis(0)) {
            self.apply(row);
        }
    }

    /// Scales the numeric columns of a single feature row in place.
    pub fn transform_row(&self, row: &mut Array1<f64>) {
        self.apply(row.view_mut());
    }

    fn apply(&self, mut row: ArrayViewMut1<'_, f64>) {
        for (j, (lo, range)) in self.min.iter().zip(&self.range).enumerate() {
            row[j] = (row[j] - lo) / range;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fit_transform_maps_to_unit_range() {
        let mut x = array![[10.0, 100.0, 7.0], [20.0, 300.0, 8.0], [30.0, 200.0, 9.0]];
        let scaler = MinMaxScaler::fit(&x, 2).unwrap();
        scaler.transform(&mut x);

        assert_eq!(x.column(0).to_vec(), vec![0.0, 0.5, 1.0]);
        assert_eq!(x.column(1).to_vec(), vec![0.0, 1.0, 0.5]);
        // Columns beyond n_columns are untouched.
        assert_eq!(x.column(2).to_vec(), vec![7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_constant_column_is_shifted_only() {
        let mut x = array![[5.0], [5.0]];
        let scaler = MinMaxScaler::fit(&x, 1).unwrap();
        scaler.transform(&mut x);
        assert_eq!(x.column(0).to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_transform_row_does_not_clip() {
        let x = array![[0.0], [10.0]];
        let scaler = MinMaxScaler::fit(&x, 1).unwrap();
        let mut row = array![20.0, 1.0];
        scaler.transform_row(&mut row);
        assert_eq!(row[0], 2.0);
        assert_eq!(row[1], 1.0);
    }

    #[test]
    fn test_fit_rejects_empty() {
        let x = Array2::<f64>::zeros((0, 4));
        assert!(MinMaxScaler::fit(&x, 4).is_err());
    }
}
