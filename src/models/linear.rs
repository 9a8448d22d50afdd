//! Ordinary least squares with an intercept.
//!
//! Solved through the normal equations on centred data with a small diagonal
//! ridge term, so exactly collinear columns (a dummy and its own square, a
//! column that is constant within the training split) still yield a unique
//! solution instead of a singular system.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{Result, ValuationError};

#[derive(Debug, Clone)]
pub struct LinearRegression {
    coefficients: Array1<f64>,
    intercept: f64,
}

impl LinearRegression {
    /// `ridge` is relative to the mean diagonal of the Gram matrix, which
    /// keeps it negligible whatever the feature scale.
    pub fn fit(x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, ridge: f64) -> Result<Self> {
        if x.nrows() == 0 || x.nrows() != y.len() {
            return Err(ValuationError::Training(format!(
                "least squares needs matching, non-empty inputs (x has {} rows, y has {})",
                x.nrows(),
                y.len()
            )));
        }

        let x_mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| ValuationError::Training("cannot centre empty matrix".to_string()))?;
        let y_mean = y
            .mean()
            .ok_or_else(|| ValuationError::Training("cannot centre empty target".to_string()))?;

        let xc = &x - &x_mean;
        let yc = &y - y_mean;

        let mut gram = xc.t().dot(&xc);
        let rhs = xc.t().dot(&yc);

        let p = gram.nrows();
        if p > 0 {
            let scale = (gram.diag().sum() / p as f64).max(1.0);
            for i in 0..p {
                gram[[i, i]] += ridge * scale;
            }
        }

        let coefficients = solve_cholesky(gram, rhs)?;
        let intercept = y_mean - x_mean.dot(&coefficients);

        Ok(Self {
            coefficients,
            intercept,
        })
    }

    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        x.dot(&self.coefficients) + self.intercept
    }

    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

/// Solves `a · x = b` for symmetric positive definite `a`.
fn solve_cholesky(a: Array2<f64>, b: Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for j in 0..n {
        let mut pivot = a[[j, j]];
        for k in 0..j {
            pivot -= l[[j, k]] * l[[j, k]];
        }
        if !(pivot > 0.0 && pivot.is_finite()) {
            return Err(ValuationError::Training(format!(
                "normal equations are not positive definite (pivot {pivot:e} at column {j})"
            )));
        }
        let diag = pivot.sqrt();
        l[[j, j]] = diag;

        for i in (j + 1)..n {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = sum / diag;
        }
    }

    // Forward: L z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * z[k];
        }
        z[i] = sum / l[[i, i]];
    }

    // Backward: Lᵀ x = z
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = z[i];
        for k in (i + 1)..n {
            sum -= l[[k, i]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }

    Ok(x)
}
