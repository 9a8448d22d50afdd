//! Degree-2 polynomial regression.
//!
//! For inputs `[a, b]` the expansion is `[1, a, b, a², ab, b²]`. The expansion
//! travels with the fitted model, so a row projected for prediction is
//! expanded exactly like the training rows were.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::rngs::StdRng;

use super::linear::LinearRegression;
use super::{FeatureExpansion, Predictor, Strategy};
use crate::error::{Result, ValuationError};

pub const LABEL: &str = "polynomial regression";

/// All monomials of the input features up to `degree`, bias first, in
/// graded lexicographic order.
#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialExpansion {
    n_features_in: usize,
    combinations: Vec<Vec<usize>>,
}

impl PolynomialExpansion {
    pub fn new(n_features_in: usize, degree: usize) -> Self {
        let mut combinations = vec![Vec::new()];
        let mut frontier: Vec<Vec<usize>> = vec![Vec::new()];

        for _ in 0..degree {
            let mut next = Vec::new();
            for combo in &frontier {
                let start = combo.last().copied().unwrap_or(0);
                for feature in start..n_features_in {
                    let mut extended = combo.clone();
                    extended.push(feature);
                    next.push(extended);
                }
            }
            combinations.extend(next.iter().cloned());
            frontier = next;
        }

        Self {
            n_features_in,
            combinations,
        }
    }

    pub fn n_features_out(&self) -> usize {
        self.combinations.len()
    }

    fn expand_row(&self, row: ArrayView1<'_, f64>, out: &mut [f64]) {
        for (slot, combo) in out.iter_mut().zip(&self.combinations) {
            *slot = combo.iter().map(|&f| row[f]).product();
        }
    }
}

impl FeatureExpansion for PolynomialExpansion {
    fn expand(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features_in {
            return Err(ValuationError::Training(format!(
                "polynomial expansion fitted on {} features, got {}",
                self.n_features_in,
                x.ncols()
            )));
        }

        let mut out = Array2::zeros((x.nrows(), self.n_features_out()));
        let mut buffer = vec![0.0; self.n_features_out()];
        for (i, row) in x.rows().into_iter().enumerate() {
            self.expand_row(row, &mut buffer);
            out.row_mut(i).assign(&ArrayView1::from(&buffer[..]));
        }
        Ok(out)
    }
}

#[derive(Debug, Clone)]
pub struct PolynomialRegression {
    degree: usize,
    ridge: f64,
}

impl PolynomialRegression {
    pub fn new(degree: usize, ridge: f64) -> Self {
        Self { degree, ridge }
    }
}

impl Strategy for PolynomialRegression {
    fn label(&self) -> &'static str {
        LABEL
    }

    fn fit(
        &self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        _rng: &mut StdRng,
    ) -> Result<Box<dyn Predictor>> {
        let expansion = PolynomialExpansion::new(x.ncols(), self.degree);
        let expanded = expansion.expand(x)?;
        let linear = LinearRegression::fit(expanded.view(), y, self.ridge)?;

        Ok(Box::new(FittedPolynomial { expansion, linear }))
    }
}

#[derive(Debug)]
pub struct FittedPolynomial {
    expansion: PolynomialExpansion,
    linear: LinearRegression,
}

impl Predictor for FittedPolynomial {
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        let expanded = self.expansion.expand(x)?;
        Ok(self.linear.predict(expanded.view()))
    }
}
