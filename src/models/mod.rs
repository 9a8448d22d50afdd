//! Regression strategies and the selection between them.
//!
//! A [`Strategy`] trains on a feature matrix and hands back a boxed
//! [`Predictor`]. Any preprocessing a strategy applies on top of the shared
//! feature space (see [`FeatureExpansion`]) lives inside its predictor, so
//! callers predict the same way whichever strategy won.

pub mod forest;
pub mod linear;
pub mod metrics;
pub mod polynomial;
pub mod selector;
pub mod split;
pub mod tree;

pub use forest::{LABEL as RANDOM_FOREST_LABEL, RandomForest};
pub use polynomial::{LABEL as POLYNOMIAL_LABEL, PolynomialExpansion, PolynomialRegression};
pub use selector::{Evaluation, SelectedModel, select};
pub use split::{Split, train_test_split};

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;

use crate::error::{Result, ValuationError};

pub trait Strategy {
    /// Human-readable name reported alongside predictions.
    fn label(&self) -> &'static str;

    fn fit(
        &self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        rng: &mut StdRng,
    ) -> Result<Box<dyn Predictor>>;
}

pub trait Predictor: std::fmt::Debug {
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>>;

    fn predict_one(&self, row: ArrayView1<'_, f64>) -> Result<f64> {
        self.predict(row.insert_axis(Axis(0)))?
            .first()
            .copied()
            .ok_or_else(|| ValuationError::Training("model returned no prediction".to_string()))
    }
}

/// A deterministic feature map a strategy applies before its regressor.
pub trait FeatureExpansion {
    fn expand(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>>;
}
