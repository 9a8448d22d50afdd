//! Random forest: bagged CART regression trees, averaged.

use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::Rng;
use rand::rngs::StdRng;
use tracing::debug;

use super::tree::{RegressionTree, TreeParams};
use super::{Predictor, Strategy};
use crate::config::ForestConfig;
use crate::error::{Result, ValuationError};

pub const LABEL: &str = "random forest";

#[derive(Debug, Clone)]
pub struct RandomForest {
    n_estimators: usize,
    params: TreeParams,
}

impl RandomForest {
    pub fn new(config: &ForestConfig) -> Self {
        Self {
            n_estimators: config.n_estimators,
            params: TreeParams::from(config),
        }
    }
}

impl Strategy for RandomForest {
    fn label(&self) -> &'static str {
        LABEL
    }

    /// Each tree sees a bootstrap sample of `n` rows drawn with replacement.
    fn fit(
        &self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        rng: &mut StdRng,
    ) -> Result<Box<dyn Predictor>> {
        let n = y.len();
        if n == 0 || x.nrows() != n {
            return Err(ValuationError::Training(format!(
                "random forest needs matching, non-empty inputs (x has {} rows, y has {n})",
                x.nrows()
            )));
        }

        let trees: Vec<RegressionTree> = (0..self.n_estimators)
            .map(|_| {
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::fit(x, y, &bootstrap, &self.params)
            })
            .collect();

        debug!(
            trees = trees.len(),
            max_depth = trees.iter().map(RegressionTree::depth).max().unwrap_or(0),
            "Random forest grown"
        );

        Ok(Box::new(FittedForest { trees }))
    }
}

#[derive(Debug)]
pub struct FittedForest {
    trees: Vec<RegressionTree>,
}

impl Predictor for FittedForest {
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(ValuationError::Training("random forest has no trees".to_string()));
        }
        let n_trees = self.trees.len() as f64;
        Ok(x.rows()
            .into_iter()
            .map(|row| self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / n_trees)
            .collect())
    }
}
