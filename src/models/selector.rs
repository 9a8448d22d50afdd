//! Trains every candidate strategy on one split and keeps the best.

use ndarray::{Array1, ArrayView1};
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::info;

use super::metrics::{mean_absolute_error, mean_absolute_percentage_error};
use super::{Predictor, Split, Strategy};
use crate::error::{Result, ValuationError};

/// Validation errors of one trained strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub label: &'static str,
    pub mae: f64,
    pub mape: f64,
}

/// The winning model, ready to predict rows in the training feature space.
#[derive(Debug)]
pub struct SelectedModel {
    model: Box<dyn Predictor>,
    evaluation: Evaluation,
    evaluations: Vec<Evaluation>,
}

impl SelectedModel {
    pub fn label(&self) -> &'static str {
        self.evaluation.label
    }

    pub fn evaluation(&self) -> &Evaluation {
        &self.evaluation
    }

    /// Every candidate's errors, in evaluation order.
    pub fn evaluations(&self) -> &[Evaluation] {
        &self.evaluations
    }

    pub fn predict(&self, row: &Array1<f64>) -> Result<f64> {
        self.model.predict_one(row.view())
    }
}

/// Fits each strategy on the training side of `split` and scores it on the
/// validation side.
///
/// The lowest MAPE wins. On a tie the earlier strategy in `strategies` is kept.
pub fn select(
    strategies: &[&dyn Strategy],
    split: &Split,
    rng: &mut StdRng,
) -> Result<SelectedModel> {
    let mut best: Option<(Box<dyn Predictor>, Evaluation)> = None;
    let mut evaluations = Vec::with_capacity(strategies.len());

    for strategy in strategies {
        let model = strategy.fit(split.x_train.view(), split.y_train.view(), rng)?;
        let y_pred = model.predict(split.x_valid.view())?;
        let evaluation = evaluate(strategy.label(), split.y_valid.view(), y_pred.view());

        info!(
            strategy = evaluation.label,
            mae = evaluation.mae,
            mape = evaluation.mape,
            "Strategy evaluated"
        );

        let better = match &best {
            None => true,
            Some((_, current)) => {
                evaluation.mape < current.mape || (current.mape.is_nan() && !evaluation.mape.is_nan())
            }
        };

        evaluations.push(evaluation.clone());
        if better {
            best = Some((model, evaluation));
        }
    }

    let (model, evaluation) =
        best.ok_or_else(|| ValuationError::Training("no strategies to evaluate".to_string()))?;

    if !evaluation.mape.is_finite() {
        return Err(ValuationError::Training(format!(
            "{} produced a non-finite validation error",
            evaluation.label
        )));
    }

    Ok(SelectedModel {
        model,
        evaluation,
        evaluations,
    })
}

fn evaluate(label: &'static str, y_true: ArrayView1<'_, f64>, y_pred: ArrayView1<'_, f64>) -> Evaluation {
    Evaluation {
        label,
        mae: mean_absolute_error(y_true, y_pred),
        mape: mean_absolute_percentage_error(y_true, y_pred),
    }
}
