//! Randomized train/validation split.

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{Result, ValuationError};

#[derive(Debug, Clone)]
pub struct Split {
    pub x_train: Array2<f64>,
    pub y_train: Array1<f64>,
    pub x_valid: Array2<f64>,
    pub y_valid: Array1<f64>,
}

/// Shuffles rows and holds out `ceil(n * held_out)` of them for validation,
/// keeping at least one row on each side.
pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    held_out: f64,
    rng: &mut StdRng,
) -> Result<Split> {
    let n = y.len();
    if n < 2 {
        return Err(ValuationError::InsufficientData(format!(
            "need at least 2 usable listings to hold out a validation set, got {n}"
        )));
    }

    let n_valid = ((n as f64 * held_out).ceil() as usize).clamp(1, n - 1);

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    let (valid, train) = indices.split_at(n_valid);

    Ok(Split {
        x_train: x.select(Axis(0), train),
        y_train: y.select(Axis(0), train),
        x_valid: x.select(Axis(0), valid),
        y_valid: y.select(Axis(0), valid),
    })
}
