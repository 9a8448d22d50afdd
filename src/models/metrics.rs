use ndarray::ArrayView1;

/// Mean of |y_true - y_pred|. Returns 0.0 for empty input.
pub fn mean_absolute_error(y_true: ArrayView1<'_, f64>, y_pred: ArrayView1<'_, f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let total: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).abs())
        .sum();
    total / y_true.len() as f64
}

/// Mean of |y_true - y_pred| / |y_true|, as a fraction rather than a percentage.
///
/// The denominator is floored at `f64::EPSILON` so a zero price yields a huge
/// error instead of a division by zero. Returns 0.0 for empty input.
pub fn mean_absolute_percentage_error(
    y_true: ArrayView1<'_, f64>,
    y_pred: ArrayView1<'_, f64>,
) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let total: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).abs() / t.abs().max(f64::EPSILON))
        .sum();
    total / y_true.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mae() {
        let y = array![100.0, 200.0, 300.0];
        let p = array![110.0, 190.0, 300.0];
        assert!((mean_absolute_error(y.view(), p.view()) - 20.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_mape_is_a_fraction() {
        let y = array![100.0, 200.0];
        let p = array![110.0, 180.0];
        assert!((mean_absolute_percentage_error(y.view(), p.view()) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input() {
        let empty = ndarray::Array1::<f64>::zeros(0);
        assert_eq!(mean_absolute_error(empty.view(), empty.view()), 0.0);
        assert_eq!(mean_absolute_percentage_error(empty.view(), empty.view()), 0.0);
    }

    #[test]
    fn test_mape_zero_target_does_not_divide_by_zero() {
        let y = array![0.0];
        let p = array![1.0];
        assert!(mean_absolute_percentage_error(y.view(), p.view()).is_finite());
    }
}
