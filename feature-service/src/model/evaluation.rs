use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Held-out error metrics of a fitted model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

impl RegressionMetrics {
    /// `None` when there is nothing to evaluate.
    ///
    /// R² follows the usual convention: 1.0 for a perfect fit on a constant
    /// target, 0.0 for an imperfect one.
    pub fn evaluate(y_true: ArrayView1<'_, f64>, y_pred: ArrayView1<'_, f64>) -> Option<Self> {
        if y_true.is_empty() || y_true.len() != y_pred.len() {
            return None;
        }

        let errors = &y_true - &y_pred;
        let mse = errors.mapv(|e| e * e).mean()?;
        let mae = errors.mapv(f64::abs).mean()?;

        let mean = y_true.mean()?;
        let sst = y_true.mapv(|t| (t - mean).powi(2)).sum();
        let sse = errors.mapv(|e| e * e).sum();

        let r2 = if sst > 0.0 {
            1.0 - sse / sst
        } else if sse == 0.0 {
            1.0
        } else {
            0.0
        };

        Some(Self {
            mse,
            rmse: mse.sqrt(),
            mae,
            r2,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    #[test]
    fn metrics_for_small_sample() {
        let m = RegressionMetrics::evaluate(array![10.0, 20.0, 30.0].view(), array![12.0, 18.0, 31.0].view())
            .unwrap();
        assert!((m.mse - 3.0).abs() < 1e-12);
        assert!((m.rmse - 3.0_f64.sqrt()).abs() < 1e-12);
        assert!((m.mae - 5.0 / 3.0).abs() < 1e-12);
        assert!((m.r2 - (1.0 - 9.0 / 200.0)).abs() < 1e-12);
        assert!(m.rmse >= m.mae);
    }

    #[test]
    fn constant_target_convention() {
        let perfect = RegressionMetrics::evaluate(array![2.0, 2.0].view(), array![2.0, 2.0].view()).unwrap();
        assert_eq!(perfect.r2, 1.0);
        let off = RegressionMetrics::evaluate(array![2.0, 2.0].view(), array![2.0, 3.0].view()).unwrap();
        assert_eq!(off.r2, 0.0);
    }

    #[test]
    fn empty_or_mismatched_input_has_no_metrics() {
        let empty = Array1::<f64>::zeros(0);
        assert!(RegressionMetrics::evaluate(empty.view(), empty.view()).is_none());
        assert!(RegressionMetrics::evaluate(array![1.0].view(), array![1.0, 2.0].view()).is_none());
    }
}
