use std::{
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::Path,
};

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use super::{evaluation::RegressionMetrics, ModelError, Regressor};

/// Diagonal load added to the standardised normal equations.
const RIDGE: f64 = 1e-10;

/// A column whose centred norm is this small relative to its magnitude is
/// treated as constant.
const CONSTANT_TOL: f64 = 1e-12;

/// Ordinary least squares linear regression with an intercept.
///
/// Serialized as the JSON model artifact shared by training, batch inference
/// and the prediction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub feature_names: Vec<String>,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub metrics: Option<RegressionMetrics>,
    #[serde(default)]
    pub train_rows: usize,
    #[serde(default)]
    pub test_rows: usize,
    /// RFC 3339 timestamp of the fit.
    #[serde(default)]
    pub fitted_at: Option<String>,
}

impl LinearModel {
    /// Fit `y` on the columns of `x`.
    ///
    /// Columns are centred and scaled to unit length before the normal
    /// equations `Z'Z b = Z'y` are formed, so a feature with a huge range does
    /// not swamp one measured in fractions. Constant columns get a zero
    /// coefficient; exactly collinear ones share their weight through the
    /// ridge term.
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>, feature_names: Vec<String>) -> Result<Self, ModelError> {
        let n = x.nrows();
        if n == 0 {
            return Err(ModelError::NotEnoughRows(0));
        }
        if y.len() != n {
            return Err(ModelError::DimensionMismatch {
                expected: n,
                got: y.len(),
            });
        }
        if x.ncols() != feature_names.len() {
            return Err(ModelError::DimensionMismatch {
                expected: feature_names.len(),
                got: x.ncols(),
            });
        }

        let x_mean = x.mean_axis(Axis(0)).ok_or(ModelError::NotEnoughRows(n))?;
        let y_mean = y.mean().ok_or(ModelError::NotEnoughRows(n))?;
        let centred = x - &x_mean;
        let yc = y - y_mean;

        let norms = centred.map_axis(Axis(0), |c| c.dot(&c).sqrt());
        let root_n = (n as f64).sqrt();
        let active: Vec<usize> = (0..x.ncols())
            .filter(|&j| norms[j] > CONSTANT_TOL * (1.0 + x_mean[j].abs()) * root_n)
            .collect();

        let scale = norms.select(Axis(0), &active);
        let z = &centred.select(Axis(1), &active) / &scale;

        let mut xtx = z.t().dot(&z);
        for i in 0..active.len() {
            xtx[[i, i]] += RIDGE;
        }
        let xty = z.t().dot(&yc);
        let beta = cholesky_solve(&xtx, &xty).ok_or(ModelError::SingularMatrix)?;

        let mut coefficients = Array1::<f64>::zeros(x.ncols());
        for (k, &j) in active.iter().enumerate() {
            coefficients[j] = beta[k] / scale[k];
        }
        let intercept = y_mean - coefficients.dot(&x_mean);

        Ok(Self {
            feature_names,
            intercept,
            coefficients: coefficients.to_vec(),
            metrics: None,
            train_rows: n,
            test_rows: 0,
            fitted_at: None,
        })
    }

    fn coefficient_view(&self) -> ArrayView1<'_, f64> {
        ArrayView1::from(self.coefficients.as_slice())
    }

    /// Predict every row of `x`.
    pub fn predict_matrix(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        if x.ncols() != self.coefficients.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.coefficients.len(),
                got: x.ncols(),
            });
        }
        Ok(x.dot(&self.coefficient_view()) + self.intercept)
    }

    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let file = File::open(path)?;
        let model: LinearModel = serde_json::from_reader(BufReader::new(file))?;

        if model.coefficients.len() != model.feature_names.len() {
            return Err(ModelError::InvalidArtifact(format!(
                "{} coefficients for {} features",
                model.coefficients.len(),
                model.feature_names.len()
            )));
        }
        if !model.intercept.is_finite() || model.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::InvalidArtifact("non-finite parameters".to_string()));
        }

        Ok(model)
    }
}

impl Regressor for LinearModel {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, features: ArrayView1<'_, f64>) -> f64 {
        self.intercept + self.coefficient_view().dot(&features)
    }
}

/// Solve `a x = b` for symmetric positive definite `a` via `a = L L'`.
/// `None` when a pivot is not positive.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let sum = l.row(i).slice(ndarray::s![..j]).dot(&l.row(j).slice(ndarray::s![..j]));
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 || !diag.is_finite() {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let sum = l.row(i).slice(ndarray::s![..i]).dot(&z.slice(ndarray::s![..i]));
        z[i] = (b[i] - sum) / l[[i, i]];
    }

    // L' x = z
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let sum = l.column(i).slice(ndarray::s![i + 1..]).dot(&x.slice(ndarray::s![i + 1..]));
        x[i] = (z[i] - sum) / l[[i, i]];
    }

    Some(x)
}
