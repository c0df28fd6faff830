//! Lag-order selection and equation-wise OLS estimation.

use nalgebra::DMatrix;
use tracing::{debug, info, warn};

use crate::core::Series;
use crate::error::{ForecastError, Result, Warning};
use crate::models::var::config::{Deterministic, VarConfig, VarCriterion};
use crate::models::var::model::{LagOrderSelection, VarCriteria, VarModel};
use crate::utils::ols::ols_multi;

/// Fits vector autoregressions to aligned series.
///
/// # Example
///
/// ```
/// use sarima_select::core::Series;
/// use sarima_select::models::var::{VarConfig, VarEngine};
///
/// let jitter = |i: usize, m: usize| ((i * m) % 101) as f64 / 101.0 - 0.5;
/// let a: Vec<f64> = (0..120).map(|i| (i as f64 * 0.37).sin() + jitter(i, 37)).collect();
/// let b: Vec<f64> = (0..120).map(|i| (i as f64 * 0.21).cos() + jitter(i, 53)).collect();
/// let series = vec![Series::new(a, 1).unwrap(), Series::new(b, 1).unwrap()];
///
/// let model = VarEngine::new(VarConfig::default().with_max_lag(4)).fit(&series).unwrap();
/// assert!(model.lag() >= 1 && model.lag() <= 4);
/// assert_eq!(model.dimension(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct VarEngine {
    config: VarConfig,
}

impl VarEngine {
    pub fn new(config: VarConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VarConfig {
        &self.config
    }

    /// Select the lag order and estimate the VAR.
    ///
    /// # Errors
    /// `InvalidParameter` for fewer than two series or a zero lag bound,
    /// `DimensionMismatch` for series of different lengths,
    /// `InsufficientData` when even one lag cannot be estimated.
    pub fn fit(&self, series: &[Series]) -> Result<VarModel> {
        if series.len() < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "VAR needs at least two series, got {}",
                series.len()
            )));
        }
        let n = series[0].len();
        if let Some(bad) = series.iter().find(|s| s.len() != n) {
            return Err(ForecastError::DimensionMismatch {
                expected: n,
                got: bad.len(),
            });
        }
        let data: Vec<Vec<f64>> = series.iter().map(|s| s.values().to_vec()).collect();
        let k = data.len();
        let det = self.config.deterministic;
        let nd = det.count();

        let max_lag = self.config.fixed_lag.unwrap_or(self.config.max_lag);
        if max_lag == 0 {
            return Err(ForecastError::InvalidParameter(
                "VAR lag order must be at least 1".into(),
            ));
        }
        // Rows left after conditioning must exceed regressors plus equations.
        let feasible = |p: usize| n > p && n - p > k * p + nd + k;
        let needed = |p: usize| p + k * p + nd + k + 1;

        let (lag, selection) = match self.config.fixed_lag {
            Some(p) => {
                if !feasible(p) {
                    return Err(ForecastError::InsufficientData {
                        needed: needed(p),
                        got: n,
                    });
                }
                (p, None)
            }
            None => {
                let cap = (1..=max_lag).rev().find(|&p| feasible(p)).ok_or(
                    ForecastError::InsufficientData {
                        needed: needed(1),
                        got: n,
                    },
                )?;
                let selection = select_lag(&data, cap, det, self.config.criterion)?;
                (selection.selected, Some(selection))
            }
        };

        let (x, y) = design(&data, lag, lag, det);
        let (coef, residuals) = ols_multi(&x, &y)?;
        let t = residuals.nrows();
        let df = t - x.ncols();
        let sigma_u = residuals.transpose() * &residuals / df as f64;

        let coefficients: Vec<DMatrix<f64>> = (0..lag)
            .map(|i| DMatrix::from_fn(k, k, |eq, var| coef[(nd + i * k + var, eq)]))
            .collect();
        let deterministic_coefficients = DMatrix::from_fn(k, nd, |eq, j| coef[(j, eq)]);

        let eigen_moduli = companion_moduli(&coefficients)?;
        let max_modulus = eigen_moduli.first().copied().unwrap_or(0.0);
        let stable = max_modulus < 1.0;

        let mut fitted = vec![vec![f64::NAN; n]; k];
        for (row, obs) in (lag..n).enumerate() {
            for var in 0..k {
                fitted[var][obs] = data[var][obs] - residuals[(row, var)];
            }
        }

        let mut warnings = Vec::new();
        if !stable {
            let w = Warning::UnstableVar { max_modulus };
            warn!(%w, "fitted VAR is not stable");
            warnings.push(w);
        }
        info!(lag, variables = k, max_modulus, stable, "VAR fitted");

        Ok(VarModel {
            lag,
            deterministic: det,
            coefficients,
            deterministic_coefficients,
            sigma_u,
            residuals,
            fitted,
            eigen_moduli,
            stable,
            lag_selection: selection,
            data,
            end: series[0].end(),
            warnings,
        })
    }
}

/// Regressors `[deterministic, y_{t-1}, ..., y_{t-p}]` and responses `y_t`
/// for observations `start..n`.
pub(crate) fn design(
    data: &[Vec<f64>],
    p: usize,
    start: usize,
    det: Deterministic,
) -> (DMatrix<f64>, DMatrix<f64>) {
    let k = data.len();
    let n = data[0].len();
    let nd = det.count();
    let rows = n - start;
    let x = DMatrix::from_fn(rows, nd + k * p, |i, c| {
        let t = start + i;
        if c < nd {
            det.row(t)[c]
        } else {
            let lag = (c - nd) / k + 1;
            data[(c - nd) % k][t - lag]
        }
    });
    let y = DMatrix::from_fn(rows, k, |i, j| data[j][start + i]);
    (x, y)
}

/// Evaluate every lag `1..=cap` on the sample that starts at `cap`.
fn select_lag(
    data: &[Vec<f64>],
    cap: usize,
    det: Deterministic,
    criterion: VarCriterion,
) -> Result<LagOrderSelection> {
    let k = data.len();
    let mut values = Vec::with_capacity(cap);
    for p in 1..=cap {
        let (x, y) = design(data, p, cap, det);
        let criteria = match ols_multi(&x, &y) {
            Ok((_, u)) => VarCriteria::from_residuals(&u, k * p + det.count(), k),
            Err(ForecastError::ComputationError(_)) => VarCriteria::undefined(),
            Err(err) => return Err(err),
        };
        debug!(lag = p, aic = criteria.aic, bic = criteria.bic, "VAR lag candidate");
        values.push((p, criteria));
    }

    let selected = values
        .iter()
        .filter(|(_, c)| c.get(criterion).is_finite())
        .min_by(|a, b| a.1.get(criterion).total_cmp(&b.1.get(criterion)))
        .map(|(p, _)| *p)
        .ok_or_else(|| {
            ForecastError::ComputationError("no lag order gave a finite criterion".into())
        })?;

    Ok(LagOrderSelection {
        criterion,
        values,
        selected,
    })
}

/// Eigenvalue moduli of the companion matrix, largest first.
pub(crate) fn companion_moduli(coefficients: &[DMatrix<f64>]) -> Result<Vec<f64>> {
    let p = coefficients.len();
    if p == 0 {
        return Ok(vec![]);
    }
    let k = coefficients[0].nrows();
    let dim = k * p;
    let companion = DMatrix::from_fn(dim, dim, |i, j| {
        if i < k {
            coefficients[j / k][(i, j % k)]
        } else if i == j + k {
            1.0
        } else {
            0.0
        }
    });
    let schur = companion.try_schur(1e-12, 10_000).ok_or_else(|| {
        ForecastError::ComputationError("companion eigenvalues did not converge".into())
    })?;
    let mut moduli: Vec<f64> = schur
        .complex_eigenvalues()
        .iter()
        .map(|z| z.norm())
        .collect();
    moduli.sort_by(|a, b| b.total_cmp(a));
    Ok(moduli)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn design_layout() {
        let data = vec![vec![1.0, 2.0, 3.0, 4.0], vec![10.0, 20.0, 30.0, 40.0]];
        let (x, y) = design(&data, 2, 2, Deterministic::Constant);
        assert_eq!(x.shape(), (2, 5));
        // Row for t = 2: [1, y0_{1}, y1_{1}, y0_{0}, y1_{0}]
        assert_eq!(x.row(0).iter().copied().collect::<Vec<_>>(), vec![1.0, 2.0, 20.0, 1.0, 10.0]);
        assert_eq!(y[(1, 1)], 40.0);
    }

    #[test]
    fn companion_of_diagonal_var1() {
        let a = DMatrix::from_row_slice(2, 2, &[0.5, 0.0, 0.0, -0.8]);
        let moduli = companion_moduli(&[a]).unwrap();
        assert_relative_eq!(moduli[0], 0.8, epsilon = 1e-10);
        assert_relative_eq!(moduli[1], 0.5, epsilon = 1e-10);
    }

    #[test]
    fn companion_of_var2_matches_univariate_roots() {
        // y_t = 1.2 y_{t-1} - 0.35 y_{t-2} has inverse roots 0.7 and 0.5
        let a1 = DMatrix::from_row_slice(2, 2, &[1.2, 0.0, 0.0, 0.0]);
        let a2 = DMatrix::from_row_slice(2, 2, &[-0.35, 0.0, 0.0, 0.0]);
        let moduli = companion_moduli(&[a1, a2]).unwrap();
        assert_relative_eq!(moduli[0], 0.7, epsilon = 1e-8);
        assert_relative_eq!(moduli[1], 0.5, epsilon = 1e-8);
    }
}
