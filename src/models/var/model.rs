//! Fitted VAR model and its forecasts.

use nalgebra::DMatrix;
use serde::Serialize;

use crate::core::ForecastResult;
use crate::error::{ForecastError, Result, Warning};
use crate::models::var::config::{Deterministic, VarCriterion};

/// Information criteria of one lag order (Lütkepohl's definitions with
/// the maximum-likelihood residual covariance).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VarCriteria {
    pub aic: f64,
    pub bic: f64,
    pub hqic: f64,
    pub fpe: f64,
}

impl VarCriteria {
    pub(crate) fn undefined() -> Self {
        Self {
            aic: f64::INFINITY,
            bic: f64::INFINITY,
            hqic: f64::INFINITY,
            fpe: f64::INFINITY,
        }
    }

    /// Criteria from a `T × k` residual matrix of a system with `m`
    /// regressors per equation.
    pub(crate) fn from_residuals(residuals: &DMatrix<f64>, m: usize, k: usize) -> Self {
        let t = residuals.nrows() as f64;
        let sigma = residuals.transpose() * residuals / t;
        let det = sigma.determinant();
        if !(det > 0.0) || !det.is_finite() || residuals.nrows() <= m {
            return Self::undefined();
        }
        let ld = det.ln();
        let free = (m * k) as f64;
        let df_resid = t - m as f64;
        Self {
            aic: ld + 2.0 * free / t,
            bic: ld + t.ln() * free / t,
            hqic: ld + 2.0 * t.ln().ln() * free / t,
            fpe: ((t + m as f64) / df_resid).powi(k as i32) * det,
        }
    }

    /// Value of one criterion.
    pub fn get(&self, criterion: VarCriterion) -> f64 {
        match criterion {
            VarCriterion::Aic => self.aic,
            VarCriterion::Bic => self.bic,
            VarCriterion::Hqic => self.hqic,
            VarCriterion::Fpe => self.fpe,
        }
    }
}

/// Criteria for every lag tried on the common sample, and the winner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LagOrderSelection {
    pub criterion: VarCriterion,
    pub values: Vec<(usize, VarCriteria)>,
    pub selected: usize,
}

/// A fitted vector autoregression `y_t = D d_t + A_1 y_{t-1} + ... + A_p y_{t-p} + u_t`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarModel {
    pub(crate) lag: usize,
    pub(crate) deterministic: Deterministic,
    /// `A_1..A_p`; entry `(i, j)` is the effect of variable `j` on equation `i`.
    pub(crate) coefficients: Vec<DMatrix<f64>>,
    /// `k × d` coefficients of the deterministic terms.
    pub(crate) deterministic_coefficients: DMatrix<f64>,
    /// Residual covariance, degrees-of-freedom adjusted.
    pub(crate) sigma_u: DMatrix<f64>,
    pub(crate) residuals: DMatrix<f64>,
    pub(crate) fitted: Vec<Vec<f64>>,
    pub(crate) eigen_moduli: Vec<f64>,
    pub(crate) stable: bool,
    pub(crate) lag_selection: Option<LagOrderSelection>,
    #[serde(skip)]
    pub(crate) data: Vec<Vec<f64>>,
    pub(crate) end: i64,
    pub(crate) warnings: Vec<Warning>,
}

impl VarModel {
    /// Lag order `p`.
    pub fn lag(&self) -> usize {
        self.lag
    }

    /// Number of variables `k`.
    pub fn dimension(&self) -> usize {
        self.data.len()
    }

    pub fn deterministic(&self) -> Deterministic {
        self.deterministic
    }

    /// Coefficient matrix of lag `i` (1-based).
    pub fn coefficient_matrix(&self, i: usize) -> Option<&DMatrix<f64>> {
        i.checked_sub(1).and_then(|j| self.coefficients.get(j))
    }

    pub fn deterministic_coefficients(&self) -> &DMatrix<f64> {
        &self.deterministic_coefficients
    }

    /// Residual covariance matrix.
    pub fn sigma_u(&self) -> &DMatrix<f64> {
        &self.sigma_u
    }

    /// Residuals, one column per variable, starting at observation `p`.
    pub fn residuals(&self) -> &DMatrix<f64> {
        &self.residuals
    }

    /// In-sample fitted values of variable `var`; the first `p` are `NaN`.
    pub fn fitted_values(&self, var: usize) -> Option<&[f64]> {
        self.fitted.get(var).map(Vec::as_slice)
    }

    /// Training observations of variable `var`.
    pub fn training_values(&self, var: usize) -> Option<&[f64]> {
        self.data.get(var).map(Vec::as_slice)
    }

    /// Companion-matrix eigenvalue moduli, largest first.
    pub fn eigen_moduli(&self) -> &[f64] {
        &self.eigen_moduli
    }

    /// Largest companion eigenvalue modulus.
    pub fn max_modulus(&self) -> f64 {
        self.eigen_moduli.first().copied().unwrap_or(0.0)
    }

    /// Whether every companion eigenvalue lies strictly inside the unit circle.
    pub fn is_stable(&self) -> bool {
        self.stable
    }

    /// Lag-order criteria, when the order was selected rather than fixed.
    pub fn lag_selection(&self) -> Option<&LagOrderSelection> {
        self.lag_selection.as_ref()
    }

    /// Non-fatal conditions raised while fitting.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Number of observations entering the estimation.
    pub fn nobs(&self) -> usize {
        self.residuals.nrows()
    }

    /// Residual degrees of freedom per equation.
    pub fn df_resid(&self) -> usize {
        self.nobs() - self.deterministic.count() - self.dimension() * self.lag
    }

    pub(crate) fn data(&self) -> &[Vec<f64>] {
        &self.data
    }

    /// MA(∞) matrices `Φ_0 = I`, `Φ_i = Σ_{j=1}^{min(i,p)} Φ_{i-j} A_j`.
    pub fn ma_weights(&self, h: usize) -> Vec<DMatrix<f64>> {
        let k = self.dimension();
        let mut phi: Vec<DMatrix<f64>> = Vec::with_capacity(h);
        for i in 0..h {
            if i == 0 {
                phi.push(DMatrix::identity(k, k));
                continue;
            }
            let mut next = DMatrix::zeros(k, k);
            for j in 1..=i.min(self.lag) {
                next += &phi[i - j] * &self.coefficients[j - 1];
            }
            phi.push(next);
        }
        phi
    }

    /// Forecast every variable `horizon` steps ahead.
    ///
    /// # Errors
    /// `UnstableVar` if the model is not stable; use [`forecast_with`](Self::forecast_with)
    /// to opt in to forecasting an unstable process.
    pub fn forecast(&self, horizon: usize, levels: &[f64]) -> Result<VarForecast> {
        self.forecast_with(horizon, levels, &VarForecastOptions::default())
    }

    /// Forecast with explicit options.
    pub fn forecast_with(
        &self,
        horizon: usize,
        levels: &[f64],
        options: &VarForecastOptions,
    ) -> Result<VarForecast> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "forecast horizon must be at least 1".into(),
            ));
        }
        if !self.stable && !options.allow_unstable {
            return Err(ForecastError::UnstableVar {
                max_modulus: self.max_modulus(),
            });
        }
        let k = self.dimension();
        if let Some(last) = &options.integrate_from {
            if last.len() != k {
                return Err(ForecastError::DimensionMismatch {
                    expected: k,
                    got: last.len(),
                });
            }
        }

        let n = self.data[0].len();
        let p = self.lag;
        let mut path: Vec<Vec<f64>> = (n - p..n)
            .map(|t| self.data.iter().map(|col| col[t]).collect())
            .collect();
        let mut point = vec![Vec::with_capacity(horizon); k];
        for step in 0..horizon {
            let det_row = self.deterministic.row(n + step);
            let len = path.len();
            let yhat: Vec<f64> = (0..k)
                .map(|eq| {
                    let mut v: f64 = det_row
                        .iter()
                        .enumerate()
                        .map(|(j, d)| self.deterministic_coefficients[(eq, j)] * d)
                        .sum();
                    for (lag, a) in self.coefficients.iter().enumerate() {
                        let past = &path[len - 1 - lag];
                        v += (0..k).map(|var| a[(eq, var)] * past[var]).sum::<f64>();
                    }
                    v
                })
                .collect();
            for (var, v) in yhat.iter().enumerate() {
                point[var].push(*v);
            }
            path.push(yhat);
        }

        let mut weights = self.ma_weights(horizon);
        if let Some(last) = &options.integrate_from {
            for (var, series) in point.iter_mut().enumerate() {
                let mut level = last[var];
                for v in series.iter_mut() {
                    level += *v;
                    *v = level;
                }
            }
            for i in 1..weights.len() {
                let prev = weights[i - 1].clone();
                weights[i] += prev;
            }
        }

        let mut mse = DMatrix::zeros(k, k);
        let mut std_errors = vec![Vec::with_capacity(horizon); k];
        for w in &weights {
            mse += w * &self.sigma_u * w.transpose();
            for (var, se) in std_errors.iter_mut().enumerate() {
                se.push(mse[(var, var)].max(0.0).sqrt());
            }
        }

        let variables = point
            .into_iter()
            .zip(std_errors)
            .map(|(pt, se)| ForecastResult::from_normal(self.end, pt, se, levels))
            .collect::<Result<Vec<_>>>()?;

        Ok(VarForecast { variables })
    }
}

/// Switches for [`VarModel::forecast_with`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VarForecastOptions {
    /// Forecast even if the model is unstable.
    pub allow_unstable: bool,
    /// The VAR was fitted on first differences; cumulate forecasts from
    /// these last observed levels, one per variable.
    pub integrate_from: Option<Vec<f64>>,
}

impl VarForecastOptions {
    pub fn allow_unstable(mut self) -> Self {
        self.allow_unstable = true;
        self
    }

    pub fn integrate_from(mut self, last_levels: Vec<f64>) -> Self {
        self.integrate_from = Some(last_levels);
        self
    }
}

/// One forecast per variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarForecast {
    variables: Vec<ForecastResult>,
}

impl VarForecast {
    /// Forecast of variable `var`.
    pub fn variable(&self, var: usize) -> Option<&ForecastResult> {
        self.variables.get(var)
    }

    pub fn variables(&self) -> &[ForecastResult] {
        &self.variables
    }

    /// Take the forecast of one variable.
    pub fn into_variable(mut self, var: usize) -> Option<ForecastResult> {
        (var < self.variables.len()).then(|| self.variables.swap_remove(var))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Series;
    use crate::models::var::{VarConfig, VarEngine};
    use approx::assert_relative_eq;

    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        (0..n)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((state >> 11) as f64 / (1u64 << 53) as f64) - 0.5
            })
            .collect()
    }

    /// y0_t = 0.5 y0_{t-1} + e0, y1_t = 0.4 y0_{t-1} + 0.3 y1_{t-1} + e1
    fn simulate(n: usize) -> Vec<Series> {
        let e0 = noise(n, 1);
        let e1 = noise(n, 2);
        let (mut a, mut b) = (vec![0.0; n], vec![0.0; n]);
        for t in 1..n {
            a[t] = 0.5 * a[t - 1] + e0[t];
            b[t] = 0.4 * a[t - 1] + 0.3 * b[t - 1] + e1[t];
        }
        vec![Series::new(a, 1).unwrap(), Series::new(b, 1).unwrap()]
    }

    fn fit_var1(series: &[Series]) -> VarModel {
        VarEngine::new(VarConfig::default().with_fixed_lag(1))
            .fit(series)
            .unwrap()
    }

    #[test]
    fn recovers_var1_coefficients() {
        let model = fit_var1(&simulate(3000));
        let a = model.coefficient_matrix(1).unwrap();
        assert_relative_eq!(a[(0, 0)], 0.5, epsilon = 0.08);
        assert_relative_eq!(a[(0, 1)], 0.0, epsilon = 0.08);
        assert_relative_eq!(a[(1, 0)], 0.4, epsilon = 0.08);
        assert_relative_eq!(a[(1, 1)], 0.3, epsilon = 0.08);
        // Uniform(-0.5, 0.5) innovations have variance 1/12
        assert_relative_eq!(model.sigma_u()[(0, 0)], 1.0 / 12.0, epsilon = 0.01);
        assert!(model.is_stable());
        assert!(model.warnings().is_empty());
        assert!(model.coefficient_matrix(0).is_none());
        assert!(model.coefficient_matrix(2).is_none());
    }

    #[test]
    fn ma_weights_of_var1_are_powers() {
        let model = fit_var1(&simulate(300));
        let a = model.coefficient_matrix(1).unwrap().clone();
        let phi = model.ma_weights(4);
        assert_eq!(phi[0], DMatrix::identity(2, 2));
        let a3 = &a * &a * &a;
        for i in 0..2 {
            for j in 0..2 {
                assert_relative_eq!(phi[3][(i, j)], a3[(i, j)], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn one_step_standard_error_is_residual_scale() {
        let model = fit_var1(&simulate(300));
        let forecast = model.forecast(5, &[0.95]).unwrap();
        for var in 0..2 {
            let f = forecast.variable(var).unwrap();
            assert_eq!(f.horizon(), 5);
            assert_relative_eq!(f.std_errors()[0], model.sigma_u()[(var, var)].sqrt(), epsilon = 1e-12);
            assert!(f.std_errors().windows(2).all(|w| w[1] >= w[0]));
        }
    }

    #[test]
    fn one_step_point_matches_recursion() {
        let series = simulate(200);
        let model = fit_var1(&series);
        let forecast = model.forecast(1, &[0.95]).unwrap();
        let a = model.coefficient_matrix(1).unwrap();
        let c = model.deterministic_coefficients();
        let last = [series[0].last(), series[1].last()];
        for eq in 0..2 {
            let expected = c[(eq, 0)] + a[(eq, 0)] * last[0] + a[(eq, 1)] * last[1];
            assert_relative_eq!(forecast.variable(eq).unwrap().point()[0], expected, epsilon = 1e-12);
        }
        assert_eq!(forecast.variable(0).unwrap().start(), 200);
    }

    #[test]
    fn integrated_forecast_cumulates() {
        let series = simulate(200);
        let model = fit_var1(&series);
        let diffs = model.forecast(3, &[0.95]).unwrap();
        let levels = model
            .forecast_with(3, &[0.95], &VarForecastOptions::default().integrate_from(vec![10.0, -5.0]))
            .unwrap();
        let d0 = diffs.variable(0).unwrap().point();
        let l0 = levels.variable(0).unwrap().point();
        assert_relative_eq!(l0[0], 10.0 + d0[0], epsilon = 1e-12);
        assert_relative_eq!(l0[2], 10.0 + d0[0] + d0[1] + d0[2], epsilon = 1e-12);
        // Level uncertainty accumulates faster than difference uncertainty
        let se_d = diffs.variable(0).unwrap().std_errors();
        let se_l = levels.variable(0).unwrap().std_errors();
        assert_relative_eq!(se_l[0], se_d[0], epsilon = 1e-12);
        assert!(se_l[2] > se_d[2]);
    }

    #[test]
    fn integrate_from_requires_one_level_per_variable() {
        let model = fit_var1(&simulate(100));
        let err = model
            .forecast_with(3, &[0.95], &VarForecastOptions::default().integrate_from(vec![1.0]))
            .unwrap_err();
        assert_eq!(err, ForecastError::DimensionMismatch { expected: 2, got: 1 });
    }

    #[test]
    fn zero_horizon_rejected() {
        let model = fit_var1(&simulate(100));
        assert!(matches!(
            model.forecast(0, &[0.95]),
            Err(ForecastError::InvalidParameter(_))
        ));
    }
}
