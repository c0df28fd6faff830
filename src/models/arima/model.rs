//! Fitted seasonal ARIMA model (optionally with regression terms).

use serde::Serialize;

use crate::core::{ForecastResult, RegressorMatrix};
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::differencing_polynomial;
use crate::models::arima::order::OrderSpec;
use crate::models::arima::polynomial::{expand_ar, expand_ma, multiply, psi_weights};
use crate::models::arima::selection::Criterion;

/// Estimated coefficients.
///
/// AR coefficients follow `u_t = Σ φ_i u_{t-i} + ...`; MA coefficients follow
/// `... + e_t + Σ θ_i e_{t-i}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coefficients {
    /// Non-seasonal AR (φ).
    pub ar: Vec<f64>,
    /// Non-seasonal MA (θ).
    pub ma: Vec<f64>,
    /// Seasonal AR (Φ).
    pub seasonal_ar: Vec<f64>,
    /// Seasonal MA (Θ).
    pub seasonal_ma: Vec<f64>,
    /// Mean (no differencing) or drift (one difference) on the differenced scale.
    pub constant: Option<f64>,
    /// Regression coefficients, one per regressor column.
    pub regression: Vec<f64>,
}

impl Coefficients {
    /// Number of estimated coefficients (innovation variance excluded).
    pub fn len(&self) -> usize {
        self.ar.len()
            + self.ma.len()
            + self.seasonal_ar.len()
            + self.seasonal_ma.len()
            + usize::from(self.constant.is_some())
            + self.regression.len()
    }

    /// Whether no coefficient was estimated (pure white noise on the differenced scale).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// AIC, AICc and BIC of one fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InformationCriteria {
    pub aic: f64,
    pub aicc: f64,
    pub bic: f64,
}

impl InformationCriteria {
    /// Criteria from a log-likelihood with `k` free parameters over `n` observations.
    pub fn from_log_likelihood(log_likelihood: f64, k: usize, n: usize) -> Self {
        let kf = k as f64;
        let nf = n as f64;
        let aic = -2.0 * log_likelihood + 2.0 * kf;
        let aicc = if n > k + 1 {
            aic + 2.0 * kf * (kf + 1.0) / (nf - kf - 1.0)
        } else {
            f64::INFINITY
        };
        let bic = -2.0 * log_likelihood + kf * nf.ln();
        Self { aic, aicc, bic }
    }

    /// Value of the requested criterion.
    pub fn get(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::Aic => self.aic,
            Criterion::Aicc => self.aicc,
            Criterion::Bic => self.bic,
        }
    }
}

/// Everything needed to extend the fitted recursion into the future.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ForecastState {
    /// Training observations on the level scale.
    pub levels: Vec<f64>,
    /// Training regressor columns on the level scale.
    pub regressors: Vec<Vec<f64>>,
    /// ARMA disturbances `u_t` on the differenced scale.
    pub disturbances: Vec<f64>,
    /// Innovations `e_t` on the differenced scale (zero where conditioned).
    pub innovations: Vec<f64>,
    /// Time index one past the last training observation.
    pub end: i64,
}

/// A successfully fitted seasonal ARIMA, immutable once built.
///
/// Produced only by a [`ModelFitter`](crate::models::ModelFitter); a failed
/// fit yields a typed error instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FittedModel {
    pub(crate) order: OrderSpec,
    pub(crate) coefficients: Coefficients,
    pub(crate) sigma2: f64,
    pub(crate) log_likelihood: f64,
    pub(crate) criteria: InformationCriteria,
    pub(crate) nobs: usize,
    pub(crate) residuals: Vec<f64>,
    pub(crate) fitted: Vec<f64>,
    pub(crate) regressor_names: Vec<String>,
    #[serde(skip)]
    pub(crate) state: ForecastState,
}

impl FittedModel {
    /// Model order.
    pub fn order(&self) -> &OrderSpec {
        &self.order
    }

    /// Estimated coefficients.
    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    /// Innovation variance estimate.
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Conditional Gaussian log-likelihood.
    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    pub fn aic(&self) -> f64 {
        self.criteria.aic
    }

    pub fn aicc(&self) -> f64 {
        self.criteria.aicc
    }

    pub fn bic(&self) -> f64 {
        self.criteria.bic
    }

    /// All three criteria.
    pub fn criteria(&self) -> &InformationCriteria {
        &self.criteria
    }

    /// Value of one criterion.
    pub fn criterion(&self, criterion: Criterion) -> f64 {
        self.criteria.get(criterion)
    }

    /// Observations entering the likelihood.
    pub fn nobs(&self) -> usize {
        self.nobs
    }

    /// Free parameters, innovation variance included.
    pub fn num_params(&self) -> usize {
        self.coefficients.len() + 1
    }

    /// One-step-ahead residuals over the likelihood window.
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// In-sample one-step-ahead fitted values on the level scale.
    ///
    /// Aligned with the training series; entries lost to differencing and
    /// conditioning are `NaN`.
    pub fn fitted_values(&self) -> &[f64] {
        &self.fitted
    }

    /// Training observations the model was fitted on.
    pub fn training_values(&self) -> &[f64] {
        &self.state.levels
    }

    /// Whether the model carries regression terms.
    pub fn has_regressors(&self) -> bool {
        !self.regressor_names.is_empty()
    }

    /// Names of the regressors, in coefficient order.
    pub fn regressor_names(&self) -> &[String] {
        &self.regressor_names
    }

    /// Time index of the first forecast step.
    pub fn forecast_start(&self) -> i64 {
        self.state.end
    }

    /// Forecast `horizon` steps ahead with Gaussian intervals at `levels`.
    ///
    /// `future` must hold exactly `horizon` rows of the regressors the model
    /// was fitted with, and must be `None` for a model without regressors.
    /// Standard errors come from the ψ-weights of the full integrated
    /// seasonal polynomial.
    pub fn forecast(
        &self,
        horizon: usize,
        future: Option<&RegressorMatrix>,
        levels: &[f64],
    ) -> Result<ForecastResult> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "forecast horizon must be at least 1".into(),
            ));
        }
        let future_columns = self.check_future(horizon, future)?;

        let coefs = &self.coefficients;
        let period = self.order.period();
        let ar = expand_ar(&coefs.ar, &coefs.seasonal_ar, period);
        let ma = expand_ma(&coefs.ma, &coefs.seasonal_ma, period);
        let delta = differencing_polynomial(self.order.d, self.order.cap_d, period);
        let constant = coefs.constant.unwrap_or(0.0);

        let state = &self.state;
        let beta = &coefs.regression;
        let n = state.levels.len();

        // Regression-adjusted levels η_t = y_t - β'x_t.
        let mut eta: Vec<f64> = (0..n)
            .map(|t| state.levels[t] - dot(&state.regressors, t, beta))
            .collect();

        let n_w = state.disturbances.len();
        let mut u = state.disturbances.clone();
        let e = &state.innovations;

        let mut point = Vec::with_capacity(horizon);
        for step in 0..horizon {
            let t = n_w + step;
            let mut u_t = 0.0;
            for (i, b) in ma.iter().enumerate().skip(1) {
                if t >= i && t - i < n_w {
                    u_t += b * e[t - i];
                }
            }
            for (i, a) in ar.iter().enumerate().skip(1) {
                if t >= i {
                    u_t -= a * u[t - i];
                }
            }
            u.push(u_t);

            let level_t = n + step;
            let mut eta_t = constant + u_t;
            for (j, dj) in delta.iter().enumerate().skip(1) {
                eta_t -= dj * eta[level_t - j];
            }
            eta.push(eta_t);

            point.push(eta_t + dot(&future_columns, step, beta));
        }

        let psi = psi_weights(&multiply(&ar, &delta), &ma, horizon);
        let mut acc = 0.0;
        let std_errors = psi
            .iter()
            .map(|w| {
                acc += w * w;
                (self.sigma2 * acc).sqrt()
            })
            .collect();

        ForecastResult::from_normal(state.end, point, std_errors, levels)
    }

    fn check_future(
        &self,
        horizon: usize,
        future: Option<&RegressorMatrix>,
    ) -> Result<Vec<Vec<f64>>> {
        match (self.has_regressors(), future) {
            (false, None) => Ok(Vec::new()),
            (false, Some(_)) => Err(ForecastError::InvalidParameter(
                "model was fitted without regressors".into(),
            )),
            (true, None) => Err(ForecastError::InvalidParameter(format!(
                "future values required for regressors {:?}",
                self.regressor_names
            ))),
            (true, Some(x)) => {
                if x.ncols() != self.regressor_names.len() {
                    return Err(ForecastError::DimensionMismatch {
                        expected: self.regressor_names.len(),
                        got: x.ncols(),
                    });
                }
                x.ensure_rows(horizon)?;
                Ok(x.columns().to_vec())
            }
        }
    }
}

fn dot(columns: &[Vec<f64>], row: usize, beta: &[f64]) -> f64 {
    columns
        .iter()
        .zip(beta)
        .map(|(col, b)| col[row] * b)
        .sum()
}
