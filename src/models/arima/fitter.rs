//! Conditional-sum-of-squares estimation of seasonal ARIMA models with
//! optional regression terms.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{RegressorMatrix, Series};
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{difference, seasonal_difference};
use crate::models::arima::model::{
    Coefficients, FittedModel, ForecastState, InformationCriteria,
};
use crate::models::arima::order::OrderSpec;
use crate::models::arima::polynomial::{expand_ar, expand_ma, max_factor_modulus};
use crate::models::ModelFitter;
use crate::utils::ols::ols_fit;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};

/// Objective value returned for parameters outside the stationary and
/// invertible region.
const PENALTY: f64 = 1e10;

/// Inverse roots this close to the unit circle count as lying on it.
const ROOT_TOLERANCE: f64 = 1e-7;

/// Numerical budget and deterministic-term switches for one fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitConfig {
    /// Optimizer iteration cap.
    pub max_iterations: usize,
    /// Relative tolerance on the objective.
    pub tolerance: f64,
    /// Optional wall-clock cap per fit.
    pub time_budget: Option<Duration>,
    /// Estimate a mean when the order has no differencing.
    pub include_mean: bool,
    /// Estimate a drift when the order has exactly one difference.
    pub include_drift: bool,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            tolerance: 1e-8,
            time_budget: None,
            include_mean: true,
            include_drift: true,
        }
    }
}

impl FitConfig {
    /// Set the optimizer iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the relative convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Cap the wall-clock time of each fit.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    /// Toggle the mean and drift terms.
    pub fn with_constant(mut self, include_mean: bool, include_drift: bool) -> Self {
        self.include_mean = include_mean;
        self.include_drift = include_drift;
        self
    }
}

/// Gaussian likelihood maximised through the conditional sum of squares.
///
/// The series and regressors are differenced alike, the differenced target
/// is regressed on the differenced regressors (plus a constant when
/// `d + D <= 1`), and the regression errors follow the multiplicative
/// seasonal ARMA. Innovations before the AR degree are set to zero.
///
/// Candidates compared by an information criterion must share a likelihood
/// window: [`CssFitter::with_conditioning`] fixes the first observation
/// entering the sum so every order in a search is scored on the same sample.
#[derive(Debug, Clone, Default)]
pub struct CssFitter {
    config: FitConfig,
    condition_on: usize,
}

impl CssFitter {
    /// Create a fitter with the given budget.
    pub fn new(config: FitConfig) -> Self {
        Self {
            config,
            condition_on: 0,
        }
    }

    /// Start the likelihood sum no earlier than differenced observation `n`.
    pub fn with_conditioning(mut self, n: usize) -> Self {
        self.condition_on = n;
        self
    }

    /// Fit configuration.
    pub fn config(&self) -> &FitConfig {
        &self.config
    }
}

/// Position of each coefficient block in the parameter vector
/// `[constant?, β, φ, Φ, θ, Θ]`.
#[derive(Debug, Clone, Copy)]
struct Layout {
    constant: bool,
    n_beta: usize,
    p: usize,
    cap_p: usize,
    q: usize,
    cap_q: usize,
    period: usize,
}

struct Split<'a> {
    constant: f64,
    beta: &'a [f64],
    ar: &'a [f64],
    seasonal_ar: &'a [f64],
    ma: &'a [f64],
    seasonal_ma: &'a [f64],
}

impl Layout {
    fn len(&self) -> usize {
        usize::from(self.constant) + self.n_beta + self.p + self.cap_p + self.q + self.cap_q
    }

    fn split<'a>(&self, params: &'a [f64]) -> Split<'a> {
        let (constant, rest) = if self.constant {
            (params[0], &params[1..])
        } else {
            (0.0, params)
        };
        let (beta, rest) = rest.split_at(self.n_beta);
        let (ar, rest) = rest.split_at(self.p);
        let (seasonal_ar, rest) = rest.split_at(self.cap_p);
        let (ma, seasonal_ma) = rest.split_at(self.q);
        Split {
            constant,
            beta,
            ar,
            seasonal_ar,
            ma,
            seasonal_ma,
        }
    }
}

impl Split<'_> {
    fn ar_modulus(&self) -> Option<f64> {
        max_factor_modulus(self.ar, self.seasonal_ar, -1.0)
    }

    fn ma_modulus(&self) -> Option<f64> {
        max_factor_modulus(self.ma, self.seasonal_ma, 1.0)
    }
}

/// Disturbances `u` and innovations `e` of the differenced regression.
fn recursion(
    w: &[f64],
    z: &[Vec<f64>],
    layout: &Layout,
    params: &[f64],
    ncond: usize,
) -> (Vec<f64>, Vec<f64>) {
    let s = layout.split(params);
    let ar = expand_ar(s.ar, s.seasonal_ar, layout.period);
    let ma = expand_ma(s.ma, s.seasonal_ma, layout.period);

    let n = w.len();
    let u: Vec<f64> = (0..n)
        .map(|t| {
            let xb: f64 = z.iter().zip(s.beta).map(|(col, b)| col[t] * b).sum();
            w[t] - s.constant - xb
        })
        .collect();

    let mut e = vec![0.0; n];
    for t in ncond..n {
        // ar[0] == 1, so the sum includes u_t itself.
        let mut value: f64 = ar.iter().enumerate().map(|(i, a)| a * u[t - i]).sum();
        for (i, b) in ma.iter().enumerate().skip(1) {
            if t >= i {
                value -= b * e[t - i];
            }
        }
        e[t] = value;
    }
    (u, e)
}

fn initial_values(w: &[f64], z: &[Vec<f64>], layout: &Layout) -> Vec<f64> {
    let mut design: Vec<Vec<f64>> = Vec::with_capacity(layout.n_beta + 1);
    if layout.constant {
        design.push(vec![1.0; w.len()]);
    }
    design.extend(z.iter().cloned());

    let mut initial = if design.is_empty() {
        Vec::new()
    } else {
        match ols_fit(&design, w) {
            Ok(fit) => fit.coefficients,
            Err(_) => {
                let mut start = vec![0.0; design.len()];
                if layout.constant {
                    start[0] = w.iter().sum::<f64>() / w.len() as f64;
                }
                start
            }
        }
    };

    // Small decaying starts keep the simplex inside the stationary region.
    for block in [layout.p, layout.cap_p, layout.q, layout.cap_q] {
        initial.extend((0..block).map(|i| 0.1 / (i + 1) as f64));
    }
    initial
}

impl ModelFitter for CssFitter {
    fn fit(
        &self,
        series: &Series,
        order: &OrderSpec,
        regressors: Option<&RegressorMatrix>,
    ) -> Result<FittedModel> {
        if order.s <= 1 && (order.cap_p > 0 || order.cap_d > 0 || order.cap_q > 0) {
            return Err(ForecastError::InvalidParameter(format!(
                "{} has seasonal terms but no seasonal period",
                order
            )));
        }
        if let Some(x) = regressors {
            x.ensure_rows(series.len())?;
        }

        let period = order.period();
        let y = series.values();
        let w = difference(&seasonal_difference(y, order.cap_d, period), order.d);
        let z = regressors
            .map(|x| x.differenced_columns(order.d, order.cap_d, period))
            .unwrap_or_default();

        let integration = order.d + if period > 0 { order.cap_d } else { 0 };
        let layout = Layout {
            constant: (integration == 0 && self.config.include_mean)
                || (integration == 1 && self.config.include_drift),
            n_beta: z.len(),
            p: order.p,
            cap_p: order.cap_p,
            q: order.q,
            cap_q: order.cap_q,
            period,
        };

        let ncond = order.ar_degree();
        let start = ncond.max(self.condition_on);
        let n_coef = layout.len();
        // Need n_eff - k - 1 >= 1 with k = n_coef + 1 for a finite AICc.
        let needed = start + n_coef + 3;
        if w.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed: needed + order.diff_loss(),
                got: series.len(),
            });
        }
        let n_eff = w.len() - start;

        let objective = |params: &[f64]| {
            let split = layout.split(params);
            match (split.ar_modulus(), split.ma_modulus()) {
                (Some(a), Some(m)) if a < 1.0 && m < 1.0 => {}
                _ => return PENALTY,
            }
            let (_, e) = recursion(&w, &z, &layout, params, ncond);
            let css: f64 = e[start..].iter().map(|v| v * v).sum();
            if !css.is_finite() || css <= 0.0 {
                return PENALTY;
            }
            let nf = n_eff as f64;
            0.5 * nf * ((2.0 * std::f64::consts::PI * css / nf).ln() + 1.0)
        };

        let nm_config = NelderMeadConfig {
            max_iter: self.config.max_iterations,
            tolerance: self.config.tolerance,
            time_budget: self.config.time_budget,
            ..Default::default()
        };
        let initial = initial_values(&w, &z, &layout);
        let result = nelder_mead(objective, &initial, &nm_config);

        if !result.converged || result.optimal_value >= PENALTY {
            debug!(
                order = %order,
                iterations = result.iterations,
                timed_out = result.timed_out,
                "candidate failed to converge"
            );
            return Err(ForecastError::ConvergenceFailure {
                iterations: result.iterations,
            });
        }

        let params = result.optimal_point;
        let split = layout.split(&params);
        let ar_modulus = split.ar_modulus().unwrap_or(f64::INFINITY);
        if ar_modulus >= 1.0 - ROOT_TOLERANCE {
            return Err(ForecastError::NonStationaryRoots {
                modulus: ar_modulus,
            });
        }
        let ma_modulus = split.ma_modulus().unwrap_or(f64::INFINITY);
        if ma_modulus >= 1.0 - ROOT_TOLERANCE {
            return Err(ForecastError::NonInvertibleMA {
                modulus: ma_modulus,
            });
        }

        let (u, e) = recursion(&w, &z, &layout, &params, ncond);
        let residuals = e[start..].to_vec();
        let css: f64 = residuals.iter().map(|v| v * v).sum();
        let sigma2 = css / n_eff as f64;
        let log_likelihood =
            -0.5 * n_eff as f64 * ((2.0 * std::f64::consts::PI * sigma2).ln() + 1.0);
        let k = n_coef + 1;
        let criteria = InformationCriteria::from_log_likelihood(log_likelihood, k, n_eff);

        let offset = order.diff_loss();
        let mut fitted = vec![f64::NAN; y.len()];
        for (t, e_t) in e.iter().enumerate().skip(start) {
            fitted[t + offset] = y[t + offset] - e_t;
        }

        let coefficients = Coefficients {
            ar: split.ar.to_vec(),
            ma: split.ma.to_vec(),
            seasonal_ar: split.seasonal_ar.to_vec(),
            seasonal_ma: split.seasonal_ma.to_vec(),
            constant: layout.constant.then_some(split.constant),
            regression: split.beta.to_vec(),
        };

        debug!(
            order = %order,
            aic = criteria.aic,
            sigma2,
            iterations = result.iterations,
            "candidate fitted"
        );

        Ok(FittedModel {
            order: *order,
            coefficients,
            sigma2,
            log_likelihood,
            criteria,
            nobs: n_eff,
            residuals,
            fitted,
            regressor_names: regressors
                .map(|x| x.names().to_vec())
                .unwrap_or_default(),
            state: ForecastState {
                levels: y.to_vec(),
                regressors: regressors
                    .map(|x| x.columns().to_vec())
                    .unwrap_or_default(),
                disturbances: u,
                innovations: e,
                end: series.end(),
            },
        })
    }

    fn name(&self) -> &str {
        "CSS"
    }
}
