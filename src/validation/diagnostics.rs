//! Advisory residual diagnostics for a fitted model.
//!
//! Nothing here feeds back into model selection.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::arima::FittedModel;
use crate::utils::stats::acf;
use crate::validation::residual_tests::{
    durbin_watson, jarque_bera, ljung_box, qq_correlation, DurbinWatsonResult, JarqueBeraResult,
    LjungBoxResult,
};

/// What the diagnostics engine computes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// Largest residual ACF lag reported.
    pub max_lag: usize,
    /// Ljung–Box lag; `None` uses `min(10, n/5)`, or `min(2s, n/5)` for seasonal models.
    pub lb_lag: Option<usize>,
    /// Degrees of freedom removed from the Ljung–Box reference distribution;
    /// `None` uses the number of ARMA coefficients.
    pub lb_df_adjust: Option<usize>,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            max_lag: 24,
            lb_lag: None,
            lb_df_adjust: None,
        }
    }
}

impl DiagnosticsConfig {
    pub fn with_max_lag(mut self, max_lag: usize) -> Self {
        self.max_lag = max_lag;
        self
    }

    pub fn with_ljung_box(mut self, lag: usize, df_adjust: Option<usize>) -> Self {
        self.lb_lag = Some(lag);
        self.lb_df_adjust = df_adjust;
        self
    }
}

/// Residual diagnostics of one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticReport {
    /// Residual autocorrelations at lags `1..=max_lag`.
    pub acf: Vec<f64>,
    /// Approximate 95% band `1.96 / √n`.
    pub acf_bound: f64,
    /// Lags whose autocorrelation falls outside the band.
    pub flagged_lags: Vec<usize>,
    pub ljung_box: LjungBoxResult,
    pub jarque_bera: JarqueBeraResult,
    /// Correlation of the normal Q–Q plot.
    pub qq_correlation: f64,
    pub durbin_watson: DurbinWatsonResult,
}

impl DiagnosticReport {
    /// Whether Ljung–Box fails to reject white noise at `alpha`.
    pub fn residuals_look_white(&self, alpha: f64) -> bool {
        self.ljung_box.is_white_noise(alpha)
    }
}

/// Runs the residual checks configured in [`DiagnosticsConfig`].
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsEngine {
    config: DiagnosticsConfig,
}

impl DiagnosticsEngine {
    pub fn new(config: DiagnosticsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DiagnosticsConfig {
        &self.config
    }

    /// Diagnose the residuals of a fitted model.
    pub fn run(&self, model: &FittedModel) -> DiagnosticReport {
        let order = model.order();
        let report = self.check(model.residuals(), order.period(), order.arma_order());
        debug!(
            order = %order,
            lb_p = report.ljung_box.p_value,
            flagged = report.flagged_lags.len(),
            "residual diagnostics"
        );
        report
    }

    /// Diagnose a bare residual series from a model with `arma_params`
    /// ARMA coefficients and seasonal period `period`.
    pub fn check(&self, residuals: &[f64], period: usize, arma_params: usize) -> DiagnosticReport {
        let n = residuals.len();
        let acf = acf(residuals, self.config.max_lag);
        let acf_bound = if n > 0 {
            1.96 / (n as f64).sqrt()
        } else {
            f64::NAN
        };
        let flagged_lags = acf
            .iter()
            .enumerate()
            .filter(|(_, r)| r.abs() > acf_bound)
            .map(|(i, _)| i + 1)
            .collect();

        let lb_lag = self.config.lb_lag.unwrap_or_else(|| {
            let base = if period > 1 { 2 * period } else { 10 };
            base.min(n / 5).max(1)
        });
        let df_adjust = self.config.lb_df_adjust.unwrap_or(arma_params);

        DiagnosticReport {
            acf,
            acf_bound,
            flagged_lags,
            ljung_box: ljung_box(residuals, Some(lb_lag), df_adjust),
            jarque_bera: jarque_bera(residuals),
            qq_correlation: qq_correlation(residuals),
            durbin_watson: durbin_watson(residuals),
        }
    }
}
