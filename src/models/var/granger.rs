//! Granger-causality F-test inside a fitted VAR.

use serde::Serialize;
use tracing::debug;

use crate::error::{ForecastError, Result};
use crate::models::var::engine::design;
use crate::models::var::model::VarModel;
use crate::utils::ols::ols_fit;
use crate::utils::stats::f_sf;

/// Default significance level of [`VarModel::granger_causality`].
pub const DEFAULT_SIGNIFICANCE: f64 = 0.05;

/// Outcome of a Granger test at a given significance level.
///
/// `FailsToReject` means the data carry no significant evidence that the
/// cause helps predict the effect. It is not evidence that the two series
/// are unrelated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GrangerConclusion {
    /// The lags of the cause are jointly significant in the effect equation.
    Rejects,
    /// No significant predictive content was found.
    FailsToReject,
}

/// Result of a Granger causality test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrangerResult {
    /// Index of the candidate cause.
    pub cause: usize,
    /// Index of the equation tested.
    pub effect: usize,
    /// F-statistic
    pub f_statistic: f64,
    /// Numerator degrees of freedom (the VAR lag order).
    pub df_num: usize,
    /// Denominator degrees of freedom.
    pub df_den: usize,
    pub p_value: f64,
    /// Significance level the conclusion refers to.
    pub significance: f64,
    pub conclusion: GrangerConclusion,
}

impl VarModel {
    /// Test whether variable `cause` Granger-causes variable `effect` at
    /// the 5% level.
    pub fn granger_causality(&self, cause: usize, effect: usize) -> Result<GrangerResult> {
        self.granger_causality_at(cause, effect, DEFAULT_SIGNIFICANCE)
    }

    /// Granger test at significance `alpha`.
    ///
    /// Restricts all `p` lags of `cause` to zero in the equation of
    /// `effect`, refits that equation by OLS and compares residual sums of
    /// squares with an `F(p, T - kp - d)` test.
    ///
    /// # Errors
    /// `InvalidParameter` for out-of-range or identical indices, or `alpha`
    /// outside (0, 1).
    pub fn granger_causality_at(
        &self,
        cause: usize,
        effect: usize,
        alpha: f64,
    ) -> Result<GrangerResult> {
        let k = self.dimension();
        if cause >= k || effect >= k {
            return Err(ForecastError::InvalidParameter(format!(
                "variable index out of range for a {}-variable VAR",
                k
            )));
        }
        if cause == effect {
            return Err(ForecastError::InvalidParameter(
                "cause and effect must be different variables".into(),
            ));
        }
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "significance must lie in (0, 1), got {}",
                alpha
            )));
        }

        let p = self.lag();
        let nd = self.deterministic().count();
        let (x, y) = design(self.data(), p, p, self.deterministic());

        let rss_full: f64 = self.residuals().column(effect).iter().map(|u| u * u).sum();

        let kept: Vec<Vec<f64>> = (0..x.ncols())
            .filter(|&c| c < nd || (c - nd) % k != cause)
            .map(|c| x.column(c).iter().copied().collect())
            .collect();
        let response: Vec<f64> = y.column(effect).iter().copied().collect();
        let rss_restricted = ols_fit(&kept, &response)?.rss;

        let df_num = p;
        let df_den = self.df_resid();
        let f_statistic = ((rss_restricted - rss_full) / df_num as f64) / (rss_full / df_den as f64);
        let p_value = f_sf(f_statistic, df_num as f64, df_den as f64);
        let conclusion = if p_value < alpha {
            GrangerConclusion::Rejects
        } else {
            GrangerConclusion::FailsToReject
        };
        debug!(cause, effect, f_statistic, p_value, ?conclusion, "Granger test");

        Ok(GrangerResult {
            cause,
            effect,
            f_statistic,
            df_num,
            df_den,
            p_value,
            significance: alpha,
            conclusion,
        })
    }
}
