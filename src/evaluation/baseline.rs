//! Naive benchmark forecasts.
//!
//! The naive method repeats the last observation; the seasonal naive method
//! repeats the observation from the same season of the last cycle. Both are
//! the yardsticks the fitted families have to beat.

use serde::{Deserialize, Serialize};

use crate::core::{ForecastResult, Series};
use crate::error::{ForecastError, Result};

/// Which benchmark to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Benchmark {
    /// `ŷ_{n+h} = y_n`.
    Naive,
    /// `ŷ_{n+h} = y_{n+h-s·k}` with `k = ⌊(h-1)/s⌋ + 1`.
    SeasonalNaive,
}

impl std::fmt::Display for Benchmark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Benchmark::Naive => write!(f, "Naive"),
            Benchmark::SeasonalNaive => write!(f, "SeasonalNaive"),
        }
    }
}

/// A fitted benchmark.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkModel {
    kind: Benchmark,
    lag: usize,
    /// Residual standard deviation of the in-sample lag-`lag` forecasts.
    sigma: f64,
    fitted: Vec<f64>,
    #[serde(skip)]
    history: Vec<f64>,
    end: i64,
}

impl BenchmarkModel {
    /// Fit the naive benchmark.
    ///
    /// # Errors
    /// `InsufficientData` for fewer than two observations.
    pub fn naive(series: &Series) -> Result<Self> {
        Self::with_lag(Benchmark::Naive, series, 1)
    }

    /// Fit the seasonal naive benchmark.
    ///
    /// # Errors
    /// `InvalidParameter` for a non-seasonal series, `InsufficientData` when
    /// the series does not cover more than one full cycle.
    pub fn seasonal_naive(series: &Series) -> Result<Self> {
        if !series.is_seasonal() {
            return Err(ForecastError::InvalidParameter(
                "seasonal naive needs a period > 1".into(),
            ));
        }
        Self::with_lag(Benchmark::SeasonalNaive, series, series.period())
    }

    /// Fit the given benchmark.
    pub fn fit(kind: Benchmark, series: &Series) -> Result<Self> {
        match kind {
            Benchmark::Naive => Self::naive(series),
            Benchmark::SeasonalNaive => Self::seasonal_naive(series),
        }
    }

    fn with_lag(kind: Benchmark, series: &Series, lag: usize) -> Result<Self> {
        let values = series.values();
        if values.len() <= lag {
            return Err(ForecastError::InsufficientData {
                needed: lag + 1,
                got: values.len(),
            });
        }

        let fitted: Vec<f64> = (0..values.len())
            .map(|t| if t < lag { f64::NAN } else { values[t - lag] })
            .collect();
        let sse: f64 = (lag..values.len())
            .map(|t| (values[t] - values[t - lag]).powi(2))
            .sum();
        let sigma = (sse / (values.len() - lag) as f64).sqrt();

        Ok(Self {
            kind,
            lag,
            sigma,
            fitted,
            history: values.to_vec(),
            end: series.end(),
        })
    }

    pub fn kind(&self) -> Benchmark {
        self.kind
    }

    /// In-sample fitted values; the first `lag` entries are `NaN`.
    pub fn fitted_values(&self) -> &[f64] {
        &self.fitted
    }

    pub fn training_values(&self) -> &[f64] {
        &self.history
    }

    /// Forecast `horizon` steps with standard errors `σ·√k`, where `k` is
    /// the number of steps (naive) or cycles (seasonal naive) ahead.
    pub fn forecast(&self, horizon: usize, levels: &[f64]) -> Result<ForecastResult> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "forecast horizon must be at least 1".into(),
            ));
        }
        let n = self.history.len();
        let s = self.lag;
        let mut point = Vec::with_capacity(horizon);
        let mut se = Vec::with_capacity(horizon);
        for h in 1..=horizon {
            let k = (h - 1) / s + 1;
            point.push(self.history[n + h - s * k - 1]);
            se.push(self.sigma * (k as f64).sqrt());
        }
        ForecastResult::from_normal(self.end, point, se, levels)
    }
}
