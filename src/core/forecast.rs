//! Forecast result structure for holding point predictions and intervals.

use serde::Serialize;

use crate::error::{ForecastError, Result};
use crate::utils::stats::quantile_normal;

/// Conventional 68% / 95% / 99% coverage levels.
pub const DEFAULT_LEVELS: [f64; 3] = [0.68, 0.95, 0.99];

/// Symmetric prediction interval at one confidence level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionInterval {
    /// Nominal coverage in (0, 1).
    pub level: f64,
    /// Lower bound per horizon step.
    pub lower: Vec<f64>,
    /// Upper bound per horizon step.
    pub upper: Vec<f64>,
}

impl PredictionInterval {
    /// Interval width per horizon step.
    pub fn widths(&self) -> Vec<f64> {
        self.upper
            .iter()
            .zip(&self.lower)
            .map(|(u, l)| u - l)
            .collect()
    }
}

/// Point forecasts for `h >= 1` future periods, with standard errors and
/// prediction intervals ordered by ascending confidence level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    /// Time index of the first forecast step.
    start: i64,
    point: Vec<f64>,
    /// Forecast standard errors on the fitting scale.
    std_errors: Vec<f64>,
    intervals: Vec<PredictionInterval>,
}

impl ForecastResult {
    /// Build Gaussian intervals `point ± z(level) * se` for each level.
    pub fn from_normal(
        start: i64,
        point: Vec<f64>,
        std_errors: Vec<f64>,
        levels: &[f64],
    ) -> Result<Self> {
        if point.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "forecast horizon must be at least 1".into(),
            ));
        }
        if point.len() != std_errors.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: point.len(),
                got: std_errors.len(),
            });
        }
        let levels = validated_levels(levels)?;

        let intervals = levels
            .into_iter()
            .map(|level| {
                let z = quantile_normal(0.5 + level / 2.0);
                PredictionInterval {
                    level,
                    lower: point
                        .iter()
                        .zip(&std_errors)
                        .map(|(p, se)| p - z * se)
                        .collect(),
                    upper: point
                        .iter()
                        .zip(&std_errors)
                        .map(|(p, se)| p + z * se)
                        .collect(),
                }
            })
            .collect();

        Ok(Self {
            start,
            point,
            std_errors,
            intervals,
        })
    }

    /// Forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    /// Time index of the first forecast step.
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Point forecasts.
    pub fn point(&self) -> &[f64] {
        &self.point
    }

    /// Standard errors (always on the scale the model was fitted in).
    pub fn std_errors(&self) -> &[f64] {
        &self.std_errors
    }

    /// All intervals, ascending by level.
    pub fn intervals(&self) -> &[PredictionInterval] {
        &self.intervals
    }

    /// Interval for a specific level, if it was requested.
    pub fn interval(&self, level: f64) -> Option<&PredictionInterval> {
        self.intervals
            .iter()
            .find(|i| (i.level - level).abs() < 1e-9)
    }

    /// Apply a monotonically increasing inverse transform (e.g. `f64::exp`)
    /// to the point forecasts and every interval bound.
    ///
    /// Coverage ordering is preserved because the transform is monotone.
    /// Standard errors are left on the fitting scale.
    pub fn map_monotonic<F>(&self, f: F) -> ForecastResult
    where
        F: Fn(f64) -> f64,
    {
        ForecastResult {
            start: self.start,
            point: self.point.iter().map(|&v| f(v)).collect(),
            std_errors: self.std_errors.clone(),
            intervals: self
                .intervals
                .iter()
                .map(|i| PredictionInterval {
                    level: i.level,
                    lower: i.lower.iter().map(|&v| f(v)).collect(),
                    upper: i.upper.iter().map(|&v| f(v)).collect(),
                })
                .collect(),
        }
    }
}

fn validated_levels(levels: &[f64]) -> Result<Vec<f64>> {
    let mut levels = levels.to_vec();
    if levels.iter().any(|&l| !(l > 0.0 && l < 1.0)) {
        return Err(ForecastError::InvalidParameter(
            "confidence levels must lie strictly between 0 and 1".into(),
        ));
    }
    levels.sort_by(|a, b| a.total_cmp(b));
    levels.dedup();
    Ok(levels)
}
