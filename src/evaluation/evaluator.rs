//! Forecast production and holdout scoring.

use serde::Serialize;
use tracing::{debug, warn};

use crate::core::{ForecastResult, RegressorMatrix, DEFAULT_LEVELS};
use crate::error::{ForecastError, Result, Warning};
use crate::evaluation::baseline::BenchmarkModel;
use crate::models::arima::FittedModel;
use crate::models::var::{VarForecastOptions, VarModel};
use crate::utils::metrics::{calculate_metrics, mae, mape, AccuracyMetrics};

/// A model whose forecasts can be scored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EvaluatedModel {
    Arima(FittedModel),
    /// One variable of a VAR.
    Var {
        model: Box<VarModel>,
        variable: usize,
        options: VarForecastOptions,
    },
    Benchmark(BenchmarkModel),
}

impl EvaluatedModel {
    /// Short human-readable description.
    pub fn label(&self) -> String {
        match self {
            EvaluatedModel::Arima(model) => {
                let order = model.order();
                if model.has_regressors() {
                    format!("{} + {}", order, model.regressor_names().join(", "))
                } else {
                    order.to_string()
                }
            }
            EvaluatedModel::Var {
                model, variable, ..
            } => format!("VAR({}) variable {}", model.lag(), variable),
            EvaluatedModel::Benchmark(model) => model.kind().to_string(),
        }
    }

    /// In-sample fitted values and the observations they track.
    fn in_sample(&self) -> Option<(&[f64], &[f64])> {
        match self {
            EvaluatedModel::Arima(model) => {
                Some((model.training_values(), model.fitted_values()))
            }
            EvaluatedModel::Var {
                model, variable, ..
            } => Some((
                model.training_values(*variable)?,
                model.fitted_values(*variable)?,
            )),
            EvaluatedModel::Benchmark(model) => {
                Some((model.training_values(), model.fitted_values()))
            }
        }
    }
}

/// In-sample accuracy of the one-step fitted values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InSampleAccuracy {
    pub mae: f64,
    /// Percent; `None` when every actual is zero.
    pub mape: Option<f64>,
    /// Observations with a defined fitted value.
    pub observations: usize,
    pub skipped_zeros: usize,
}

/// A scored forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationRecord {
    pub label: String,
    pub model: EvaluatedModel,
    pub forecast: ForecastResult,
    /// Accuracy against the holdout.
    pub accuracy: AccuracyMetrics,
    pub in_sample: Option<InSampleAccuracy>,
    pub warnings: Vec<Warning>,
}

impl EvaluationRecord {
    /// Out-of-sample MAE.
    pub fn mae(&self) -> f64 {
        self.accuracy.mae
    }

    /// Out-of-sample MAPE in percent.
    pub fn mape(&self) -> Option<f64> {
        self.accuracy.mape
    }
}

/// Produces forecasts at fixed interval levels and scores them.
///
/// Works in whatever scale the model was fitted in; apply
/// [`ForecastResult::map_monotonic`] to return to the original scale.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastEvaluator {
    levels: Vec<f64>,
}

impl Default for ForecastEvaluator {
    fn default() -> Self {
        Self {
            levels: DEFAULT_LEVELS.to_vec(),
        }
    }
}

impl ForecastEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use these interval levels instead of 68/95/99%.
    pub fn with_levels(mut self, levels: Vec<f64>) -> Self {
        self.levels = levels;
        self
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    /// Forecast `horizon` steps.
    ///
    /// `future` supplies the regressor rows of an ARIMA model with
    /// regression terms and is ignored by the other kinds.
    pub fn forecast(
        &self,
        model: &EvaluatedModel,
        horizon: usize,
        future: Option<&RegressorMatrix>,
    ) -> Result<ForecastResult> {
        match model {
            EvaluatedModel::Arima(fitted) => fitted.forecast(horizon, future, &self.levels),
            EvaluatedModel::Var {
                model,
                variable,
                options,
            } => model
                .forecast_with(horizon, &self.levels, options)?
                .into_variable(*variable)
                .ok_or_else(|| {
                    ForecastError::InvalidParameter(format!(
                        "VAR has no variable {}",
                        variable
                    ))
                }),
            EvaluatedModel::Benchmark(bench) => bench.forecast(horizon, &self.levels),
        }
    }

    /// Forecast over the holdout and score the result.
    ///
    /// # Errors
    /// `EmptyData` for an empty holdout, `MissingValues` for non-finite
    /// actuals, and any error of the forecast itself.
    pub fn evaluate(
        &self,
        model: EvaluatedModel,
        holdout: &[f64],
        future: Option<&RegressorMatrix>,
    ) -> Result<EvaluationRecord> {
        if holdout.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if holdout.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }
        let forecast = self.forecast(&model, holdout.len(), future)?;
        let accuracy = calculate_metrics(holdout, forecast.point())?;
        let in_sample = model.in_sample().and_then(|(y, f)| in_sample_accuracy(y, f));

        let mut warnings = Vec::new();
        if accuracy.skipped_zeros > 0 {
            let w = Warning::DegenerateMetric {
                skipped: accuracy.skipped_zeros,
            };
            warn!(%w, "holdout contains zero actuals");
            warnings.push(w);
        }

        let label = model.label();
        debug!(model = %label, mae = accuracy.mae, mape = ?accuracy.mape, "forecast scored");
        Ok(EvaluationRecord {
            label,
            model,
            forecast,
            accuracy,
            in_sample,
            warnings,
        })
    }
}

fn in_sample_accuracy(actual: &[f64], fitted: &[f64]) -> Option<InSampleAccuracy> {
    let (y, f): (Vec<f64>, Vec<f64>) = actual
        .iter()
        .zip(fitted)
        .filter(|(_, f)| f.is_finite())
        .map(|(a, f)| (*a, *f))
        .unzip();
    if y.is_empty() {
        return None;
    }
    let (mape, skipped_zeros) = mape(&y, &f);
    Some(InSampleAccuracy {
        mae: mae(&y, &f),
        mape,
        observations: y.len(),
        skipped_zeros,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Series;
    use approx::assert_relative_eq;

    fn naive_record(train: Vec<f64>, holdout: &[f64]) -> EvaluationRecord {
        let series = Series::new(train, 1).unwrap();
        let model = EvaluatedModel::Benchmark(BenchmarkModel::naive(&series).unwrap());
        ForecastEvaluator::new().evaluate(model, holdout, None).unwrap()
    }

    #[test]
    fn mae_matches_definition() {
        let record = naive_record(vec![1.0, 2.0, 5.0], &[4.0, 7.0, 5.0]);
        assert_relative_eq!(record.mae(), (1.0 + 2.0 + 0.0) / 3.0, epsilon = 1e-12);
        assert_relative_eq!(
            record.mape().unwrap(),
            100.0 * (0.25 + 2.0 / 7.0 + 0.0) / 3.0,
            epsilon = 1e-12
        );
        assert!(record.warnings.is_empty());
    }

    #[test]
    fn perfect_forecast_has_zero_error() {
        let record = naive_record(vec![1.0, 3.0, 3.0], &[3.0, 3.0]);
        assert_eq!(record.mae(), 0.0);
        assert_eq!(record.mape(), Some(0.0));
    }

    #[test]
    fn zero_actuals_are_skipped_and_reported() {
        let record = naive_record(vec![1.0, 2.0], &[0.0, 4.0, 0.0]);
        assert_eq!(record.accuracy.skipped_zeros, 2);
        assert_relative_eq!(record.mape().unwrap(), 50.0, epsilon = 1e-12);
        assert_eq!(record.warnings, vec![Warning::DegenerateMetric { skipped: 2 }]);
    }

    #[test]
    fn in_sample_skips_undefined_fitted_values() {
        let record = naive_record(vec![2.0, 4.0, 3.0], &[3.0]);
        let in_sample = record.in_sample.unwrap();
        assert_eq!(in_sample.observations, 2);
        assert_relative_eq!(in_sample.mae, 1.5, epsilon = 1e-12);
    }

    #[test]
    fn interval_levels_follow_configuration() {
        let series = Series::new(vec![1.0, 2.0, 4.0], 1).unwrap();
        let model = EvaluatedModel::Benchmark(BenchmarkModel::naive(&series).unwrap());
        let evaluator = ForecastEvaluator::new().with_levels(vec![0.8]);
        let forecast = evaluator.forecast(&model, 2, None).unwrap();
        assert_eq!(forecast.intervals().len(), 1);
        assert!(forecast.interval(0.8).is_some());
    }

    #[test]
    fn empty_or_non_finite_holdout_rejected() {
        let series = Series::new(vec![1.0, 2.0], 1).unwrap();
        let model = EvaluatedModel::Benchmark(BenchmarkModel::naive(&series).unwrap());
        let evaluator = ForecastEvaluator::new();
        assert!(matches!(
            evaluator.evaluate(model.clone(), &[], None),
            Err(ForecastError::EmptyData)
        ));
        assert!(matches!(
            evaluator.evaluate(model, &[f64::NAN], None),
            Err(ForecastError::MissingValues)
        ));
    }
}
