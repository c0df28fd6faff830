//! Out-of-sample comparison across model families.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::{RegressorMatrix, Series, DEFAULT_LEVELS};
use crate::error::{ForecastError, Result};
use crate::evaluation::baseline::{Benchmark, BenchmarkModel};
use crate::evaluation::evaluator::{EvaluatedModel, EvaluationRecord, ForecastEvaluator};
use crate::models::arima::{AutoArima, AutoArimaConfig};
use crate::models::var::{VarConfig, VarEngine, VarForecastOptions};

/// A model family to run through the holdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Family {
    /// Automatic seasonal ARIMA on the target alone.
    Sarima,
    /// Seasonal ARIMA errors around a regression on one regressor column.
    SarimaWithRegressor { column: usize },
    /// VAR of the target (variable 0) and every companion series.
    Var {
        /// Fit on first differences and integrate the forecasts back.
        difference: bool,
        /// Forecast even when the fitted VAR is unstable.
        allow_unstable: bool,
    },
    /// Benchmark forecast.
    Benchmark(Benchmark),
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Family::Sarima => write!(f, "SARIMA"),
            Family::SarimaWithRegressor { column } => write!(f, "SARIMA+x[{}]", column),
            Family::Var { difference, .. } => {
                if *difference {
                    write!(f, "VAR(diff)")
                } else {
                    write!(f, "VAR")
                }
            }
            Family::Benchmark(b) => write!(f, "{}", b),
        }
    }
}

/// Settings shared by every family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparatorConfig {
    pub arima: AutoArimaConfig,
    pub var: VarConfig,
    /// Interval levels of the recorded forecasts.
    pub levels: Vec<f64>,
}

impl Default for ComparatorConfig {
    fn default() -> Self {
        Self {
            arima: AutoArimaConfig::default(),
            var: VarConfig::default(),
            levels: DEFAULT_LEVELS.to_vec(),
        }
    }
}

impl ComparatorConfig {
    pub fn with_arima(mut self, arima: AutoArimaConfig) -> Self {
        self.arima = arima;
        self
    }

    pub fn with_var(mut self, var: VarConfig) -> Self {
        self.var = var;
        self
    }

    pub fn with_levels(mut self, levels: Vec<f64>) -> Self {
        self.levels = levels;
        self
    }
}

/// Data handed to every family.
#[derive(Debug, Clone, Copy)]
pub struct ComparisonInput<'a> {
    /// Full target series, holdout included.
    pub target: &'a Series,
    /// Number of trailing observations held out.
    pub horizon: usize,
    /// Regressors covering the full target, holdout rows included.
    pub regressors: Option<&'a RegressorMatrix>,
    /// Series aligned with the target for the VAR family.
    pub companions: &'a [Series],
}

impl<'a> ComparisonInput<'a> {
    pub fn new(target: &'a Series, horizon: usize) -> Self {
        Self {
            target,
            horizon,
            regressors: None,
            companions: &[],
        }
    }

    pub fn with_regressors(mut self, regressors: &'a RegressorMatrix) -> Self {
        self.regressors = Some(regressors);
        self
    }

    pub fn with_companions(mut self, companions: &'a [Series]) -> Self {
        self.companions = companions;
        self
    }
}

/// Result of one family, failure included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamilyOutcome {
    pub family: Family,
    pub result: std::result::Result<EvaluationRecord, ForecastError>,
}

impl FamilyOutcome {
    /// Holdout MAE, if the family produced a forecast.
    pub fn mae(&self) -> Option<f64> {
        self.result.as_ref().ok().map(EvaluationRecord::mae)
    }
}

/// Every family's outcome and the winner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    /// Outcomes in the order the families were given.
    pub outcomes: Vec<FamilyOutcome>,
    /// Index into `outcomes` of the lowest holdout MAE.
    pub winner: usize,
}

impl Comparison {
    pub fn best(&self) -> &FamilyOutcome {
        &self.outcomes[self.winner]
    }

    /// The winning record.
    pub fn best_record(&self) -> Option<&EvaluationRecord> {
        self.best().result.as_ref().ok()
    }

    pub fn successes(&self) -> impl Iterator<Item = (&Family, &EvaluationRecord)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|r| (&o.family, r)))
    }
}

/// Fits each family on the training prefix, forecasts the holdout and
/// keeps the family with the lowest MAE.
///
/// Families run in parallel and never share state. A family that fails is
/// recorded with its error and left out of the decision.
#[derive(Debug, Clone, Default)]
pub struct ModelComparator {
    config: ComparatorConfig,
}

impl ModelComparator {
    pub fn new(config: ComparatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ComparatorConfig {
        &self.config
    }

    /// Run every family and pick the winner.
    ///
    /// # Errors
    /// `InvalidParameter` for an empty family list or a zero horizon,
    /// `InsufficientData` when the holdout leaves no training data,
    /// `DimensionMismatch` for misaligned regressors or companions, and
    /// `NoCandidateConverged` when every family failed.
    pub fn compare(&self, input: &ComparisonInput<'_>, families: &[Family]) -> Result<Comparison> {
        if families.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "no model family to compare".into(),
            ));
        }
        if input.horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "holdout horizon must be at least 1".into(),
            ));
        }
        let n = input.target.len();
        if input.horizon >= n {
            return Err(ForecastError::InsufficientData {
                needed: input.horizon + 1,
                got: n,
            });
        }
        if let Some(x) = input.regressors {
            x.ensure_rows(n)?;
        }
        if let Some(bad) = input.companions.iter().find(|s| s.len() != n) {
            return Err(ForecastError::DimensionMismatch {
                expected: n,
                got: bad.len(),
            });
        }

        info!(families = families.len(), horizon = input.horizon, "comparing model families");
        let outcomes: Vec<FamilyOutcome> = families
            .par_iter()
            .map(|family| {
                let result = self.run_family(family, input);
                match &result {
                    Ok(record) => debug!(%family, mae = record.mae(), "family evaluated"),
                    Err(err) => warn!(%family, error = %err, "family failed"),
                }
                FamilyOutcome {
                    family: family.clone(),
                    result,
                }
            })
            .collect();

        let winner = outcomes
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.mae().filter(|m| m.is_finite()).map(|m| (i, m)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
            .ok_or(ForecastError::NoCandidateConverged {
                attempted: families.len(),
            })?;
        info!(winner = %outcomes[winner].family, mae = ?outcomes[winner].mae(), "comparison decided");

        Ok(Comparison { outcomes, winner })
    }

    fn run_family(&self, family: &Family, input: &ComparisonInput<'_>) -> Result<EvaluationRecord> {
        let split = input.target.len() - input.horizon;
        let (train, holdout) = input.target.split_at(split)?;
        let evaluator = ForecastEvaluator::new().with_levels(self.config.levels.clone());

        match family {
            Family::Sarima => {
                let result = AutoArima::new(self.config.arima.clone()).fit(&train, None)?;
                let model = EvaluatedModel::Arima(result.best().clone());
                evaluator.evaluate(model, holdout.values(), None)
            }
            Family::SarimaWithRegressor { column } => {
                let x = input.regressors.ok_or_else(|| {
                    ForecastError::InvalidParameter("regressor family needs regressors".into())
                })?;
                let (x_train, x_future) = x.select(&[*column])?.split_at(split)?;
                let result = AutoArima::new(self.config.arima.clone()).fit(&train, Some(&x_train))?;
                let model = EvaluatedModel::Arima(result.best().clone());
                evaluator.evaluate(model, holdout.values(), Some(&x_future))
            }
            Family::Var {
                difference,
                allow_unstable,
            } => {
                if input.companions.is_empty() {
                    return Err(ForecastError::InvalidParameter(
                        "VAR family needs at least one companion series".into(),
                    ));
                }
                let mut levels = vec![train.clone()];
                for companion in input.companions {
                    levels.push(companion.slice(0, split)?);
                }
                let mut options = VarForecastOptions::default();
                if *allow_unstable {
                    options = options.allow_unstable();
                }
                let fitted_on = if *difference {
                    options = options.integrate_from(levels.iter().map(Series::last).collect());
                    levels
                        .iter()
                        .map(|s| s.difference(1))
                        .collect::<Result<Vec<_>>>()?
                } else {
                    levels
                };
                let model = VarEngine::new(self.config.var.clone()).fit(&fitted_on)?;
                let evaluated = EvaluatedModel::Var {
                    model: Box::new(model),
                    variable: 0,
                    options,
                };
                evaluator.evaluate(evaluated, holdout.values(), None)
            }
            Family::Benchmark(kind) => {
                let model = EvaluatedModel::Benchmark(BenchmarkModel::fit(*kind, &train)?);
                evaluator.evaluate(model, holdout.values(), None)
            }
        }
    }
}
