//! Automatic seasonal ARIMA order selection.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::{ForecastResult, RegressorMatrix, Series};
use crate::error::{ForecastError, Result, Warning};
use crate::models::arima::fitter::{CssFitter, FitConfig};
use crate::models::arima::model::FittedModel;
use crate::models::arima::order::OrderSpec;
use crate::models::arima::search::{CandidateOrderGenerator, OrderBounds, SearchMode, SearchState};
use crate::models::arima::selection::{Criterion, InformationCriterionSelector, Ranking};
use crate::models::ModelFitter;
use crate::validation::{
    DiagnosticReport, DiagnosticsConfig, DiagnosticsEngine, DifferencingConfig,
    DifferencingOutcome, StationarityAnalyzer,
};

/// Default number of candidates a stepwise search may fit.
pub const DEFAULT_MAX_STEPS: usize = 94;

/// Configuration for [`AutoArima`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoArimaConfig {
    /// Differencing bounds and unit-root test.
    pub differencing: DifferencingConfig,
    /// AR/MA order bounds.
    pub bounds: OrderBounds,
    /// Stepwise (default) or exhaustive search.
    pub mode: SearchMode,
    /// Stepwise candidate budget.
    pub max_steps: usize,
    /// Ranking criterion.
    pub criterion: Criterion,
    /// Per-candidate fit budget and constant terms.
    pub fit: FitConfig,
    /// Residual checks run on the winner.
    pub diagnostics: DiagnosticsConfig,
}

impl Default for AutoArimaConfig {
    fn default() -> Self {
        Self {
            differencing: DifferencingConfig::default(),
            bounds: OrderBounds::default(),
            mode: SearchMode::Stepwise,
            max_steps: DEFAULT_MAX_STEPS,
            criterion: Criterion::Aic,
            fit: FitConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}

impl AutoArimaConfig {
    /// Set maximum non-seasonal orders.
    pub fn with_max_orders(mut self, max_p: usize, max_q: usize) -> Self {
        self.bounds.max_p = max_p;
        self.bounds.max_q = max_q;
        self
    }

    /// Set maximum seasonal orders.
    pub fn with_seasonal_orders(mut self, max_cap_p: usize, max_cap_q: usize) -> Self {
        self.bounds.max_cap_p = max_cap_p;
        self.bounds.max_cap_q = max_cap_q;
        self
    }

    /// Replace all order bounds.
    pub fn with_bounds(mut self, bounds: OrderBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Set maximum ordinary and seasonal differencing.
    pub fn with_max_differencing(mut self, max_d: usize, max_seasonal_d: usize) -> Self {
        self.differencing = self.differencing.with_max_orders(max_d, max_seasonal_d);
        self
    }

    /// Replace the differencing configuration.
    pub fn with_differencing(mut self, differencing: DifferencingConfig) -> Self {
        self.differencing = differencing;
        self
    }

    /// Use exhaustive search instead of stepwise.
    pub fn exhaustive(mut self) -> Self {
        self.mode = SearchMode::Exhaustive;
        self
    }

    /// Set the stepwise candidate budget.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set the ranking criterion.
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the per-candidate fit configuration.
    pub fn with_fit_config(mut self, fit: FitConfig) -> Self {
        self.fit = fit;
        self
    }

    /// Set the diagnostics configuration.
    pub fn with_diagnostics(mut self, diagnostics: DiagnosticsConfig) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}

/// Bookkeeping of one order search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchSummary {
    /// Candidates handed to the fitter.
    pub attempted: usize,
    /// Candidates rejected with a candidate-level failure.
    pub failed: usize,
    /// Final stepwise state; `None` for an exhaustive search.
    pub state: Option<SearchState>,
}

/// Everything an automatic selection produced.
#[derive(Debug, Clone, Serialize)]
pub struct AutoArimaResult {
    /// Chosen differencing orders and the test history.
    pub differencing: DifferencingOutcome,
    /// Successful candidates, best first.
    pub ranking: Ranking,
    /// Residual diagnostics of the best candidate.
    pub diagnostics: DiagnosticReport,
    pub search: SearchSummary,
    /// Non-fatal conditions met along the way.
    pub warnings: Vec<Warning>,
}

impl AutoArimaResult {
    /// The selected model.
    pub fn best(&self) -> &FittedModel {
        self.ranking.best()
    }

    /// Order of the selected model.
    pub fn order(&self) -> &OrderSpec {
        self.best().order()
    }

    /// Forecast with the selected model.
    pub fn forecast(
        &self,
        horizon: usize,
        future: Option<&RegressorMatrix>,
        levels: &[f64],
    ) -> Result<ForecastResult> {
        self.best().forecast(horizon, future, levels)
    }
}

/// Automatic SARIMA(p, d, q)(P, D, Q)\[s\] selection.
///
/// Chooses `(d, D)` by repeated unit-root tests, searches the ARMA orders
/// for those differencing orders, fits each candidate batch in parallel and
/// keeps the candidate with the lowest information criterion.
///
/// # Example
///
/// ```
/// use sarima_select::core::Series;
/// use sarima_select::models::arima::{AutoArima, AutoArimaConfig};
///
/// let values: Vec<f64> = (0..80)
///     .map(|i| 10.0 + 0.5 * i as f64 + 3.0 * (i as f64 * std::f64::consts::PI / 6.0).sin()
///         + ((i * 37 % 11) as f64 - 5.0) * 0.2)
///     .collect();
/// let series = Series::new(values, 12).unwrap();
///
/// let auto = AutoArima::new(AutoArimaConfig::default().with_max_orders(2, 2).with_seasonal_orders(1, 1));
/// let result = auto.fit(&series, None).unwrap();
/// println!("selected {}", result.order());
///
/// let forecast = result.forecast(12, None, &[0.95]).unwrap();
/// assert_eq!(forecast.horizon(), 12);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AutoArima {
    config: AutoArimaConfig,
}

impl AutoArima {
    pub fn new(config: AutoArimaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AutoArimaConfig {
        &self.config
    }

    /// Select a model with the built-in CSS fitter.
    ///
    /// Every candidate is scored on a common conditioning window: the
    /// largest AR lag any candidate can reach, capped at a quarter of the
    /// differenced sample.
    pub fn fit(&self, series: &Series, regressors: Option<&RegressorMatrix>) -> Result<AutoArimaResult> {
        let analyzer = StationarityAnalyzer::new(self.config.differencing.clone());
        let differencing = analyzer.analyze(series)?;
        let s = Self::period(series);
        let window = self
            .config
            .bounds
            .max_ar_degree(s)
            .min(differencing.series.len() / 4);
        let fitter = CssFitter::new(self.config.fit.clone()).with_conditioning(window);
        self.search(&fitter, series, regressors, differencing)
    }

    /// Select a model with a caller-supplied fitter.
    pub fn fit_with<F: ModelFitter>(
        &self,
        fitter: &F,
        series: &Series,
        regressors: Option<&RegressorMatrix>,
    ) -> Result<AutoArimaResult> {
        let analyzer = StationarityAnalyzer::new(self.config.differencing.clone());
        let differencing = analyzer.analyze(series)?;
        self.search(fitter, series, regressors, differencing)
    }

    fn period(series: &Series) -> usize {
        if series.is_seasonal() {
            series.period()
        } else {
            0
        }
    }

    fn search<F: ModelFitter>(
        &self,
        fitter: &F,
        series: &Series,
        regressors: Option<&RegressorMatrix>,
        differencing: DifferencingOutcome,
    ) -> Result<AutoArimaResult> {
        if let Some(x) = regressors {
            x.ensure_rows(series.len())?;
        }
        let cfg = &self.config;
        let (d, cap_d) = (differencing.d, differencing.seasonal_d);
        let s = Self::period(series);
        info!(
            d,
            seasonal_d = cap_d,
            period = s,
            mode = ?cfg.mode,
            fitter = fitter.name(),
            "starting order search"
        );

        let warnings: Vec<Warning> = differencing.warning.iter().cloned().collect();
        let mut generator =
            CandidateOrderGenerator::new(cfg.mode, d, cap_d, s, cfg.bounds, cfg.max_steps);
        let mut candidates: Vec<FittedModel> = Vec::new();
        let (mut attempted, mut failed) = (0, 0);

        while let Some(batch) = generator.next_batch() {
            let outcomes: Vec<(OrderSpec, Result<FittedModel>)> = batch
                .par_iter()
                .map(|order| (*order, fitter.fit(series, order, regressors)))
                .collect();

            let mut scores = Vec::with_capacity(outcomes.len());
            for (order, outcome) in outcomes {
                attempted += 1;
                match outcome {
                    Ok(model) => {
                        let score = model.criterion(cfg.criterion);
                        scores.push((order, score.is_finite().then_some(score)));
                        candidates.push(model);
                    }
                    Err(err) if err.is_candidate_failure() => {
                        debug!(order = %order, error = %err, "candidate rejected");
                        failed += 1;
                        scores.push((order, None));
                    }
                    Err(err) => return Err(err),
                }
            }
            generator.record(&scores);
        }

        let search = SearchSummary {
            attempted,
            failed,
            state: generator.state(),
        };
        let ranking = InformationCriterionSelector::new(cfg.criterion)
            .select(candidates)
            .map_err(|err| match err {
                ForecastError::NoCandidateConverged { .. } => {
                    ForecastError::NoCandidateConverged { attempted }
                }
                other => other,
            })?;

        let best = ranking.best();
        info!(
            order = %best.order(),
            criterion = best.criterion(cfg.criterion),
            attempted,
            failed,
            "model selected"
        );

        let diagnostics = DiagnosticsEngine::new(cfg.diagnostics.clone()).run(best);
        if !diagnostics.residuals_look_white(0.05) {
            debug!(
                p_value = diagnostics.ljung_box.p_value,
                "residuals of selected model show autocorrelation"
            );
        }
        for w in &warnings {
            warn!(%w, "selection completed with warning");
        }

        Ok(AutoArimaResult {
            differencing,
            ranking,
            diagnostics,
            search,
            warnings,
        })
    }
}
