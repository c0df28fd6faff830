//! Unit-root testing and the choice of differencing orders.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::Series;
use crate::error::{Result, Warning};
use crate::utils::ols::ols_fit;
use crate::utils::stats::{normal_cdf, variance};

/// Result of a stationarity test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationarityResult {
    /// Test statistic
    pub statistic: f64,
    /// P-value (approximate)
    pub p_value: f64,
    /// Number of lags used
    pub lags: usize,
    /// Whether the series looks stationary at the 5% level
    pub is_stationary: bool,
    /// Critical values at common significance levels
    pub critical_values: CriticalValues,
}

impl StationarityResult {
    fn undefined(lags: usize) -> Self {
        Self {
            statistic: f64::NAN,
            p_value: f64::NAN,
            lags,
            is_stationary: false,
            critical_values: CriticalValues::default(),
        }
    }
}

/// Critical values for stationarity tests.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CriticalValues {
    /// Critical value at 1% significance
    pub cv_1pct: f64,
    /// Critical value at 5% significance
    pub cv_5pct: f64,
    /// Critical value at 10% significance
    pub cv_10pct: f64,
}

/// How many lagged differences augment the Dickey–Fuller regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LagSelection {
    /// Exactly this many lags.
    Fixed(usize),
    /// Minimise AIC over `0..=max` lags; `None` uses `floor((n - 1)^(1/3))`.
    Aic { max: Option<usize> },
}

impl Default for LagSelection {
    fn default() -> Self {
        LagSelection::Aic { max: None }
    }
}

/// Augmented Dickey–Fuller test with a constant.
///
/// Null hypothesis: unit root (non-stationary). Fits
/// `Δy_t = α + γ y_{t-1} + Σ δ_i Δy_{t-i} + e_t` and reports the t-ratio of
/// `γ` with MacKinnon's approximate p-value.
pub fn adf_test(series: &[f64], lags: LagSelection) -> StationarityResult {
    let n = series.len();
    if n < 6 {
        return StationarityResult::undefined(0);
    }

    let default_max = ((n - 1) as f64).powf(1.0 / 3.0).floor() as usize;
    // Leave enough rows for the regression at the largest lag.
    let cap = (n - 1).saturating_sub(4) / 2;
    let lag = match lags {
        LagSelection::Fixed(k) => k.min(cap),
        LagSelection::Aic { max } => select_lag_aic(series, max.unwrap_or(default_max).min(cap)),
    };

    let Some((gamma, se)) = adf_regression(series, lag, lag) else {
        return StationarityResult::undefined(lag);
    };
    if !(se > 0.0) {
        return StationarityResult::undefined(lag);
    }
    let t_stat = gamma / se;

    let critical_values = CriticalValues {
        cv_1pct: -3.43,
        cv_5pct: -2.86,
        cv_10pct: -2.57,
    };

    StationarityResult {
        statistic: t_stat,
        p_value: mackinnon_p_value(t_stat),
        lags: lag,
        is_stationary: t_stat < critical_values.cv_5pct,
        critical_values,
    }
}

/// Columns `[1, y_{t-1}, Δy_{t-1}..Δy_{t-lag}]` and response `Δy_t` for
/// rows `start..` of the differenced series.
fn adf_design(series: &[f64], lag: usize, start: usize) -> Option<(Vec<Vec<f64>>, Vec<f64>)> {
    let diff: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
    if start < lag || diff.len() <= start + lag + 2 {
        return None;
    }
    let rows = start..diff.len();
    let y: Vec<f64> = rows.clone().map(|t| diff[t]).collect();
    let mut columns = vec![
        vec![1.0; y.len()],
        rows.clone().map(|t| series[t]).collect::<Vec<f64>>(),
    ];
    for i in 1..=lag {
        columns.push(rows.clone().map(|t| diff[t - i]).collect());
    }
    Some((columns, y))
}

fn adf_regression(series: &[f64], lag: usize, start: usize) -> Option<(f64, f64)> {
    let (columns, y) = adf_design(series, lag, start)?;
    let fit = ols_fit(&columns, &y).ok()?;
    Some((fit.coefficients[1], fit.std_error(1)))
}

/// AIC lag choice with every candidate fitted on the sample of the largest lag.
fn select_lag_aic(series: &[f64], max_lag: usize) -> usize {
    let mut best = (0, f64::INFINITY);
    for lag in 0..=max_lag {
        let Some((columns, y)) = adf_design(series, lag, max_lag) else {
            continue;
        };
        let k = columns.len();
        let Ok(fit) = ols_fit(&columns, &y) else {
            continue;
        };
        let n = y.len() as f64;
        if fit.rss <= 0.0 {
            continue;
        }
        let aic = n * (fit.rss / n).ln() + 2.0 * k as f64;
        if aic < best.1 {
            best = (lag, aic);
        }
    }
    best.0
}

/// MacKinnon (1994) approximate p-value for the constant-only case.
fn mackinnon_p_value(t_stat: f64) -> f64 {
    const TAU_MAX: f64 = 2.74;
    const TAU_MIN: f64 = -18.83;
    const TAU_STAR: f64 = -1.61;
    const SMALL_P: [f64; 3] = [2.1659, 1.4412, 0.038269];
    const LARGE_P: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

    if t_stat.is_nan() {
        return f64::NAN;
    }
    if t_stat > TAU_MAX {
        return 1.0;
    }
    if t_stat < TAU_MIN {
        return 0.0;
    }
    let coefs: &[f64] = if t_stat <= TAU_STAR {
        &SMALL_P
    } else {
        &LARGE_P
    };
    let z = coefs.iter().rev().fold(0.0, |acc, c| acc * t_stat + c);
    normal_cdf(z)
}

/// KPSS test for level stationarity.
///
/// Null hypothesis: the series is stationary. Rejection implies
/// non-stationarity, so small p-values point the opposite way to ADF.
///
/// # Arguments
/// * `series` - Time series data
/// * `lags` - Bartlett window for the long-run variance (default `4 (n/100)^{1/4}`)
pub fn kpss_test(series: &[f64], lags: Option<usize>) -> StationarityResult {
    let n = series.len();
    if n < 4 {
        return StationarityResult::undefined(0);
    }

    let lags = lags
        .unwrap_or_else(|| (4.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize)
        .clamp(1, n / 2);

    let mean = series.iter().sum::<f64>() / n as f64;
    let residuals: Vec<f64> = series.iter().map(|&x| x - mean).collect();

    let numerator: f64 = residuals
        .iter()
        .scan(0.0, |acc, r| {
            *acc += r;
            Some(*acc * *acc)
        })
        .sum::<f64>()
        / (n * n) as f64;

    // Bartlett-weighted long-run variance.
    let mut long_run = residuals.iter().map(|&r| r * r).sum::<f64>() / n as f64;
    for j in 1..=lags {
        let weight = 1.0 - j as f64 / (lags + 1) as f64;
        let autocov: f64 = residuals
            .iter()
            .skip(j)
            .zip(residuals.iter())
            .map(|(&a, &b)| a * b)
            .sum::<f64>()
            / n as f64;
        long_run += 2.0 * weight * autocov;
    }

    if long_run <= 0.0 {
        return StationarityResult {
            is_stationary: true,
            ..StationarityResult::undefined(lags)
        };
    }

    let stat = numerator / long_run;
    let critical_values = CriticalValues {
        cv_1pct: 0.739,
        cv_5pct: 0.463,
        cv_10pct: 0.347,
    };

    StationarityResult {
        statistic: stat,
        p_value: kpss_p_value(stat),
        lags,
        is_stationary: stat < critical_values.cv_5pct,
        critical_values,
    }
}

/// Linear interpolation in the Kwiatkowski et al. level-stationarity table,
/// truncated to [0.01, 0.10] outside it.
fn kpss_p_value(stat: f64) -> f64 {
    const TABLE: [(f64, f64); 4] = [(0.347, 0.10), (0.463, 0.05), (0.574, 0.025), (0.739, 0.01)];
    if stat.is_nan() {
        return f64::NAN;
    }
    if stat <= TABLE[0].0 {
        return TABLE[0].1;
    }
    for pair in TABLE.windows(2) {
        let (x0, p0) = pair[0];
        let (x1, p1) = pair[1];
        if stat <= x1 {
            return p0 + (p1 - p0) * (stat - x0) / (x1 - x0);
        }
    }
    TABLE[3].1
}

/// Which unit-root test drives differencing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnitRootTest {
    /// Augmented Dickey–Fuller: difference while the p-value exceeds the threshold.
    #[default]
    Adf,
    /// KPSS: difference while the p-value falls below the threshold.
    Kpss,
}

/// Bounds and test settings for the differencing search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferencingConfig {
    /// Maximum ordinary differencing order.
    pub max_d: usize,
    /// Maximum seasonal differencing order.
    pub max_seasonal_d: usize,
    /// Unit-root test to apply.
    pub test: UnitRootTest,
    /// Augmentation lags for ADF.
    pub lags: LagSelection,
    /// Significance threshold.
    pub threshold: f64,
}

impl Default for DifferencingConfig {
    fn default() -> Self {
        Self {
            max_d: 2,
            max_seasonal_d: 2,
            test: UnitRootTest::Adf,
            lags: LagSelection::default(),
            threshold: 0.05,
        }
    }
}

impl DifferencingConfig {
    /// Set the differencing bounds.
    pub fn with_max_orders(mut self, max_d: usize, max_seasonal_d: usize) -> Self {
        self.max_d = max_d;
        self.max_seasonal_d = max_seasonal_d;
        self
    }

    /// Choose the unit-root test.
    pub fn with_test(mut self, test: UnitRootTest) -> Self {
        self.test = test;
        self
    }

    /// Set the ADF augmentation lags.
    pub fn with_lags(mut self, lags: LagSelection) -> Self {
        self.lags = lags;
        self
    }

    /// Set the significance threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }
}

/// One unit-root test in the differencing loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifferencingStep {
    pub d: usize,
    pub seasonal_d: usize,
    pub statistic: f64,
    pub p_value: f64,
    pub stationary: bool,
}

/// Chosen differencing orders and the differenced series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifferencingOutcome {
    /// Ordinary differencing order.
    pub d: usize,
    /// Seasonal differencing order.
    pub seasonal_d: usize,
    /// Input after `d` ordinary and `seasonal_d` seasonal differences.
    pub series: Series,
    /// Every test performed, in order.
    pub history: Vec<DifferencingStep>,
    /// Set when the bounds were reached without passing the test.
    pub warning: Option<Warning>,
}

/// Repeated unit-root testing to find the smallest `(d, D)`.
///
/// While the test says non-stationary, difference ordinarily until `max_d`,
/// then seasonally (lag `s`) until `max_seasonal_d` when the series is
/// seasonal. A series that passes as given returns `(0, 0)` untouched.
#[derive(Debug, Clone, Default)]
pub struct StationarityAnalyzer {
    config: DifferencingConfig,
}

impl StationarityAnalyzer {
    pub fn new(config: DifferencingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DifferencingConfig {
        &self.config
    }

    /// Apply the configured test to one series.
    pub fn test(&self, values: &[f64]) -> StationarityResult {
        match self.config.test {
            UnitRootTest::Adf => adf_test(values, self.config.lags),
            UnitRootTest::Kpss => kpss_test(values, None),
        }
    }

    fn record(&self, values: &[f64], d: usize, seasonal_d: usize) -> DifferencingStep {
        // A flat series has no unit root to remove.
        if variance(values) == 0.0 {
            return DifferencingStep {
                d,
                seasonal_d,
                statistic: f64::NAN,
                p_value: match self.config.test {
                    UnitRootTest::Adf => 0.0,
                    UnitRootTest::Kpss => 1.0,
                },
                stationary: true,
            };
        }
        let result = self.test(values);
        let stationary = match self.config.test {
            UnitRootTest::Adf => result.p_value <= self.config.threshold,
            UnitRootTest::Kpss => result.p_value >= self.config.threshold,
        };
        DifferencingStep {
            d,
            seasonal_d,
            statistic: result.statistic,
            p_value: result.p_value,
            stationary,
        }
    }

    /// Determine `(d, D)` for `series`.
    ///
    /// # Errors
    /// Propagates `InsufficientData` if a difference would empty the series.
    pub fn analyze(&self, series: &Series) -> Result<DifferencingOutcome> {
        let cfg = &self.config;
        let mut current = series.clone();
        let (mut d, mut seasonal_d) = (0, 0);
        let mut history = vec![self.record(current.values(), d, seasonal_d)];

        loop {
            let Some(last) = history.last() else { break };
            if last.stationary || last.p_value.is_nan() {
                break;
            }
            if d < cfg.max_d {
                current = current.difference(1)?;
                d += 1;
            } else if series.is_seasonal() && seasonal_d < cfg.max_seasonal_d {
                current = current.seasonal_difference(1)?;
                seasonal_d += 1;
            } else {
                break;
            }
            let step = self.record(current.values(), d, seasonal_d);
            debug!(d, seasonal_d, p_value = step.p_value, "unit-root test");
            history.push(step);
        }

        let warning = history
            .last()
            .filter(|step| !step.stationary)
            .map(|step| Warning::NonStationaryInput {
                d,
                seasonal_d,
                p_value: step.p_value,
            });
        if let Some(w) = &warning {
            warn!(%w, "differencing bounds reached");
        }
        info!(d, seasonal_d, tests = history.len(), "differencing order chosen");

        Ok(DifferencingOutcome {
            d,
            seasonal_d,
            series: current,
            history,
            warning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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

    /// Walk with drift; constant-only ADF has almost no power against it.
    fn drifting_walk(n: usize) -> Vec<f64> {
        noise(n, 11)
            .iter()
            .scan(0.0, |acc, e| {
                *acc += 1.0 + e;
                Some(*acc)
            })
            .collect()
    }

    #[test]
    fn mackinnon_reference_points() {
        // Asymptotic 5% and 1% critical values of the constant-only case
        assert_relative_eq!(mackinnon_p_value(-2.86), 0.05, epsilon = 0.005);
        assert_relative_eq!(mackinnon_p_value(-3.43), 0.01, epsilon = 0.003);
        assert_eq!(mackinnon_p_value(3.0), 1.0);
        assert_eq!(mackinnon_p_value(-20.0), 0.0);
        assert!(mackinnon_p_value(-1.0) > 0.5);
    }

    #[test]
    fn mackinnon_is_monotone() {
        let mut previous = 0.0;
        for i in 0..200 {
            let t = -6.0 + i as f64 * 0.04;
            let p = mackinnon_p_value(t);
            assert!(p >= previous - 1e-12, "p-value decreased at t = {}", t);
            previous = p;
        }
    }

    #[test]
    fn adf_stationary_series() {
        let result = adf_test(&noise(200, 3), LagSelection::Fixed(2));
        assert!(result.statistic < -2.86);
        assert!(result.p_value < 0.05);
        assert!(result.is_stationary);
        assert_eq!(result.lags, 2);
    }

    #[test]
    fn adf_drifting_walk_not_stationary() {
        let result = adf_test(&drifting_walk(200), LagSelection::default());
        assert!(result.p_value > 0.05);
        assert!(!result.is_stationary);
    }

    #[test]
    fn adf_lag_selection_is_bounded() {
        let result = adf_test(&drifting_walk(100), LagSelection::Aic { max: Some(3) });
        assert!(result.lags <= 3);
    }

    #[test]
    fn adf_short_series() {
        let result = adf_test(&[1.0, 2.0, 3.0], LagSelection::default());
        assert!(result.p_value.is_nan());
    }

    #[test]
    fn kpss_stationary_series() {
        let series: Vec<f64> = (0..200).map(|i| (i as f64 * 0.7).sin()).collect();
        let result = kpss_test(&series, None);
        assert!(result.is_stationary);
        assert!(result.p_value >= 0.05);
    }

    #[test]
    fn kpss_trending_series() {
        let series: Vec<f64> = (0..200).map(|i| i as f64 * 0.5).collect();
        let result = kpss_test(&series, None);
        assert!(!result.is_stationary);
        assert_relative_eq!(result.p_value, 0.01);
    }

    #[test]
    fn analyzer_leaves_stationary_series_alone() {
        let series = Series::new(noise(120, 9), 12).unwrap();
        let outcome = StationarityAnalyzer::default().analyze(&series).unwrap();
        assert_eq!((outcome.d, outcome.seasonal_d), (0, 0));
        assert_eq!(outcome.series, series);
        assert!(outcome.warning.is_none());
        assert_eq!(outcome.history.len(), 1);
    }

    #[test]
    fn analyzer_differences_drifting_walk_once() {
        let series = Series::new(drifting_walk(200), 1).unwrap();
        let outcome = StationarityAnalyzer::default().analyze(&series).unwrap();
        assert_eq!(outcome.d, 1);
        assert_eq!(outcome.seasonal_d, 0);
        assert_eq!(outcome.series.len(), 199);
        assert!(outcome.history[1].p_value <= 0.05);
    }

    #[test]
    fn analyzer_flags_bounds_without_failing() {
        let series = Series::new(drifting_walk(200), 1).unwrap();
        let analyzer = StationarityAnalyzer::new(DifferencingConfig::default().with_max_orders(0, 0));
        let outcome = analyzer.analyze(&series).unwrap();
        assert_eq!(outcome.d, 0);
        assert!(matches!(
            outcome.warning,
            Some(Warning::NonStationaryInput { d: 0, seasonal_d: 0, .. })
        ));
    }

    #[test]
    fn constant_series_counts_as_stationary() {
        let series = Series::new(vec![3.0; 40], 1).unwrap();
        let outcome = StationarityAnalyzer::default().analyze(&series).unwrap();
        assert_eq!(outcome.d, 0);
        assert!(outcome.warning.is_none());
    }

    #[test]
    fn noisy_trend_needs_one_difference() {
        let values: Vec<f64> = noise(60, 21)
            .iter()
            .enumerate()
            .map(|(i, e)| 2.0 * i as f64 + e)
            .collect();
        let outcome = StationarityAnalyzer::default()
            .analyze(&Series::new(values, 1).unwrap())
            .unwrap();
        assert_eq!(outcome.d, 1);
        assert!(outcome.warning.is_none());
    }

    #[test]
    fn undefined_statistic_stops_differencing() {
        // An exact line leaves the regression without residual variance
        let series = Series::new((0..50).map(|i| 2.0 * i as f64).collect(), 1).unwrap();
        let outcome = StationarityAnalyzer::default().analyze(&series).unwrap();
        assert_eq!(outcome.d, 0);
        assert_eq!(outcome.history.len(), 1);
        assert!(outcome.history[0].p_value.is_nan());
    }
}
