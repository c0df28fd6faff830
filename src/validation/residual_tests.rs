//! Residual diagnostic tests for fitted models.
//!
//! White-noise checks (Ljung–Box, Box–Pierce, Durbin–Watson) and
//! normality checks (Jarque–Bera, normal Q–Q correlation).

use serde::Serialize;

use crate::utils::stats::{acf, chi_squared_sf, mean, quantile_normal, skewness_kurtosis};

/// Portmanteau test result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LjungBoxResult {
    /// Test statistic Q
    pub statistic: f64,
    /// P-value from χ²(df)
    pub p_value: f64,
    /// Number of lags tested
    pub lags: usize,
    /// Degrees of freedom
    pub df: usize,
}

impl LjungBoxResult {
    fn undefined() -> Self {
        Self {
            statistic: f64::NAN,
            p_value: f64::NAN,
            lags: 0,
            df: 0,
        }
    }

    /// Returns true if we fail to reject the null (residuals are white noise).
    pub fn is_white_noise(&self, alpha: f64) -> bool {
        self.p_value > alpha
    }
}

/// Ljung–Box test for autocorrelation in residuals.
///
/// # Arguments
/// * `residuals` - Model residuals
/// * `lags` - Number of lags to include (default: min(10, n/5))
/// * `fitted_params` - Subtracted from the lag count to form the degrees of freedom
pub fn ljung_box(residuals: &[f64], lags: Option<usize>, fitted_params: usize) -> LjungBoxResult {
    portmanteau(residuals, lags, fitted_params, |r, n, k| r * r / (n - k) as f64, |q, n| {
        q * n as f64 * (n + 2) as f64
    })
}

/// Box–Pierce test; the unweighted predecessor of Ljung–Box.
pub fn box_pierce(residuals: &[f64], lags: Option<usize>, fitted_params: usize) -> LjungBoxResult {
    portmanteau(residuals, lags, fitted_params, |r, _, _| r * r, |q, n| q * n as f64)
}

fn portmanteau<T, S>(
    residuals: &[f64],
    lags: Option<usize>,
    fitted_params: usize,
    term: T,
    scale: S,
) -> LjungBoxResult
where
    T: Fn(f64, usize, usize) -> f64,
    S: Fn(f64, usize) -> f64,
{
    let n = residuals.len();
    if n < 3 {
        return LjungBoxResult::undefined();
    }

    let lags = lags.unwrap_or_else(|| 10.min(n / 5).max(1)).min(n - 1);
    let df = lags.saturating_sub(fitted_params).max(1);

    let m = mean(residuals);
    if residuals.iter().all(|&r| r == m) {
        return LjungBoxResult {
            statistic: 0.0,
            p_value: 1.0,
            lags,
            df,
        };
    }

    let q: f64 = acf(residuals, lags)
        .iter()
        .enumerate()
        .map(|(i, &r)| term(r, n, i + 1))
        .sum();
    let statistic = scale(q, n);

    LjungBoxResult {
        statistic,
        p_value: chi_squared_sf(statistic, df),
        lags,
        df,
    }
}

/// Durbin–Watson test result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurbinWatsonResult {
    /// Test statistic (0 to 4)
    pub statistic: f64,
    /// Interpretation
    pub interpretation: AutocorrelationType,
}

/// Type of first-order autocorrelation suggested by Durbin–Watson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AutocorrelationType {
    /// DW below 1
    PositiveStrong,
    /// DW in [1, 1.5)
    PositiveWeak,
    /// DW in [1.5, 2.5]
    None,
    /// DW in (2.5, 3]
    NegativeWeak,
    /// DW above 3
    NegativeStrong,
}

impl AutocorrelationType {
    fn from_statistic(dw: f64) -> Self {
        match dw {
            x if x < 1.0 => AutocorrelationType::PositiveStrong,
            x if x < 1.5 => AutocorrelationType::PositiveWeak,
            x if x <= 2.5 => AutocorrelationType::None,
            x if x <= 3.0 => AutocorrelationType::NegativeWeak,
            _ => AutocorrelationType::NegativeStrong,
        }
    }
}

/// Durbin–Watson statistic `Σ(e_t - e_{t-1})² / Σe_t²`.
pub fn durbin_watson(residuals: &[f64]) -> DurbinWatsonResult {
    if residuals.len() < 2 {
        return DurbinWatsonResult {
            statistic: f64::NAN,
            interpretation: AutocorrelationType::None,
        };
    }

    let sum_sq: f64 = residuals.iter().map(|&r| r * r).sum();
    if sum_sq == 0.0 {
        return DurbinWatsonResult {
            statistic: 2.0,
            interpretation: AutocorrelationType::None,
        };
    }
    let sum_diff_sq: f64 = residuals.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
    let statistic = sum_diff_sq / sum_sq;

    DurbinWatsonResult {
        statistic,
        interpretation: AutocorrelationType::from_statistic(statistic),
    }
}

/// Jarque–Bera normality test result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JarqueBeraResult {
    pub statistic: f64,
    /// P-value from χ²(2)
    pub p_value: f64,
    pub skewness: f64,
    /// Non-excess kurtosis (3 for a normal sample)
    pub kurtosis: f64,
}

/// Jarque–Bera test: `JB = n/6 (S² + (K - 3)²/4)`.
pub fn jarque_bera(residuals: &[f64]) -> JarqueBeraResult {
    let (skewness, kurtosis) = skewness_kurtosis(residuals);
    if skewness.is_nan() {
        return JarqueBeraResult {
            statistic: f64::NAN,
            p_value: f64::NAN,
            skewness,
            kurtosis,
        };
    }
    let n = residuals.len() as f64;
    let statistic = n / 6.0 * (skewness.powi(2) + (kurtosis - 3.0).powi(2) / 4.0);
    JarqueBeraResult {
        statistic,
        p_value: chi_squared_sf(statistic, 2),
        skewness,
        kurtosis,
    }
}

/// Correlation between sorted residuals and normal plotting positions
/// `Φ⁻¹((i - 0.375) / (n + 0.25))`. Values near 1 indicate normality.
pub fn qq_correlation(residuals: &[f64]) -> f64 {
    let n = residuals.len();
    if n < 3 {
        return f64::NAN;
    }
    let mut sorted = residuals.to_vec();
    sorted.sort_by(f64::total_cmp);
    let theoretical: Vec<f64> = (1..=n)
        .map(|i| quantile_normal((i as f64 - 0.375) / (n as f64 + 0.25)))
        .collect();

    let (ms, mt) = (mean(&sorted), mean(&theoretical));
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in sorted.iter().zip(&theoretical) {
        sxy += (x - ms) * (y - mt);
        sxx += (x - ms).powi(2);
        syy += (y - mt).powi(2);
    }
    if sxx == 0.0 {
        return f64::NAN;
    }
    sxy / (sxx * syy).sqrt()
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

    // ==================== ljung_box ====================

    #[test]
    fn ljung_box_white_noise() {
        let result = ljung_box(&noise(300, 1), Some(10), 0);
        assert!(result.statistic >= 0.0);
        assert!(result.p_value > 0.001);
        assert_eq!(result.lags, 10);
    }

    #[test]
    fn ljung_box_autocorrelated() {
        let e = noise(200, 2);
        let mut residuals = vec![0.0; 200];
        for i in 1..200 {
            residuals[i] = 0.9 * residuals[i - 1] + e[i];
        }
        let result = ljung_box(&residuals, Some(10), 0);
        assert!(result.p_value < 0.01);
        assert!(!result.is_white_noise(0.05));
    }

    #[test]
    fn ljung_box_matches_hand_computation() {
        let residuals = noise(50, 3);
        let r = acf(&residuals, 2);
        let expected = 50.0 * 52.0 * (r[0] * r[0] / 49.0 + r[1] * r[1] / 48.0);
        let result = ljung_box(&residuals, Some(2), 0);
        assert_relative_eq!(result.statistic, expected, epsilon = 1e-10);
        assert_relative_eq!(result.p_value, chi_squared_sf(expected, 2), epsilon = 1e-12);
    }

    #[test]
    fn ljung_box_constant() {
        let result = ljung_box(&[1.0; 50], Some(5), 0);
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn ljung_box_short() {
        assert!(ljung_box(&[1.0, 2.0], Some(5), 0).statistic.is_nan());
        assert!(ljung_box(&[], Some(5), 0).statistic.is_nan());
    }

    #[test]
    fn ljung_box_with_fitted_params() {
        let residuals = noise(100, 4);
        let result_0 = ljung_box(&residuals, Some(10), 0);
        let result_2 = ljung_box(&residuals, Some(10), 2);

        assert_eq!(result_0.df, 10);
        assert_eq!(result_2.df, 8);
        assert_relative_eq!(result_0.statistic, result_2.statistic);
        assert!(result_2.p_value < result_0.p_value);
    }

    #[test]
    fn df_never_drops_below_one() {
        let result = ljung_box(&noise(100, 5), Some(3), 10);
        assert_eq!(result.df, 1);
    }

    #[test]
    fn box_pierce_is_smaller_than_ljung_box() {
        let residuals = noise(80, 6);
        let bp = box_pierce(&residuals, Some(8), 0);
        let lb = ljung_box(&residuals, Some(8), 0);
        assert!(bp.statistic < lb.statistic);
    }

    // ==================== durbin_watson ====================

    #[test]
    fn durbin_watson_alternating() {
        let residuals: Vec<f64> = (0..50).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let result = durbin_watson(&residuals);
        assert!(result.statistic > 3.5);
        assert_eq!(result.interpretation, AutocorrelationType::NegativeStrong);
    }

    #[test]
    fn durbin_watson_smooth() {
        let residuals: Vec<f64> = (0..50).map(|i| (i as f64 * 0.05).sin()).collect();
        let result = durbin_watson(&residuals);
        assert!(result.statistic < 0.5);
        assert_eq!(result.interpretation, AutocorrelationType::PositiveStrong);
    }

    #[test]
    fn durbin_watson_zero_residuals() {
        assert_eq!(durbin_watson(&[0.0; 10]).statistic, 2.0);
        assert!(durbin_watson(&[1.0]).statistic.is_nan());
    }

    // ==================== normality ====================

    #[test]
    fn jarque_bera_symmetric_sample() {
        // Symmetric around zero: skewness vanishes
        let residuals: Vec<f64> = (-20..=20).map(|i| i as f64).collect();
        let result = jarque_bera(&residuals);
        assert_relative_eq!(result.skewness, 0.0, epsilon = 1e-12);
        // Uniform kurtosis is 1.8
        assert_relative_eq!(result.kurtosis, 1.8, epsilon = 0.01);
        assert!(result.statistic > 0.0);
    }

    #[test]
    fn jarque_bera_heavy_outlier() {
        let mut residuals = noise(100, 7);
        residuals[50] = 25.0;
        let result = jarque_bera(&residuals);
        assert!(result.p_value < 1e-6);
    }

    #[test]
    fn qq_correlation_of_normal_quantiles_is_one() {
        let n = 60;
        let residuals: Vec<f64> = (1..=n)
            .rev()
            .map(|i| quantile_normal((i as f64 - 0.375) / (n as f64 + 0.25)))
            .collect();
        assert_relative_eq!(qq_correlation(&residuals), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn qq_correlation_drops_with_outlier() {
        let mut residuals = noise(100, 8);
        residuals[10] = 30.0;
        assert!(qq_correlation(&residuals) < 0.8);
        assert!(qq_correlation(&[1.0, 1.0, 1.0]).is_nan());
    }
}
