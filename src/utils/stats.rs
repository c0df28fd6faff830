//! Statistical utility functions.

use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal};

/// Quantile function of the standard normal distribution.
///
/// # Example
/// ```
/// use sarima_select::utils::quantile_normal;
///
/// // 95% two-sided interval -> z ≈ 1.96
/// let z = quantile_normal(0.975);
/// assert!((z - 1.96).abs() < 0.01);
/// ```
pub fn quantile_normal(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.inverse_cdf(p),
        Err(_) => f64::NAN,
    }
}

/// Cumulative distribution function of the standard normal distribution.
pub fn normal_cdf(x: f64) -> f64 {
    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.cdf(x),
        Err(_) => f64::NAN,
    }
}

/// Upper tail probability `P(X > x)` for `X ~ χ²(df)`.
pub fn chi_squared_sf(x: f64, df: usize) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 || df == 0 {
        return 1.0;
    }
    match ChiSquared::new(df as f64) {
        Ok(dist) => dist.sf(x),
        Err(_) => f64::NAN,
    }
}

/// Upper tail probability `P(X > x)` for `X ~ F(df1, df2)`.
pub fn f_sf(x: f64, df1: f64, df2: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 1.0;
    }
    match FisherSnedecor::new(df1, df2) {
        Ok(dist) => dist.sf(x),
        Err(_) => f64::NAN,
    }
}

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Calculate the variance of a slice (sample variance with n-1 denominator).
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    sum_sq / (values.len() - 1) as f64
}

/// Calculate the autocorrelation at a given lag.
pub fn autocorrelation(values: &[f64], lag: usize) -> f64 {
    if values.len() <= lag {
        return f64::NAN;
    }
    let m = mean(values);
    let n = values.len();

    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for i in 0..n {
        denominator += (values[i] - m).powi(2);
        if i >= lag {
            numerator += (values[i] - m) * (values[i - lag] - m);
        }
    }

    if denominator == 0.0 {
        return 0.0;
    }
    numerator / denominator
}

/// Autocorrelations at lags `1..=max_lag` (lags beyond the data are dropped).
pub fn acf(values: &[f64], max_lag: usize) -> Vec<f64> {
    let max_lag = max_lag.min(values.len().saturating_sub(1));
    (1..=max_lag).map(|k| autocorrelation(values, k)).collect()
}

/// Sample skewness and (non-excess) kurtosis using population moments.
pub fn skewness_kurtosis(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n < 3 {
        return (f64::NAN, f64::NAN);
    }
    let m = mean(values);
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for &v in values {
        let c = v - m;
        let c2 = c * c;
        m2 += c2;
        m3 += c2 * c;
        m4 += c2 * c2;
    }
    let nf = n as f64;
    m2 /= nf;
    m3 /= nf;
    m4 /= nf;
    if m2 == 0.0 {
        return (0.0, 3.0);
    }
    (m3 / m2.powf(1.5), m4 / (m2 * m2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn quantile_normal_known_values() {
        assert_relative_eq!(quantile_normal(0.5), 0.0, epsilon = 1e-9);
        assert_relative_eq!(quantile_normal(0.975), 1.959964, epsilon = 1e-5);
        assert_relative_eq!(quantile_normal(0.025), -1.959964, epsilon = 1e-5);
        assert_relative_eq!(quantile_normal(0.995), 2.575829, epsilon = 1e-5);
    }

    #[test]
    fn quantile_normal_boundary_values() {
        assert_eq!(quantile_normal(0.0), f64::NEG_INFINITY);
        assert_eq!(quantile_normal(1.0), f64::INFINITY);
    }

    #[test]
    fn normal_cdf_symmetry() {
        assert_relative_eq!(normal_cdf(0.0), 0.5, epsilon = 1e-12);
        assert_relative_eq!(normal_cdf(1.96) + normal_cdf(-1.96), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn chi_squared_tail() {
        // 95th percentile of chi2(1) is 3.841
        assert_relative_eq!(chi_squared_sf(3.841459, 1), 0.05, epsilon = 1e-5);
        assert_eq!(chi_squared_sf(0.0, 3), 1.0);
    }

    #[test]
    fn f_tail() {
        // 95th percentile of F(2, 30) is 3.316
        assert_relative_eq!(f_sf(3.3158, 2.0, 30.0), 0.05, epsilon = 1e-3);
    }

    #[test]
    fn mean_and_variance() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0, epsilon = 1e-10);
        assert_relative_eq!(variance(&[1.0, 2.0, 3.0, 4.0, 5.0]), 2.5, epsilon = 1e-10);
        assert!(mean(&[]).is_nan());
        assert!(variance(&[1.0]).is_nan());
    }

    #[test]
    fn autocorrelation_lag_0_is_1() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(autocorrelation(&values, 0), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn acf_truncates_to_available_lags() {
        let values: Vec<f64> = (0..5).map(|i| i as f64).collect();
        assert_eq!(acf(&values, 10).len(), 4);
    }

    #[test]
    fn skewness_kurtosis_symmetric() {
        let (skew, kurt) = skewness_kurtosis(&[-2.0, -1.0, 0.0, 1.0, 2.0]);
        assert_relative_eq!(skew, 0.0, epsilon = 1e-12);
        // population kurtosis of a discrete uniform on 5 points
        assert_relative_eq!(kurt, 1.7, epsilon = 1e-12);
    }
}
