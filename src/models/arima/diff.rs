//! Differencing utilities for ARIMA models.

use super::polynomial::multiply;

/// Apply differencing to a time series.
///
/// # Arguments
/// * `series` - The input series
/// * `d` - Differencing order (number of times to difference)
///
/// # Returns
/// The differenced series (`d` observations shorter).
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Apply seasonal differencing to a time series.
///
/// # Arguments
/// * `series` - The input series
/// * `d` - Seasonal differencing order
/// * `period` - Seasonal period
///
/// # Returns
/// The seasonally differenced series (`d * period` observations shorter).
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    if d == 0 || period == 0 {
        return series.to_vec();
    }

    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= period {
            return Vec::new();
        }
        result = result
            .iter()
            .skip(period)
            .zip(result.iter())
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// Lag coefficients of `(1 - L)^d (1 - L^s)^D`, constant term first.
///
/// With `delta` returned here, the differenced value is
/// `w_t = Σ_j delta[j] * y_{t-j}`.
pub fn differencing_polynomial(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = multiply(&poly, &[1.0, -1.0]);
    }
    if period > 0 {
        let mut seasonal = vec![0.0; period + 1];
        seasonal[0] = 1.0;
        seasonal[period] = -1.0;
        for _ in 0..seasonal_d {
            poly = multiply(&poly, &seasonal);
        }
    }
    poly
}

/// Undo one ordinary difference of a forecast path given the last level.
pub fn integrate(differenced: &[f64], last_level: f64) -> Vec<f64> {
    differenced
        .iter()
        .scan(last_level, |level, &delta| {
            *level += delta;
            Some(*level)
        })
        .collect()
}
