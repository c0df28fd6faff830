//! Accuracy metrics for forecast evaluation.

use serde::Serialize;

use crate::error::{ForecastError, Result};

/// Accuracy of a forecast against aligned actual values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error in percent, over non-zero actuals.
    /// `None` when every actual is zero.
    pub mape: Option<f64>,
    /// Zero-valued actuals left out of the MAPE average.
    pub skipped_zeros: usize,
}

/// Calculate accuracy metrics between actual and predicted values.
///
/// # Arguments
/// * `actual` - Actual observed values
/// * `predicted` - Predicted/forecast values
///
/// # Returns
/// `AccuracyMetrics` struct with all computed metrics
pub fn calculate_metrics(actual: &[f64], predicted: &[f64]) -> Result<AccuracyMetrics> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(ForecastError::EmptyData);
    }

    if actual.len() != predicted.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }

    let (mape, skipped_zeros) = mape(actual, predicted);

    Ok(AccuracyMetrics {
        mae: mae(actual, predicted),
        rmse: rmse(actual, predicted),
        mape,
        skipped_zeros,
    })
}

/// Calculate MAE between two slices.
pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64
}

/// Calculate MSE between two slices.
pub fn mse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64
}

/// Calculate RMSE between two slices.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    mse(actual, predicted).sqrt()
}

/// MAPE in percent, skipping zero-valued actuals.
///
/// Returns the metric (if at least one actual is non-zero) and the number of
/// points that were skipped.
pub fn mape(actual: &[f64], predicted: &[f64]) -> (Option<f64>, usize) {
    let mut sum = 0.0;
    let mut used = 0usize;
    let mut skipped = 0usize;
    for (a, p) in actual.iter().zip(predicted.iter()) {
        if *a == 0.0 {
            skipped += 1;
            continue;
        }
        sum += ((a - p) / a).abs();
        used += 1;
    }
    if used == 0 {
        (None, skipped)
    } else {
        (Some(100.0 * sum / used as f64), skipped)
    }
}
