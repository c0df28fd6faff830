//! Univariate series with a seasonal period and an integer time index.

use serde::Serialize;

use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{difference, seasonal_difference};

/// An immutable, gap-free univariate series.
///
/// The time index is an integer offset: observation `i` sits at
/// `start + i`. Differencing, slicing and mapping all return new values;
/// a `Series` is never modified in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    values: Vec<f64>,
    period: usize,
    start: i64,
}

impl Series {
    /// Create a series starting at index 0.
    ///
    /// `period` is the seasonal period (e.g. 12 for monthly data); use `0`
    /// or `1` for non-seasonal data.
    pub fn new(values: Vec<f64>, period: usize) -> Result<Self> {
        if values.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }
        Ok(Self {
            values,
            period,
            start: 0,
        })
    }

    /// Shift the time index so the first observation sits at `start`.
    pub fn with_start(mut self, start: i64) -> Self {
        self.start = start;
        self
    }

    /// Observations in time order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always `false`; construction rejects empty input.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Seasonal period.
    pub fn period(&self) -> usize {
        self.period
    }

    /// Whether the period describes a seasonal cycle.
    pub fn is_seasonal(&self) -> bool {
        self.period > 1
    }

    /// Time index of the first observation.
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Time index one past the last observation.
    pub fn end(&self) -> i64 {
        self.start + self.values.len() as i64
    }

    /// Time indices of all observations.
    pub fn index(&self) -> impl Iterator<Item = i64> + '_ {
        (0..self.values.len()).map(move |i| self.start + i as i64)
    }

    /// Last observation.
    pub fn last(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    /// Apply `d` ordinary differences.
    pub fn difference(&self, d: usize) -> Result<Series> {
        if d >= self.len() {
            return Err(ForecastError::InsufficientData {
                needed: d + 1,
                got: self.len(),
            });
        }
        Ok(Self {
            values: difference(&self.values, d),
            period: self.period,
            start: self.start + d as i64,
        })
    }

    /// Apply `d` seasonal differences at lag `period`.
    pub fn seasonal_difference(&self, d: usize) -> Result<Series> {
        if d == 0 {
            return Ok(self.clone());
        }
        if !self.is_seasonal() {
            return Err(ForecastError::InvalidParameter(
                "seasonal differencing requires a period > 1".into(),
            ));
        }
        let lag = d * self.period;
        if lag >= self.len() {
            return Err(ForecastError::InsufficientData {
                needed: lag + 1,
                got: self.len(),
            });
        }
        Ok(Self {
            values: seasonal_difference(&self.values, d, self.period),
            period: self.period,
            start: self.start + lag as i64,
        })
    }

    /// Sub-series `[start, end)` by position.
    pub fn slice(&self, start: usize, end: usize) -> Result<Series> {
        if start >= end || end > self.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "invalid slice [{}, {}) for series of length {}",
                start,
                end,
                self.len()
            )));
        }
        Ok(Self {
            values: self.values[start..end].to_vec(),
            period: self.period,
            start: self.start + start as i64,
        })
    }

    /// Split into a training prefix of length `n` and the remaining suffix.
    pub fn split_at(&self, n: usize) -> Result<(Series, Series)> {
        Ok((self.slice(0, n)?, self.slice(n, self.len())?))
    }

    /// Apply an element-wise transform (e.g. `f64::ln`) producing a new series.
    pub fn map<F>(&self, f: F) -> Result<Series>
    where
        F: Fn(f64) -> f64,
    {
        Series::new(self.values.iter().map(|&v| f(v)).collect(), self.period)
            .map(|s| s.with_start(self.start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_non_finite() {
        assert!(matches!(Series::new(vec![], 12), Err(ForecastError::EmptyData)));
        assert!(matches!(
            Series::new(vec![1.0, f64::NAN], 12),
            Err(ForecastError::MissingValues)
        ));
    }

    #[test]
    fn difference_shifts_index() {
        let s = Series::new(vec![1.0, 3.0, 6.0, 10.0], 1).unwrap();
        let d = s.difference(1).unwrap();
        assert_eq!(d.values(), &[2.0, 3.0, 4.0]);
        assert_eq!(d.start(), 1);
        // Original untouched
        assert_eq!(s.values(), &[1.0, 3.0, 6.0, 10.0]);
    }

    #[test]
    fn seasonal_difference_shifts_by_period() {
        let s = Series::new(vec![1.0, 2.0, 3.0, 4.0, 2.0, 3.0, 4.0, 5.0], 4).unwrap();
        let d = s.seasonal_difference(1).unwrap();
        assert_eq!(d.values(), &[1.0, 1.0, 1.0, 1.0]);
        assert_eq!(d.start(), 4);
    }

    #[test]
    fn seasonal_difference_requires_period() {
        let s = Series::new(vec![1.0, 2.0, 3.0], 1).unwrap();
        assert!(s.seasonal_difference(1).is_err());
        assert!(s.seasonal_difference(0).is_ok());
    }

    #[test]
    fn split_keeps_index_contiguous() {
        let s = Series::new((0..10).map(|i| i as f64).collect(), 1)
            .unwrap()
            .with_start(100);
        let (train, test) = s.split_at(7).unwrap();
        assert_eq!(train.len(), 7);
        assert_eq!(test.len(), 3);
        assert_eq!(train.end(), test.start());
        assert_eq!(test.start(), 107);
        assert!(s.split_at(10).is_err());
    }

    #[test]
    fn map_revalidates() {
        let s = Series::new(vec![1.0, 0.0], 1).unwrap();
        assert!(s.map(f64::ln).is_err());
        let logged = Series::new(vec![1.0, std::f64::consts::E], 1)
            .unwrap()
            .map(f64::ln)
            .unwrap();
        assert!((logged.values()[1] - 1.0).abs() < 1e-12);
    }
}
