//! Aligned exogenous regressor columns.

use serde::Serialize;

use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{difference, seasonal_difference};

/// One or more named covariate columns aligned with a target series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressorMatrix {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl RegressorMatrix {
    /// Build from named columns. All columns must share one length.
    pub fn new(names: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self> {
        if columns.is_empty() || columns[0].is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if names.len() != columns.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: columns.len(),
                got: names.len(),
            });
        }
        let rows = columns[0].len();
        for column in &columns {
            if column.len() != rows {
                return Err(ForecastError::DimensionMismatch {
                    expected: rows,
                    got: column.len(),
                });
            }
            if column.iter().any(|v| !v.is_finite()) {
                return Err(ForecastError::MissingValues);
            }
        }
        Ok(Self { names, columns })
    }

    /// A single named column.
    pub fn single(name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        Self::new(vec![name.into()], vec![values])
    }

    /// Number of observations (rows).
    pub fn len(&self) -> usize {
        self.columns[0].len()
    }

    /// Always `false`; construction rejects empty input.
    pub fn is_empty(&self) -> bool {
        self.columns[0].is_empty()
    }

    /// Number of regressors (columns).
    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    /// Column names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Column `j`.
    pub fn column(&self, j: usize) -> &[f64] {
        &self.columns[j]
    }

    /// All columns.
    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    /// Position of a named column.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Linear combination `Σ_j beta_j * x_{row, j}`.
    pub fn dot_row(&self, row: usize, beta: &[f64]) -> f64 {
        self.columns
            .iter()
            .zip(beta)
            .map(|(col, b)| col[row] * b)
            .sum()
    }

    /// Fail unless the matrix has exactly `expected` rows.
    pub fn ensure_rows(&self, expected: usize) -> Result<()> {
        if self.len() != expected {
            return Err(ForecastError::DimensionMismatch {
                expected,
                got: self.len(),
            });
        }
        Ok(())
    }

    /// Keep only the listed columns, in order.
    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        let mut names = Vec::with_capacity(indices.len());
        let mut columns = Vec::with_capacity(indices.len());
        for &j in indices {
            if j >= self.ncols() {
                return Err(ForecastError::InvalidParameter(format!(
                    "regressor column {} out of range ({} columns)",
                    j,
                    self.ncols()
                )));
            }
            names.push(self.names[j].clone());
            columns.push(self.columns[j].clone());
        }
        Self::new(names, columns)
    }

    /// Rows `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> Result<Self> {
        if start >= end || end > self.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "invalid slice [{}, {}) for {} regressor rows",
                start,
                end,
                self.len()
            )));
        }
        Ok(Self {
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| c[start..end].to_vec())
                .collect(),
        })
    }

    /// Split into the first `n` rows and the rest.
    pub fn split_at(&self, n: usize) -> Result<(Self, Self)> {
        Ok((self.slice(0, n)?, self.slice(n, self.len())?))
    }

    /// Difference every column the same way as the target series.
    pub(crate) fn differenced_columns(&self, d: usize, seasonal_d: usize, period: usize) -> Vec<Vec<f64>> {
        self.columns
            .iter()
            .map(|c| difference(&seasonal_difference(c, seasonal_d, period), d))
            .collect()
    }
}
