//! Ordinary least squares on an explicit design matrix.
//!
//! Shared by the unit-root regressions, the starting values of the
//! regression-with-ARIMA-errors fitter and the equation-wise VAR estimator.

use nalgebra::{Cholesky, DMatrix, DVector, Dyn};

use crate::error::{ForecastError, Result};

/// Least-squares fit of `y = X b + e`.
#[derive(Debug, Clone)]
pub struct OlsFit {
    /// One coefficient per design column.
    pub coefficients: Vec<f64>,
    /// `y - X b`.
    pub residuals: Vec<f64>,
    /// Residual sum of squares.
    pub rss: f64,
    /// `(X'X)^{-1}`, used for coefficient standard errors.
    pub xtx_inv: DMatrix<f64>,
}

impl OlsFit {
    /// Residual degrees of freedom `n - k`.
    pub fn df_resid(&self) -> usize {
        self.residuals.len().saturating_sub(self.coefficients.len())
    }

    /// Unbiased residual variance `rss / (n - k)`.
    pub fn sigma2(&self) -> f64 {
        let df = self.df_resid();
        if df == 0 {
            return f64::NAN;
        }
        self.rss / df as f64
    }

    /// Standard error of coefficient `j`.
    pub fn std_error(&self, j: usize) -> f64 {
        (self.sigma2() * self.xtx_inv[(j, j)]).sqrt()
    }
}

/// Fit OLS with the design given as columns (include a column of ones for an
/// intercept). Solves the normal equations by Cholesky decomposition.
///
/// # Errors
/// `DimensionMismatch` on ragged input, `InsufficientData` when there are no
/// more rows than columns, and `ComputationError` for a singular `X'X`.
pub fn ols_fit(columns: &[Vec<f64>], y: &[f64]) -> Result<OlsFit> {
    let n = y.len();
    let k = columns.len();
    if k == 0 {
        return Err(ForecastError::InvalidParameter(
            "design matrix has no columns".into(),
        ));
    }
    if n <= k {
        return Err(ForecastError::InsufficientData {
            needed: k + 1,
            got: n,
        });
    }
    if let Some(bad) = columns.iter().find(|c| c.len() != n) {
        return Err(ForecastError::DimensionMismatch {
            expected: n,
            got: bad.len(),
        });
    }

    let x = DMatrix::from_fn(n, k, |i, j| columns[j][i]);
    let yv = DVector::from_column_slice(y);

    let xt = x.transpose();
    let xtx = &xt * &x;
    let xty = &xt * &yv;

    let chol = factorize(xtx)?;
    let beta = chol.solve(&xty);
    let xtx_inv = chol.inverse();

    let fitted = &x * &beta;
    let residuals: Vec<f64> = yv.iter().zip(fitted.iter()).map(|(a, f)| a - f).collect();
    let rss = residuals.iter().map(|r| r * r).sum();

    Ok(OlsFit {
        coefficients: beta.iter().copied().collect(),
        residuals,
        rss,
        xtx_inv,
    })
}

/// Equation-wise least squares for a shared design: `Y = X B + U` with one
/// column of `Y` per equation. Returns `(B, U)`.
///
/// # Errors
/// As [`ols_fit`].
pub fn ols_multi(x: &DMatrix<f64>, y: &DMatrix<f64>) -> Result<(DMatrix<f64>, DMatrix<f64>)> {
    let (n, k) = x.shape();
    if k == 0 {
        return Err(ForecastError::InvalidParameter(
            "design matrix has no columns".into(),
        ));
    }
    if y.nrows() != n {
        return Err(ForecastError::DimensionMismatch {
            expected: n,
            got: y.nrows(),
        });
    }
    if n <= k {
        return Err(ForecastError::InsufficientData {
            needed: k + 1,
            got: n,
        });
    }
    let xt = x.transpose();
    let chol = factorize(&xt * x)?;
    let coef = chol.solve(&(&xt * y));
    let residuals = y - x * &coef;
    Ok((coef, residuals))
}

fn factorize(xtx: DMatrix<f64>) -> Result<Cholesky<f64, Dyn>> {
    let scale = xtx.diagonal().iter().fold(0.0f64, |m, v| m.max(v.abs()));
    let chol = xtx
        .cholesky()
        .ok_or_else(|| ForecastError::ComputationError("singular design matrix".into()))?;
    // Exact collinearity can survive the factorisation as a rounding-level pivot.
    if chol
        .l_dirty()
        .diagonal()
        .iter()
        .any(|l| l * l <= 1e-12 * scale)
    {
        return Err(ForecastError::ComputationError(
            "singular design matrix".into(),
        ));
    }
    Ok(chol)
}
