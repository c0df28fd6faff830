//! Fitting interface shared by the order search and its callers.

use crate::core::{RegressorMatrix, Series};
use crate::error::Result;
use crate::models::arima::{FittedModel, OrderSpec};

/// Estimates a seasonal ARIMA of a given order.
///
/// Implementations must be pure: the same series, order and regressors
/// always give the same result, and candidates may be fitted concurrently.
/// A failed fit is a typed error rather than a partially filled model.
///
/// # Example
///
/// ```
/// use sarima_select::core::Series;
/// use sarima_select::models::arima::{CssFitter, OrderSpec};
/// use sarima_select::models::ModelFitter;
///
/// let values: Vec<f64> = (0..60).map(|i| (i as f64 * 0.3).sin() + 0.05 * i as f64).collect();
/// let series = Series::new(values, 1).unwrap();
/// let fitter = CssFitter::default();
/// let model = fitter.fit(&series, &OrderSpec::new(1, 1, 0), None).unwrap();
/// assert_eq!(fitter.name(), "CSS");
/// assert!(model.aic().is_finite());
/// ```
pub trait ModelFitter: Send + Sync {
    /// Fit `order` to `series`, with optional regression terms whose rows
    /// align with the series.
    fn fit(
        &self,
        series: &Series,
        order: &OrderSpec,
        regressors: Option<&RegressorMatrix>,
    ) -> Result<FittedModel>;

    /// Estimator name.
    fn name(&self) -> &str;
}

/// Type alias for shared fitter trait objects.
pub type BoxedFitter = Box<dyn ModelFitter>;
