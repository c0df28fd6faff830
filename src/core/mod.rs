//! Core data structures: series, regressors and forecast results.

mod forecast;
mod regressors;
mod series;

pub use forecast::{ForecastResult, PredictionInterval, DEFAULT_LEVELS};
pub use regressors::RegressorMatrix;
pub use series::Series;
