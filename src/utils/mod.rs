//! Numerical and statistical helpers shared by the models.

pub mod metrics;
pub mod ols;
pub mod optimization;
pub mod stats;

pub use metrics::{calculate_metrics, mae, mape, AccuracyMetrics};
pub use ols::{ols_fit, ols_multi, OlsFit};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use stats::quantile_normal;
