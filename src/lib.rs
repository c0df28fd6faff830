//! # sarima-select
//!
//! Automatic seasonal ARIMA order selection with regression terms, vector
//! autoregression and out-of-sample comparison between model families.
//!
//! The pipeline runs differencing selection, order search, candidate
//! fitting, information-criterion ranking, residual diagnostics, holdout
//! evaluation and family comparison. Every stage takes values and returns
//! new ones, so candidate fits and family pipelines run in parallel.
//!
//! ```
//! use sarima_select::prelude::*;
//!
//! let values: Vec<f64> = (0..96)
//!     .map(|i| 50.0 + 0.8 * i as f64 + 4.0 * (i as f64 * std::f64::consts::PI / 6.0).sin()
//!         + ((i * 37 % 17) as f64 - 8.0) * 0.15)
//!     .collect();
//! let series = Series::new(values, 12).unwrap();
//!
//! let input = ComparisonInput::new(&series, 12);
//! let comparison = ModelComparator::default()
//!     .compare(&input, &[Family::Sarima, Family::Benchmark(Benchmark::Naive)])
//!     .unwrap();
//! println!("winner: {}", comparison.best().family);
//! ```

#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod error;
pub mod evaluation;
pub mod models;
pub mod utils;
pub mod validation;

pub use error::{ForecastError, Result, Warning};

pub mod prelude {
    pub use crate::core::{ForecastResult, RegressorMatrix, Series, DEFAULT_LEVELS};
    pub use crate::error::{ForecastError, Result, Warning};
    pub use crate::evaluation::{
        Benchmark, ComparisonInput, ComparatorConfig, EvaluatedModel, Family, ForecastEvaluator,
        ModelComparator,
    };
    pub use crate::models::arima::{
        AutoArima, AutoArimaConfig, CssFitter, Criterion, FittedModel, OrderSpec,
    };
    pub use crate::models::var::{VarConfig, VarEngine, VarModel};
    pub use crate::models::ModelFitter;
    pub use crate::utils::{calculate_metrics, AccuracyMetrics};
    pub use crate::validation::{DiagnosticsEngine, StationarityAnalyzer};
}
