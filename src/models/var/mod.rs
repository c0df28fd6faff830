//! Vector autoregression.
//!
//! [`VarEngine`] picks the lag order on a common sample, fits every
//! equation by OLS and checks stability through the companion matrix.
//! The resulting [`VarModel`] forecasts with MA(∞)-based standard errors
//! and runs pairwise Granger causality tests.

mod config;
mod engine;
mod granger;
mod model;

pub use config::{Deterministic, VarConfig, VarCriterion};
pub use engine::VarEngine;
pub use granger::{GrangerConclusion, GrangerResult, DEFAULT_SIGNIFICANCE};
pub use model::{LagOrderSelection, VarCriteria, VarForecast, VarForecastOptions, VarModel};
