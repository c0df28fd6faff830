//! Seasonal ARIMA with optional regression terms and automatic order selection.
//!
//! This module provides:
//! - [`OrderSpec`] for SARIMA(p, d, q)(P, D, Q)\[s\] orders
//! - [`CssFitter`], the conditional-sum-of-squares [`ModelFitter`](crate::models::ModelFitter)
//! - exhaustive and stepwise candidate generation
//! - information-criterion ranking
//! - [`AutoArima`], which chains all of the above

mod auto_arima;
pub mod diff;
mod fitter;
mod model;
mod order;
pub mod polynomial;
mod search;
mod selection;

pub use auto_arima::{AutoArima, AutoArimaConfig, AutoArimaResult, SearchSummary, DEFAULT_MAX_STEPS};
pub use diff::{difference, integrate, seasonal_difference};
pub use fitter::{CssFitter, FitConfig};
pub use model::{Coefficients, FittedModel, InformationCriteria};
pub use order::OrderSpec;
pub use search::{
    CandidateOrderGenerator, ExhaustiveSearch, OrderBounds, SearchMode, SearchState,
    StepwiseSearch,
};
pub use selection::{Criterion, InformationCriterionSelector, Ranking, TIE_TOLERANCE};
