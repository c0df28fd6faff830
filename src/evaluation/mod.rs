//! Holdout evaluation and cross-family comparison.
//!
//! [`ForecastEvaluator`] turns a fitted model into a [`ForecastResult`] and
//! scores it against actual values; [`ModelComparator`] runs whole families
//! on a training prefix and keeps the one with the lowest holdout MAE.
//!
//! [`ForecastResult`]: crate::core::ForecastResult

mod baseline;
mod comparator;
mod evaluator;

pub use baseline::{Benchmark, BenchmarkModel};
pub use comparator::{
    Comparison, ComparisonInput, ComparatorConfig, FamilyOutcome, Family, ModelComparator,
};
pub use evaluator::{EvaluatedModel, EvaluationRecord, ForecastEvaluator, InSampleAccuracy};
