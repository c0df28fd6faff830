//! Model families: seasonal ARIMA and vector autoregression.

mod traits;

pub mod arima;
pub mod var;

pub use traits::{BoxedFitter, ModelFitter};
