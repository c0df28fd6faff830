//! Stationarity analysis and residual diagnostics.
//!
//! # Example
//!
//! ```
//! use sarima_select::validation::{durbin_watson, ljung_box, StationarityAnalyzer};
//! use sarima_select::core::Series;
//!
//! let residuals = vec![0.1, -0.2, 0.15, -0.1, 0.05, -0.08, 0.12, -0.15, 0.1, -0.05];
//! let lb = ljung_box(&residuals, Some(5), 0);
//! assert!(lb.p_value >= 0.0 && lb.p_value <= 1.0);
//! let dw = durbin_watson(&residuals);
//! assert!(dw.statistic > 2.0);
//!
//! let values: Vec<f64> = (0..40).map(|i| i as f64 + ((i * 7) % 5) as f64).collect();
//! let outcome = StationarityAnalyzer::default()
//!     .analyze(&Series::new(values, 1).unwrap())
//!     .unwrap();
//! println!("d = {}, D = {}", outcome.d, outcome.seasonal_d);
//! assert!(outcome.d <= 2);
//! ```

pub mod diagnostics;
pub mod residual_tests;
pub mod stationarity;

pub use diagnostics::{DiagnosticReport, DiagnosticsConfig, DiagnosticsEngine};
pub use residual_tests::{
    box_pierce, durbin_watson, jarque_bera, ljung_box, qq_correlation, AutocorrelationType,
    DurbinWatsonResult, JarqueBeraResult, LjungBoxResult,
};
pub use stationarity::{
    adf_test, kpss_test, CriticalValues, DifferencingConfig, DifferencingOutcome,
    DifferencingStep, LagSelection, StationarityAnalyzer, StationarityResult, UnitRootTest,
};
