//! VAR configuration.

use serde::{Deserialize, Serialize};

/// Lag-order selection criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VarCriterion {
    #[default]
    Aic,
    Bic,
    /// Hannan–Quinn.
    Hqic,
    /// Final prediction error.
    Fpe,
}

/// Deterministic terms in every equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Deterministic {
    None,
    #[default]
    Constant,
    Trend,
    ConstantTrend,
}

impl Deterministic {
    /// Number of deterministic regressors.
    pub fn count(&self) -> usize {
        match self {
            Deterministic::None => 0,
            Deterministic::Constant | Deterministic::Trend => 1,
            Deterministic::ConstantTrend => 2,
        }
    }

    /// Regressor values at 0-based observation `t`; the trend counts from 1.
    pub(crate) fn row(&self, t: usize) -> Vec<f64> {
        let trend = t as f64 + 1.0;
        match self {
            Deterministic::None => vec![],
            Deterministic::Constant => vec![1.0],
            Deterministic::Trend => vec![trend],
            Deterministic::ConstantTrend => vec![1.0, trend],
        }
    }
}

/// Configuration for [`VarEngine`](super::VarEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarConfig {
    /// Largest lag order considered.
    pub max_lag: usize,
    /// Criterion used to pick the lag order.
    pub criterion: VarCriterion,
    /// Deterministic terms.
    pub deterministic: Deterministic,
    /// Skip selection and use this lag order.
    pub fixed_lag: Option<usize>,
}

impl Default for VarConfig {
    fn default() -> Self {
        Self {
            max_lag: 8,
            criterion: VarCriterion::Aic,
            deterministic: Deterministic::Constant,
            fixed_lag: None,
        }
    }
}

impl VarConfig {
    pub fn with_max_lag(mut self, max_lag: usize) -> Self {
        self.max_lag = max_lag;
        self
    }

    pub fn with_criterion(mut self, criterion: VarCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    pub fn with_deterministic(mut self, deterministic: Deterministic) -> Self {
        self.deterministic = deterministic;
        self
    }

    /// Fit exactly `lag` lags.
    pub fn with_fixed_lag(mut self, lag: usize) -> Self {
        self.fixed_lag = Some(lag);
        self
    }
}
