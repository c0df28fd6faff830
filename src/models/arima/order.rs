//! Seasonal ARIMA order specification.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Model order `(p, d, q)(P, D, Q)[s]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderSpec {
    /// Non-seasonal AR order.
    pub p: usize,
    /// Non-seasonal differencing order.
    pub d: usize,
    /// Non-seasonal MA order.
    pub q: usize,
    /// Seasonal AR order.
    pub cap_p: usize,
    /// Seasonal differencing order.
    pub cap_d: usize,
    /// Seasonal MA order.
    pub cap_q: usize,
    /// Seasonal period (0 or 1 for non-seasonal).
    pub s: usize,
}

impl OrderSpec {
    /// Non-seasonal ARIMA(p, d, q).
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self {
            p,
            d,
            q,
            cap_p: 0,
            cap_d: 0,
            cap_q: 0,
            s: 0,
        }
    }

    /// Attach a seasonal part `(P, D, Q)[s]`.
    pub fn with_seasonal(mut self, cap_p: usize, cap_d: usize, cap_q: usize, s: usize) -> Self {
        self.cap_p = cap_p;
        self.cap_d = cap_d;
        self.cap_q = cap_q;
        self.s = s;
        self
    }

    /// Check if this is a seasonal model.
    pub fn is_seasonal(&self) -> bool {
        self.s > 1 && (self.cap_p > 0 || self.cap_d > 0 || self.cap_q > 0)
    }

    /// Seasonal period, or 0 when the order has no seasonal part.
    pub fn period(&self) -> usize {
        if self.s > 1 {
            self.s
        } else {
            0
        }
    }

    /// Total ARMA order `p + q + P + Q`, the parsimony measure.
    pub fn arma_order(&self) -> usize {
        self.p + self.q + self.cap_p + self.cap_q
    }

    /// Degree of the expanded AR polynomial `φ(L)Φ(L^s)`.
    pub fn ar_degree(&self) -> usize {
        self.p + self.cap_p * self.period()
    }

    /// Degree of the expanded MA polynomial `θ(L)Θ(L^s)`.
    pub fn ma_degree(&self) -> usize {
        self.q + self.cap_q * self.period()
    }

    /// Observations consumed by differencing.
    pub fn diff_loss(&self) -> usize {
        self.d + self.cap_d * self.period()
    }

    /// Whether the same `(d, D, s)` is used by `other`.
    pub fn same_differencing(&self, other: &OrderSpec) -> bool {
        self.d == other.d && self.cap_d == other.cap_d && self.period() == other.period()
    }
}

impl fmt::Display for OrderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)?;
        if self.s > 1 {
            write!(f, "({},{},{})[{}]", self.cap_p, self.cap_d, self.cap_q, self.s)?;
        }
        Ok(())
    }
}
