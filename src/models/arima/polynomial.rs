//! Lag polynomials: expansion of multiplicative seasonal factors, root
//! checks and ψ-weights.
//!
//! A lag polynomial is stored as its coefficients in ascending powers of `L`
//! with the constant term first, so `[1.0, -0.5]` is `1 - 0.5 L`.

use nalgebra::DMatrix;

/// Product of two lag polynomials.
pub fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        if *x == 0.0 {
            continue;
        }
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// `1 + sign * Σ c_i L^{i * step}`.
fn factor(coefs: &[f64], step: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coefs.len() * step + 1];
    poly[0] = 1.0;
    for (i, c) in coefs.iter().enumerate() {
        poly[(i + 1) * step] = sign * c;
    }
    poly
}

/// Expanded AR polynomial `(1 - Σ φ_i L^i)(1 - Σ Φ_i L^{s i})`.
pub fn expand_ar(ar: &[f64], seasonal_ar: &[f64], period: usize) -> Vec<f64> {
    let seasonal = if period > 1 {
        factor(seasonal_ar, period, -1.0)
    } else {
        vec![1.0]
    };
    multiply(&factor(ar, 1, -1.0), &seasonal)
}

/// Expanded MA polynomial `(1 + Σ θ_i L^i)(1 + Σ Θ_i L^{s i})`.
pub fn expand_ma(ma: &[f64], seasonal_ma: &[f64], period: usize) -> Vec<f64> {
    let seasonal = if period > 1 {
        factor(seasonal_ma, period, 1.0)
    } else {
        vec![1.0]
    };
    multiply(&factor(ma, 1, 1.0), &seasonal)
}

/// Largest modulus among the inverse roots of `1 + c_1 L + ... + c_k L^k`.
///
/// The process is stationary (or invertible, for an MA polynomial) when this
/// is strictly below one. Returns `0.0` for a constant polynomial and `None`
/// when the eigenvalue iteration fails to converge.
pub fn max_inverse_root_modulus(poly: &[f64]) -> Option<f64> {
    let degree = match poly.iter().rposition(|c| *c != 0.0) {
        Some(d) => d,
        None => return Some(0.0),
    };
    match degree {
        0 => Some(0.0),
        1 => Some(poly[1].abs()),
        _ => {
            // Companion matrix: first row -c_1..-c_k, ones on the subdiagonal.
            let companion = DMatrix::from_fn(degree, degree, |i, j| {
                if i == 0 {
                    -poly[j + 1]
                } else if i == j + 1 {
                    1.0
                } else {
                    0.0
                }
            });
            let schur = companion.try_schur(1e-12, 500)?;
            Some(
                schur
                    .complex_eigenvalues()
                    .iter()
                    .map(|z| z.norm())
                    .fold(0.0, f64::max),
            )
        }
    }
}

/// Largest inverse-root modulus over a multiplicative seasonal factorisation.
///
/// Checks `1 ± Σ c_i L^i` and `1 ± Σ C_i L^{s i}` separately; the seasonal
/// factor's inverse roots in `L` have modulus `|r|^{1/s}`, which is below one
/// exactly when `|r|` is, so the seasonal factor is tested in `L^s`.
pub fn max_factor_modulus(coefs: &[f64], seasonal: &[f64], sign: f64) -> Option<f64> {
    let a = max_inverse_root_modulus(&factor(coefs, 1, sign))?;
    let b = max_inverse_root_modulus(&factor(seasonal, 1, sign))?;
    Some(a.max(b))
}

/// ψ-weights `ψ_0..ψ_{h-1}` of `θ(L) / φ(L)`.
///
/// `ar` may include unit-root factors (differencing), in which case the
/// weights do not decay.
pub fn psi_weights(ar: &[f64], ma: &[f64], h: usize) -> Vec<f64> {
    let mut psi = vec![0.0; h];
    for j in 0..h {
        let mut value = ma.get(j).copied().unwrap_or(0.0);
        for i in 1..=j.min(ar.len().saturating_sub(1)) {
            value -= ar[i] * psi[j - i];
        }
        psi[j] = value;
    }
    psi
}
