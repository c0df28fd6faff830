//! Derivative-free minimisation used by the likelihood fitter.

use std::cmp::Ordering;
use std::time::{Duration, Instant};

/// Outcome of a Nelder–Mead run.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// Best vertex found.
    pub optimal_point: Vec<f64>,
    /// Objective value at `optimal_point`.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the relative tolerance was met.
    pub converged: bool,
    /// Whether the run stopped because the wall-clock budget ran out.
    pub timed_out: bool,
}

/// Configuration for Nelder–Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Relative convergence tolerance on the spread of simplex values.
    pub tolerance: f64,
    /// Optional wall-clock budget; exhausting it stops without convergence.
    pub time_budget: Option<Duration>,
    /// Reflection coefficient (default: 1.0).
    pub alpha: f64,
    /// Expansion coefficient (default: 2.0).
    pub gamma: f64,
    /// Contraction coefficient (default: 0.5).
    pub rho: f64,
    /// Shrinkage coefficient (default: 0.5).
    pub sigma: f64,
    /// Initial simplex step size (default: 0.1).
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 10_000,
            tolerance: 1e-8,
            time_budget: None,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.1,
        }
    }
}

/// Perform Nelder–Mead simplex minimisation.
///
/// Convergence is declared when
/// `f_worst - f_best <= tolerance * (|f_best| + tolerance)`, or when the
/// simplex diameter falls below `0.01 * sqrt(tolerance)` relative to the
/// size of the best vertex. The run is deterministic for a fixed
/// iteration cap; a time budget adds a non-deterministic stop.
///
/// # Example
/// ```
/// use sarima_select::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
///     &[0.0, 0.0],
///     &NelderMeadConfig::default(),
/// );
///
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// assert!((result.optimal_point[1] - 3.0).abs() < 0.01);
/// ```
pub fn nelder_mead<F>(objective: F, initial: &[f64], config: &NelderMeadConfig) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        let value = objective(initial);
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: value,
            iterations: 0,
            converged: value.is_finite(),
            timed_out: false,
        };
    }

    let started = Instant::now();

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(initial.to_vec());
    for i in 0..n {
        let mut vertex = initial.to_vec();
        vertex[i] += if initial[i].abs() > 1e-10 {
            config.initial_step * initial[i].abs()
        } else {
            config.initial_step
        };
        simplex.push(vertex);
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| objective(v)).collect();

    let mut iterations = 0;
    let mut converged = false;
    let mut timed_out = false;
    let mut order: Vec<usize> = (0..=n).collect();

    while iterations < config.max_iter {
        if let Some(budget) = config.time_budget {
            if started.elapsed() >= budget {
                timed_out = true;
                break;
            }
        }
        iterations += 1;

        order.sort_by(|&a, &b| cmp_values(values[a], values[b]));
        let best = order[0];
        let worst = order[n];
        let second_worst = order[n - 1];

        let spread = values[worst] - values[best];
        if spread <= config.tolerance * (values[best].abs() + config.tolerance) {
            converged = true;
            break;
        }

        let centroid = centroid_without(&simplex, worst);
        let diameter = simplex
            .iter()
            .map(|v| distance(v, &centroid))
            .fold(0.0, f64::max);
        let scale = 1.0 + simplex[best].iter().map(|v| v * v).sum::<f64>().sqrt();
        if diameter < config.tolerance.sqrt() * 1e-2 * scale {
            converged = true;
            break;
        }

        let reflected = towards(&centroid, &simplex[worst], -config.alpha);
        let f_reflected = objective(&reflected);

        if f_reflected < values[best] {
            let expanded = towards(&centroid, &reflected, config.gamma);
            let f_expanded = objective(&expanded);
            if f_expanded < f_reflected {
                simplex[worst] = expanded;
                values[worst] = f_expanded;
            } else {
                simplex[worst] = reflected;
                values[worst] = f_reflected;
            }
            continue;
        }

        if f_reflected < values[second_worst] {
            simplex[worst] = reflected;
            values[worst] = f_reflected;
            continue;
        }

        let (contracted, f_contracted, accept) = if f_reflected < values[worst] {
            let c = towards(&centroid, &reflected, config.rho);
            let f = objective(&c);
            let ok = f <= f_reflected;
            (c, f, ok)
        } else {
            let c = towards(&centroid, &simplex[worst], config.rho);
            let f = objective(&c);
            let ok = f < values[worst];
            (c, f, ok)
        };
        if accept {
            simplex[worst] = contracted;
            values[worst] = f_contracted;
            continue;
        }

        let anchor = simplex[best].clone();
        for i in 0..=n {
            if i == best {
                continue;
            }
            simplex[i] = towards(&anchor, &simplex[i], config.sigma);
            values[i] = objective(&simplex[i]);
        }
    }

    let best = (0..=n)
        .min_by(|&a, &b| cmp_values(values[a], values[b]))
        .unwrap_or(0);

    NelderMeadResult {
        optimal_point: simplex[best].clone(),
        optimal_value: values[best],
        iterations,
        converged,
        timed_out,
    }
}

/// NaN sorts last so a poisoned vertex is always the one replaced.
fn cmp_values(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.total_cmp(&b),
    }
}

fn centroid_without(simplex: &[Vec<f64>], exclude: usize) -> Vec<f64> {
    let dim = simplex[0].len();
    let count = (simplex.len() - 1) as f64;
    let mut centroid = vec![0.0; dim];
    for (i, vertex) in simplex.iter().enumerate() {
        if i == exclude {
            continue;
        }
        for (c, v) in centroid.iter_mut().zip(vertex) {
            *c += v;
        }
    }
    centroid.iter_mut().for_each(|c| *c /= count);
    centroid
}

/// `origin + t * (point - origin)`.
fn towards(origin: &[f64], point: &[f64], t: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(point)
        .map(|(o, p)| o + t * (p - o))
        .collect()
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
