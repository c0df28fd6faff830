//! Candidate order generation: exhaustive grid and stepwise local search.
//!
//! Neither generator fits anything. The caller pulls a batch of orders,
//! fits them (in parallel if it likes) and records the resulting criterion
//! values before asking for the next batch.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::arima::order::OrderSpec;

/// Orders pulled per batch from the exhaustive grid.
const EXHAUSTIVE_BATCH: usize = 32;

/// Upper bounds on the ARMA orders of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBounds {
    /// Maximum non-seasonal AR order.
    pub max_p: usize,
    /// Maximum non-seasonal MA order.
    pub max_q: usize,
    /// Maximum seasonal AR order.
    pub max_cap_p: usize,
    /// Maximum seasonal MA order.
    pub max_cap_q: usize,
}

impl Default for OrderBounds {
    fn default() -> Self {
        Self {
            max_p: 5,
            max_q: 5,
            max_cap_p: 2,
            max_cap_q: 2,
        }
    }
}

impl OrderBounds {
    pub fn new(max_p: usize, max_q: usize, max_cap_p: usize, max_cap_q: usize) -> Self {
        Self {
            max_p,
            max_q,
            max_cap_p,
            max_cap_q,
        }
    }

    /// Largest AR lag any candidate can reach with period `s`.
    pub fn max_ar_degree(&self, s: usize) -> usize {
        self.max_p + if s > 1 { self.max_cap_p * s } else { 0 }
    }

    fn contains(&self, p: usize, q: usize, cap_p: usize, cap_q: usize) -> bool {
        p <= self.max_p && q <= self.max_q && cap_p <= self.max_cap_p && cap_q <= self.max_cap_q
    }
}

/// Search strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchMode {
    /// Greedy neighbourhood search from a handful of seeds.
    #[default]
    Stepwise,
    /// Every order inside the bounds.
    Exhaustive,
}

/// Fixed part of every candidate: differencing orders and period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame {
    d: usize,
    cap_d: usize,
    s: usize,
}

impl Frame {
    fn seasonal(&self) -> bool {
        self.s > 1
    }

    fn order(&self, p: usize, q: usize, cap_p: usize, cap_q: usize) -> OrderSpec {
        if self.seasonal() {
            OrderSpec::new(p, self.d, q).with_seasonal(cap_p, self.cap_d, cap_q, self.s)
        } else {
            OrderSpec::new(p, self.d, q)
        }
    }
}

/// Lazy, finite, restartable walk over the full bounded grid.
#[derive(Debug, Clone)]
pub struct ExhaustiveSearch {
    frame: Frame,
    bounds: OrderBounds,
    cursor: usize,
}

impl ExhaustiveSearch {
    pub fn new(d: usize, cap_d: usize, s: usize, bounds: OrderBounds) -> Self {
        Self {
            frame: Frame { d, cap_d, s },
            bounds,
            cursor: 0,
        }
    }

    /// Number of orders in the grid.
    pub fn grid_size(&self) -> usize {
        let b = &self.bounds;
        let base = (b.max_p + 1) * (b.max_q + 1);
        if self.frame.seasonal() {
            base * (b.max_cap_p + 1) * (b.max_cap_q + 1)
        } else {
            base
        }
    }

    /// Restart from the first order.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}

impl Iterator for ExhaustiveSearch {
    type Item = OrderSpec;

    fn next(&mut self) -> Option<OrderSpec> {
        if self.cursor >= self.grid_size() {
            return None;
        }
        let b = &self.bounds;
        let mut rest = self.cursor;
        let p = rest % (b.max_p + 1);
        rest /= b.max_p + 1;
        let q = rest % (b.max_q + 1);
        rest /= b.max_q + 1;
        let (cap_p, cap_q) = if self.frame.seasonal() {
            let cap_p = rest % (b.max_cap_p + 1);
            rest /= b.max_cap_p + 1;
            (cap_p, rest % (b.max_cap_q + 1))
        } else {
            (0, 0)
        };
        self.cursor += 1;
        Some(self.frame.order(p, q, cap_p, cap_q))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.grid_size().saturating_sub(self.cursor);
        (left, Some(left))
    }
}

/// Phase of the stepwise search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SearchState {
    /// Seed orders not yet evaluated.
    Seed,
    /// Walking the neighbourhood of the current best.
    Exploring,
    /// No untried neighbour improved on the current best.
    Converged,
    /// The step budget ran out (or no seed could be fitted).
    Exhausted,
}

/// Greedy local search over `(p, q, P, Q)` as an explicit state machine.
///
/// One step is one candidate order handed to the caller, so the budget
/// bounds the number of fits.
#[derive(Debug, Clone)]
pub struct StepwiseSearch {
    frame: Frame,
    bounds: OrderBounds,
    max_steps: usize,
    state: SearchState,
    tried: BTreeSet<OrderSpec>,
    pending: Vec<OrderSpec>,
    best: Option<(OrderSpec, f64)>,
    steps: usize,
}

impl StepwiseSearch {
    pub fn new(d: usize, cap_d: usize, s: usize, bounds: OrderBounds, max_steps: usize) -> Self {
        Self {
            frame: Frame { d, cap_d, s },
            bounds,
            max_steps,
            state: SearchState::Seed,
            tried: BTreeSet::new(),
            pending: Vec::new(),
            best: None,
            steps: 0,
        }
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Best order recorded so far and its criterion value.
    pub fn best(&self) -> Option<(OrderSpec, f64)> {
        self.best
    }

    /// Candidates handed out so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Back to `Seed` with an empty history.
    pub fn reset(&mut self) {
        self.state = SearchState::Seed;
        self.tried.clear();
        self.pending.clear();
        self.best = None;
        self.steps = 0;
    }

    /// Orders to fit next, or `None` once the search has terminated.
    ///
    /// A batch stays outstanding (and is returned again) until it is
    /// passed to [`record`](Self::record).
    pub fn next_batch(&mut self) -> Option<Vec<OrderSpec>> {
        if !self.pending.is_empty() {
            return Some(self.pending.clone());
        }
        let batch = match self.state {
            SearchState::Seed => self.seeds(),
            SearchState::Exploring => {
                let (best, _) = self.best?;
                self.neighbours(&best)
            }
            SearchState::Converged | SearchState::Exhausted => return None,
        };

        let remaining = self.max_steps.saturating_sub(self.steps);
        if remaining == 0 {
            self.state = SearchState::Exhausted;
            return None;
        }
        if batch.is_empty() {
            self.state = SearchState::Converged;
            return None;
        }

        let batch: Vec<OrderSpec> = batch.into_iter().take(remaining).collect();
        self.steps += batch.len();
        self.tried.extend(batch.iter().copied());
        self.pending = batch.clone();
        debug!(state = ?self.state, size = batch.len(), steps = self.steps, "stepwise batch");
        Some(batch)
    }

    /// Record criterion values for the outstanding batch (`None` = failed fit).
    pub fn record(&mut self, results: &[(OrderSpec, Option<f64>)]) {
        let mut improved = false;
        for (order, value) in results {
            let Some(value) = value.filter(|v| v.is_finite()) else {
                continue;
            };
            let better = match self.best {
                None => true,
                Some((_, best)) => value < best,
            };
            if better {
                self.best = Some((*order, value));
                improved = true;
            }
        }
        self.pending.clear();

        self.state = match (self.state, self.best, improved) {
            (_, None, _) => SearchState::Exhausted,
            (SearchState::Seed, Some(_), _) | (SearchState::Exploring, _, true) => {
                if self.steps >= self.max_steps {
                    SearchState::Exhausted
                } else {
                    SearchState::Exploring
                }
            }
            (SearchState::Exploring, _, false) => SearchState::Converged,
            (terminal, _, _) => terminal,
        };
    }

    fn seeds(&self) -> Vec<OrderSpec> {
        let b = &self.bounds;
        let seasonal = self.frame.seasonal();
        let raw = [(2, 2, 1, 1), (0, 0, 0, 0), (1, 0, 1, 0), (0, 1, 0, 1)];
        let mut out: Vec<OrderSpec> = Vec::with_capacity(raw.len());
        for (p, q, cap_p, cap_q) in raw {
            let (cap_p, cap_q) = if seasonal { (cap_p, cap_q) } else { (0, 0) };
            let order = self.frame.order(
                p.min(b.max_p),
                q.min(b.max_q),
                cap_p.min(b.max_cap_p),
                cap_q.min(b.max_cap_q),
            );
            if !out.contains(&order) {
                out.push(order);
            }
        }
        out
    }

    fn neighbours(&self, centre: &OrderSpec) -> Vec<OrderSpec> {
        let (p, q, cap_p, cap_q) = (
            centre.p as i64,
            centre.q as i64,
            centre.cap_p as i64,
            centre.cap_q as i64,
        );
        let mut moves: Vec<(i64, i64, i64, i64)> = vec![
            (-1, 0, 0, 0),
            (1, 0, 0, 0),
            (0, -1, 0, 0),
            (0, 1, 0, 0),
            (-1, -1, 0, 0),
            (1, 1, 0, 0),
        ];
        if self.frame.seasonal() {
            moves.extend([
                (0, 0, -1, 0),
                (0, 0, 1, 0),
                (0, 0, 0, -1),
                (0, 0, 0, 1),
                (0, 0, -1, -1),
                (0, 0, 1, 1),
            ]);
        }

        moves
            .into_iter()
            .filter_map(|(dp, dq, dcp, dcq)| {
                let np = p + dp;
                let nq = q + dq;
                let ncp = cap_p + dcp;
                let ncq = cap_q + dcq;
                if np < 0 || nq < 0 || ncp < 0 || ncq < 0 {
                    return None;
                }
                let (np, nq, ncp, ncq) = (np as usize, nq as usize, ncp as usize, ncq as usize);
                if !self.bounds.contains(np, nq, ncp, ncq) {
                    return None;
                }
                let order = self.frame.order(np, nq, ncp, ncq);
                (!self.tried.contains(&order)).then_some(order)
            })
            .collect()
    }
}

/// Either generator behind one batch interface.
#[derive(Debug, Clone)]
pub enum CandidateOrderGenerator {
    Exhaustive(ExhaustiveSearch),
    Stepwise(StepwiseSearch),
}

impl CandidateOrderGenerator {
    /// Generator for fixed `(d, D, s)`.
    pub fn new(
        mode: SearchMode,
        d: usize,
        cap_d: usize,
        s: usize,
        bounds: OrderBounds,
        max_steps: usize,
    ) -> Self {
        match mode {
            SearchMode::Exhaustive => Self::Exhaustive(ExhaustiveSearch::new(d, cap_d, s, bounds)),
            SearchMode::Stepwise => {
                Self::Stepwise(StepwiseSearch::new(d, cap_d, s, bounds, max_steps))
            }
        }
    }

    /// Next batch of orders to fit.
    pub fn next_batch(&mut self) -> Option<Vec<OrderSpec>> {
        match self {
            Self::Exhaustive(grid) => {
                let batch: Vec<OrderSpec> = grid.by_ref().take(EXHAUSTIVE_BATCH).collect();
                (!batch.is_empty()).then_some(batch)
            }
            Self::Stepwise(search) => search.next_batch(),
        }
    }

    /// Feed back the outcome of the last batch.
    pub fn record(&mut self, results: &[(OrderSpec, Option<f64>)]) {
        if let Self::Stepwise(search) = self {
            search.record(results);
        }
    }

    /// Restart from the beginning.
    pub fn reset(&mut self) {
        match self {
            Self::Exhaustive(grid) => grid.reset(),
            Self::Stepwise(search) => search.reset(),
        }
    }

    /// Stepwise state; `None` for the exhaustive grid.
    pub fn state(&self) -> Option<SearchState> {
        match self {
            Self::Exhaustive(_) => None,
            Self::Stepwise(search) => Some(search.state()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhaustive_covers_grid_once() {
        let bounds = OrderBounds::new(2, 1, 1, 1);
        let grid: Vec<OrderSpec> = ExhaustiveSearch::new(1, 1, 12, bounds).collect();
        assert_eq!(grid.len(), 3 * 2 * 2 * 2);
        let unique: BTreeSet<OrderSpec> = grid.iter().copied().collect();
        assert_eq!(unique.len(), grid.len());
        assert!(grid.iter().all(|o| o.d == 1 && o.cap_d == 1 && o.s == 12));
    }

    #[test]
    fn exhaustive_non_seasonal_ignores_seasonal_bounds() {
        let grid: Vec<OrderSpec> =
            ExhaustiveSearch::new(0, 0, 1, OrderBounds::new(1, 1, 2, 2)).collect();
        assert_eq!(grid.len(), 4);
        assert!(grid.iter().all(|o| o.cap_p == 0 && o.cap_q == 0));
    }

    #[test]
    fn exhaustive_is_restartable() {
        let mut grid = ExhaustiveSearch::new(0, 0, 0, OrderBounds::new(1, 1, 0, 0));
        let first: Vec<OrderSpec> = grid.by_ref().collect();
        assert!(grid.next().is_none());
        grid.reset();
        let second: Vec<OrderSpec> = grid.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn seeds_are_clipped_and_deduplicated() {
        let mut search = StepwiseSearch::new(1, 0, 0, OrderBounds::new(1, 1, 1, 1), 94);
        let seeds = search.next_batch().unwrap();
        assert_eq!(
            seeds,
            vec![
                OrderSpec::new(1, 1, 1),
                OrderSpec::new(0, 1, 0),
                OrderSpec::new(1, 1, 0),
                OrderSpec::new(0, 1, 1),
            ]
        );
    }

    #[test]
    fn seasonal_seeds() {
        let mut search = StepwiseSearch::new(1, 1, 12, OrderBounds::default(), 94);
        let seeds = search.next_batch().unwrap();
        assert_eq!(seeds[0], OrderSpec::new(2, 1, 2).with_seasonal(1, 1, 1, 12));
        assert_eq!(seeds[3], OrderSpec::new(0, 1, 1).with_seasonal(0, 1, 1, 12));
    }

    /// Drive a search against a criterion surface with a unique minimum.
    fn run(search: &mut StepwiseSearch, surface: impl Fn(&OrderSpec) -> f64) -> Vec<OrderSpec> {
        let mut visited = Vec::new();
        while let Some(batch) = search.next_batch() {
            let results: Vec<(OrderSpec, Option<f64>)> =
                batch.iter().map(|o| (*o, Some(surface(o)))).collect();
            visited.extend(batch);
            search.record(&results);
        }
        visited
    }

    #[test]
    fn walks_to_the_minimum_and_converges() {
        let mut search = StepwiseSearch::new(0, 0, 0, OrderBounds::default(), 94);
        let surface = |o: &OrderSpec| {
            (o.p as f64 - 4.0).powi(2) + (o.q as f64 - 3.0).powi(2)
        };
        let visited = run(&mut search, surface);

        assert_eq!(search.state(), SearchState::Converged);
        assert_eq!(search.best().unwrap().0, OrderSpec::new(4, 0, 3));
        let unique: BTreeSet<OrderSpec> = visited.iter().copied().collect();
        assert_eq!(unique.len(), visited.len(), "no order is tried twice");
    }

    #[test]
    fn budget_exhaustion() {
        let mut search = StepwiseSearch::new(0, 0, 0, OrderBounds::default(), 6);
        let visited = run(&mut search, |o| -((o.p + o.q) as f64));
        assert_eq!(search.state(), SearchState::Exhausted);
        assert_eq!(visited.len(), 6);
    }

    #[test]
    fn all_seeds_failing_exhausts() {
        let mut search = StepwiseSearch::new(0, 0, 0, OrderBounds::default(), 94);
        let seeds = search.next_batch().unwrap();
        let failed: Vec<(OrderSpec, Option<f64>)> = seeds.iter().map(|o| (*o, None)).collect();
        search.record(&failed);
        assert_eq!(search.state(), SearchState::Exhausted);
        assert!(search.next_batch().is_none());
    }

    #[test]
    fn outstanding_batch_is_repeated_until_recorded() {
        let mut search = StepwiseSearch::new(0, 0, 0, OrderBounds::default(), 94);
        let a = search.next_batch().unwrap();
        let b = search.next_batch().unwrap();
        assert_eq!(a, b);
        assert_eq!(search.steps(), a.len());
    }

    #[test]
    fn reset_restarts_from_seed() {
        let mut search = StepwiseSearch::new(0, 0, 0, OrderBounds::default(), 94);
        let first = run(&mut search, |o| (o.p + o.q) as f64);
        search.reset();
        assert_eq!(search.state(), SearchState::Seed);
        let second = run(&mut search, |o| (o.p + o.q) as f64);
        assert_eq!(first, second);
    }

    #[test]
    fn neighbours_include_joint_moves() {
        let mut search = StepwiseSearch::new(0, 1, 12, OrderBounds::default(), 94);
        let seeds = search.next_batch().unwrap();
        // Make (0,0,0)(0,1,0) the best seed.
        let results: Vec<(OrderSpec, Option<f64>)> = seeds
            .iter()
            .map(|o| (*o, Some(if o.arma_order() == 0 { 1.0 } else { 2.0 })))
            .collect();
        search.record(&results);
        let next = search.next_batch().unwrap();
        assert!(next.contains(&OrderSpec::new(1, 0, 1).with_seasonal(0, 1, 0, 12)));
        assert!(next.contains(&OrderSpec::new(0, 0, 0).with_seasonal(1, 1, 1, 12)));
        assert!(next.iter().all(|o| o.arma_order() <= 2));
    }

    #[test]
    fn generator_wraps_both_modes() {
        let mut gen =
            CandidateOrderGenerator::new(SearchMode::Exhaustive, 0, 0, 0, OrderBounds::new(5, 5, 0, 0), 94);
        let first = gen.next_batch().unwrap();
        assert_eq!(first.len(), 32);
        let second = gen.next_batch().unwrap();
        assert_eq!(second.len(), 4);
        assert!(gen.next_batch().is_none());
        gen.reset();
        assert_eq!(gen.next_batch().unwrap(), first);
    }
}
