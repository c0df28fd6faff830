//! Ranking of fitted candidates by information criterion.

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};
use crate::models::arima::model::FittedModel;

/// Criteria within this distance of the minimum count as tied.
pub const TIE_TOLERANCE: f64 = 1e-6;

/// Information criterion used to rank candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Criterion {
    /// Akaike information criterion.
    #[default]
    Aic,
    /// Small-sample corrected AIC.
    Aicc,
    /// Bayesian (Schwarz) information criterion.
    Bic,
}

/// Best candidate plus the full ranking, best first.
#[derive(Debug, Clone, Serialize)]
pub struct Ranking {
    criterion: Criterion,
    ranked: Vec<FittedModel>,
}

impl Ranking {
    /// The selected model.
    pub fn best(&self) -> &FittedModel {
        &self.ranked[0]
    }

    /// All candidates; the selected model first, the rest ascending by criterion.
    pub fn ranked(&self) -> &[FittedModel] {
        &self.ranked
    }

    /// Criterion used for ranking.
    pub fn criterion(&self) -> Criterion {
        self.criterion
    }

    /// Take ownership of the selected model.
    pub fn into_best(mut self) -> FittedModel {
        self.ranked.swap_remove(0)
    }

    /// Number of ranked candidates.
    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    /// Always `false`; an empty ranking is an error.
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

/// Orders candidates ascending by one criterion; near-ties go to the model
/// with fewer ARMA terms `p + q + P + Q`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InformationCriterionSelector {
    criterion: Criterion,
}

impl InformationCriterionSelector {
    pub fn new(criterion: Criterion) -> Self {
        Self { criterion }
    }

    pub fn criterion(&self) -> Criterion {
        self.criterion
    }

    /// Rank `candidates`. Candidates with a non-finite criterion are dropped.
    ///
    /// # Errors
    /// `NoCandidateConverged` when nothing is left to rank.
    pub fn select(&self, candidates: Vec<FittedModel>) -> Result<Ranking> {
        let attempted = candidates.len();
        let mut ranked: Vec<FittedModel> = candidates
            .into_iter()
            .filter(|m| m.criterion(self.criterion).is_finite())
            .collect();
        if ranked.is_empty() {
            return Err(ForecastError::NoCandidateConverged { attempted });
        }

        let c = self.criterion;
        ranked.sort_by(|a, b| a.criterion(c).total_cmp(&b.criterion(c)));

        let minimum = ranked[0].criterion(c);
        let best = ranked
            .iter()
            .enumerate()
            .take_while(|(_, m)| m.criterion(c) - minimum <= TIE_TOLERANCE)
            .min_by(|(_, a), (_, b)| {
                a.order()
                    .arma_order()
                    .cmp(&b.order().arma_order())
                    .then_with(|| a.criterion(c).total_cmp(&b.criterion(c)))
            })
            .map(|(i, _)| i)
            .unwrap_or(0);
        if best != 0 {
            let chosen = ranked.remove(best);
            ranked.insert(0, chosen);
        }

        Ok(Ranking {
            criterion: c,
            ranked,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::arima::model::{
        Coefficients, ForecastState, InformationCriteria,
    };
    use crate::models::arima::order::OrderSpec;

    /// A model whose only meaningful content is its order and AIC.
    pub(crate) fn stub(order: OrderSpec, aic: f64) -> FittedModel {
        FittedModel {
            order,
            coefficients: Coefficients {
                ar: vec![0.0; order.p],
                ma: vec![0.0; order.q],
                seasonal_ar: vec![0.0; order.cap_p],
                seasonal_ma: vec![0.0; order.cap_q],
                constant: None,
                regression: vec![],
            },
            sigma2: 1.0,
            log_likelihood: 0.0,
            criteria: InformationCriteria {
                aic,
                aicc: aic + 1.0,
                bic: aic + 2.0,
            },
            nobs: 50,
            residuals: vec![],
            fitted: vec![],
            regressor_names: vec![],
            state: ForecastState {
                levels: vec![],
                regressors: vec![],
                disturbances: vec![],
                innovations: vec![],
                end: 0,
            },
        }
    }

    #[test]
    fn selects_unique_minimum() {
        let candidates = vec![
            stub(OrderSpec::new(1, 1, 0), 105.0),
            stub(OrderSpec::new(0, 1, 1), 101.0),
            stub(OrderSpec::new(2, 1, 2), 103.0),
        ];
        let ranking = InformationCriterionSelector::default()
            .select(candidates)
            .unwrap();
        assert_eq!(ranking.best().order(), &OrderSpec::new(0, 1, 1));
        let aics: Vec<f64> = ranking.ranked().iter().map(|m| m.aic()).collect();
        assert_eq!(aics, vec![101.0, 103.0, 105.0]);
    }

    #[test]
    fn near_tie_prefers_fewer_parameters() {
        let candidates = vec![
            stub(OrderSpec::new(2, 1, 2), 100.0),
            stub(OrderSpec::new(1, 1, 0), 100.0 + 5e-7),
            stub(OrderSpec::new(0, 1, 0), 120.0),
        ];
        let ranking = InformationCriterionSelector::default()
            .select(candidates)
            .unwrap();
        assert_eq!(ranking.best().order(), &OrderSpec::new(1, 1, 0));
        assert_eq!(ranking.len(), 3);
        assert_eq!(ranking.ranked()[1].order(), &OrderSpec::new(2, 1, 2));
    }

    #[test]
    fn gap_beyond_tolerance_is_not_a_tie() {
        let candidates = vec![
            stub(OrderSpec::new(2, 1, 2), 100.0),
            stub(OrderSpec::new(1, 1, 0), 100.0 + 1e-5),
        ];
        let ranking = InformationCriterionSelector::default()
            .select(candidates)
            .unwrap();
        assert_eq!(ranking.best().order(), &OrderSpec::new(2, 1, 2));
    }

    #[test]
    fn ranks_by_configured_criterion() {
        let candidates = vec![
            stub(OrderSpec::new(1, 0, 0), 10.0),
            stub(OrderSpec::new(0, 0, 1), 11.0),
        ];
        let ranking = InformationCriterionSelector::new(Criterion::Bic)
            .select(candidates)
            .unwrap();
        assert_eq!(ranking.criterion(), Criterion::Bic);
        assert_eq!(ranking.best().bic(), 12.0);
    }

    #[test]
    fn empty_input_is_fatal() {
        let err = InformationCriterionSelector::default()
            .select(vec![])
            .unwrap_err();
        assert_eq!(err, ForecastError::NoCandidateConverged { attempted: 0 });
    }

    #[test]
    fn non_finite_criteria_are_dropped() {
        let candidates = vec![stub(OrderSpec::new(1, 0, 0), f64::NAN)];
        assert!(InformationCriterionSelector::default()
            .select(candidates)
            .is_err());
    }
}
