use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::capabilities::Capabilities;
use crate::error::OptimizerResult;
use crate::metrics::{extract_metric, Metric};
use crate::models::{sort_records, GridSpec, ParamValue, ParameterSet, ResultRecord};
use crate::simulation::{RunRequest, Simulator};

const INITIAL_POINTS: usize = 5;

/// Typed search dimension derived from one grid axis.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchDimension {
    Integer { low: i64, high: i64 },
    Real { low: f64, high: f64 },
    Categorical(Vec<ParamValue>),
}

impl SearchDimension {
    /// Integer range when every candidate is an integer, real range when every
    /// candidate is numeric, the full candidate set otherwise.
    pub fn from_candidates(candidates: &[ParamValue]) -> Self {
        if !candidates.is_empty() && candidates.iter().all(ParamValue::is_int) {
            let ints: Vec<i64> = candidates
                .iter()
                .filter_map(|c| match c {
                    ParamValue::Int(i) => Some(*i),
                    _ => None,
                })
                .collect();
            let low = ints.iter().copied().min().unwrap_or(0);
            let high = ints.iter().copied().max().unwrap_or(0);
            return SearchDimension::Integer { low, high };
        }
        if !candidates.is_empty() && candidates.iter().all(ParamValue::is_numeric) {
            let values: Vec<f64> = candidates.iter().filter_map(ParamValue::as_f64).collect();
            let low = values.iter().copied().fold(f64::INFINITY, f64::min);
            let high = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            return SearchDimension::Real { low, high };
        }
        SearchDimension::Categorical(candidates.to_vec())
    }

    /// Map a unit-interval coordinate onto this dimension.
    pub fn decode(&self, u: f64) -> ParamValue {
        let u = u.clamp(0.0, 1.0);
        match self {
            SearchDimension::Integer { low, high } => {
                let raw = *low as f64 + u * (high - low) as f64;
                ParamValue::Int((raw.round() as i64).clamp(*low, *high))
            }
            SearchDimension::Real { low, high } => ParamValue::Float(low + u * (high - low)),
            SearchDimension::Categorical(values) => {
                if values.is_empty() {
                    return ParamValue::Text(String::new());
                }
                let idx = ((u * values.len() as f64).floor() as usize).min(values.len() - 1);
                values[idx].clone()
            }
        }
    }
}

/// Evaluated points of a Bayesian search, best first.
#[derive(Debug, Clone, Default)]
pub struct BayesianOutcome {
    pub records: Vec<ResultRecord>,
    pub best: Option<ParameterSet>,
    pub best_value: Option<f64>,
}

/// Sequential model-based search over the grid's bounding box.
pub struct BayesianSearch<'a> {
    capabilities: &'a Capabilities,
    n_calls: usize,
    random_state: u64,
}

impl<'a> BayesianSearch<'a> {
    pub fn new(capabilities: &'a Capabilities, n_calls: usize, random_state: u64) -> Self {
        Self {
            capabilities,
            n_calls,
            random_state,
        }
    }

    /// Run exactly `n_calls` simulations, one per proposal.
    ///
    /// Returns an empty outcome when no surrogate backend is available.
    pub fn run<S: Simulator>(
        &self,
        simulator: &S,
        grid: &GridSpec,
        fixed: &ParameterSet,
        metric: Metric,
        maximize: bool,
    ) -> OptimizerResult<BayesianOutcome> {
        grid.validate()?;
        let Some(model) = self.capabilities.bayesian.as_ref() else {
            warn!("Bayesian search backend unavailable, returning no results");
            return Ok(BayesianOutcome::default());
        };

        let dims: Vec<(String, SearchDimension)> = grid
            .axes()
            .map(|(name, values)| (name.to_string(), SearchDimension::from_candidates(values)))
            .collect();
        let n_initial = INITIAL_POINTS.min(self.n_calls);
        let mut rng = StdRng::seed_from_u64(self.random_state);

        info!(
            "Bayesian search: {} dimensions, {} calls ({} random)",
            dims.len(),
            self.n_calls,
            n_initial
        );

        let mut observed: Vec<Vec<f64>> = Vec::with_capacity(self.n_calls);
        let mut objective: Vec<Option<f64>> = Vec::with_capacity(self.n_calls);
        let mut records = Vec::with_capacity(self.n_calls);

        for call in 0..self.n_calls {
            let point: Vec<f64> = if call < n_initial {
                (0..dims.len()).map(|_| rng.gen::<f64>()).collect()
            } else {
                let fitted = penalised(&objective);
                model.propose(&observed, &fitted, dims.len(), &mut rng)
            };

            let params: ParameterSet = dims
                .iter()
                .zip(&point)
                .map(|((name, dim), u)| (name.clone(), dim.decode(*u)))
                .collect();
            let merged = fixed.merged(&params);

            let value = match simulator.run(&RunRequest::new(merged.clone())) {
                Ok(Some(run)) => extract_metric(&run, metric),
                Ok(None) => None,
                Err(e) => {
                    warn!("Bayesian evaluation failed for {}: {:#}", merged, e);
                    None
                }
            };
            debug!("Bayesian call {}: {} -> {:?}", call + 1, merged, value);

            observed.push(point);
            objective.push(value.map(|v| if maximize { -v } else { v }));
            records.push(ResultRecord::new(merged, value));
        }

        sort_records(&mut records, maximize);
        let best = records.first().filter(|r| r.finite_value().is_some());
        Ok(BayesianOutcome {
            best: best.map(|r| r.params.clone()),
            best_value: best.and_then(|r| r.value),
            records,
        })
    }
}

/// Objective values for surrogate fitting: missing values become a finite
/// penalty worse than every observed value.
fn penalised(objective: &[Option<f64>]) -> Vec<f64> {
    let finite: Vec<f64> = objective.iter().flatten().copied().filter(|v| v.is_finite()).collect();
    let penalty = match (
        finite.iter().copied().reduce(f64::min),
        finite.iter().copied().reduce(f64::max),
    ) {
        (Some(lo), Some(hi)) => hi + (hi - lo).max(1.0),
        _ => 1.0,
    };
    objective
        .iter()
        .map(|v| v.filter(|x| x.is_finite()).unwrap_or(penalty))
        .collect()
}
