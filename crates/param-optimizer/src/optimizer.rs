use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::bayesian::BayesianSearch;
use crate::capabilities::Capabilities;
use crate::composite::composite_scores;
use crate::config::{Objective, OptimizationConfig, SearchMethod};
use crate::error::{OptimizerError, OptimizerResult};
use crate::grid::expand_param_grid;
use crate::metrics::{extract_metric, extract_metric_vector, Metric};
use crate::models::{compare_values, GridSpec, MetricValue, ParameterSet, ResultRecord};
use crate::selection::{FinalParamSelector, Selection};
use crate::simulation::{RunRequest, SimulationRun, Simulator};
use crate::walk_forward_opt::{validate_parameter_selection, walk_forward_analysis, ValidationReport};

impl Objective {
    /// Raw objective output of one run.
    pub fn evaluate<R: SimulationRun + ?Sized>(&self, run: &R) -> MetricValue {
        match self {
            Objective::Metric(metric) => MetricValue::Scalar(extract_metric(run, *metric)),
            Objective::Composite(weights) => {
                MetricValue::Vector(extract_metric_vector(run, weights.keys().map(String::as_str)))
            }
        }
    }
}

/// One grid point: its record and, when the run completed, the run itself.
#[derive(Debug, Clone)]
pub struct Evaluated<R> {
    pub record: ResultRecord,
    pub run: Option<R>,
}

/// Grid search results, best first.
#[derive(Debug, Clone)]
pub struct GridSearchOutcome<R> {
    pub evaluations: Vec<Evaluated<R>>,
}

impl<R> GridSearchOutcome<R> {
    pub fn records(&self) -> Vec<ResultRecord> {
        self.evaluations.iter().map(|e| e.record.clone()).collect()
    }

    pub fn into_records(self) -> Vec<ResultRecord> {
        self.evaluations.into_iter().map(|e| e.record).collect()
    }

    pub fn best(&self) -> Option<&Evaluated<R>> {
        self.evaluations.first()
    }

    pub fn len(&self) -> usize {
        self.evaluations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluations.is_empty()
    }
}

/// Evaluate every point of `grid` merged over `fixed`.
///
/// A failed run is logged and recorded with a missing value; a point the
/// simulator cannot build a run for is skipped. Composite objectives are
/// scored once every metric vector is in and always rank descending.
pub fn grid_search<S: Simulator>(
    simulator: &S,
    grid: &GridSpec,
    fixed: &ParameterSet,
    objective: &Objective,
    maximize: bool,
) -> OptimizerResult<GridSearchOutcome<S::Run>> {
    let points: Vec<ParameterSet> = expand_param_grid(grid)?.map(|p| fixed.merged(&p)).collect();
    info!("Grid search over {} parameter sets", points.len());

    let evaluated: Vec<Option<(ResultRecord, Option<S::Run>)>> = points
        .into_par_iter()
        .map(|params| match simulator.run(&RunRequest::new(params.clone())) {
            Ok(Some(run)) => {
                let record = match objective.evaluate(&run) {
                    MetricValue::Scalar(value) => ResultRecord::new(params, value),
                    MetricValue::Vector(metrics) => ResultRecord::new(params, None).with_metrics(metrics),
                };
                Some((record, Some(run)))
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Evaluation failed for {}: {:#}", params, e);
                Some((ResultRecord::new(params, None), None))
            }
        })
        .collect();

    let mut evaluations: Vec<Evaluated<S::Run>> = evaluated
        .into_iter()
        .flatten()
        .map(|(record, run)| Evaluated { record, run })
        .collect();

    let maximize = match objective {
        Objective::Metric(_) => maximize,
        Objective::Composite(weights) => {
            let records: Vec<ResultRecord> = evaluations.iter().map(|e| e.record.clone()).collect();
            for (e, score) in evaluations.iter_mut().zip(composite_scores(&records, weights)) {
                e.record.value = Some(score);
            }
            true
        }
    };
    evaluations.sort_by(|a, b| compare_values(a.record.value, b.record.value, maximize));

    if let Some(best) = evaluations.first() {
        info!("Grid search best: {} value={:?}", best.record.params, best.record.value);
    }
    Ok(GridSearchOutcome { evaluations })
}

/// Everything one optimization pass produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub method: SearchMethod,
    /// Ranked records of the search, best first.
    pub records: Vec<ResultRecord>,
    pub selection: Selection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationReport>,
}

/// Runs the configured search, selects final parameters and optionally
/// validates them out of sample.
#[derive(Debug)]
pub struct Optimizer {
    config: OptimizationConfig,
    selector: FinalParamSelector,
}

impl Optimizer {
    pub fn new(config: OptimizationConfig) -> OptimizerResult<Self> {
        Self::with_capabilities(config, Capabilities::detect())
    }

    pub fn with_capabilities(config: OptimizationConfig, capabilities: Capabilities) -> OptimizerResult<Self> {
        config.validate()?;
        info!("Optimizer capabilities: {:?}", capabilities);
        Ok(Self {
            config,
            selector: FinalParamSelector::new(capabilities),
        })
    }

    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }

    pub fn run<S: Simulator>(&self, simulator: &S) -> OptimizerResult<OptimizationReport> {
        let config = &self.config;
        let objective = config.objective()?;
        let maximize = config.ranks_maximize();
        info!(
            "Optimizing {} by {:?} ({})",
            config.metric,
            config.method,
            if maximize { "maximize" } else { "minimize" }
        );

        let records = match config.method {
            SearchMethod::Grid => {
                grid_search(simulator, &config.param_grid, &config.fixed_params, &objective, maximize)?
                    .into_records()
            }
            SearchMethod::WalkForward => {
                walk_forward_analysis(
                    simulator,
                    &config.param_grid,
                    &config.fixed_params,
                    config.walk_forward_spec()?,
                    single_metric(&objective)?,
                    maximize,
                )?
                .records
            }
            SearchMethod::Bayesian => {
                BayesianSearch::new(self.selector.capabilities(), config.n_calls, config.random_state)
                    .run(
                        simulator,
                        &config.param_grid,
                        &config.fixed_params,
                        single_metric(&objective)?,
                        maximize,
                    )?
                    .records
            }
        };

        let selection = self.selector.select(
            &records,
            Some(&config.param_grid),
            &config.final_selection,
            maximize,
        )?;

        let validation = if config.validate_out_of_sample && !selection.params.is_empty() {
            Some(validate_parameter_selection(
                simulator,
                &selection.params,
                config.walk_forward_spec()?,
                single_metric(&objective)?,
            )?)
        } else {
            None
        };

        Ok(OptimizationReport {
            method: config.method,
            records,
            selection,
            validation,
        })
    }
}

fn single_metric(objective: &Objective) -> OptimizerResult<Metric> {
    match objective {
        Objective::Metric(metric) => Ok(*metric),
        Objective::Composite(_) => Err(OptimizerError::InvalidConfig(
            "this search needs a single metric".to_string(),
        )),
    }
}

/// Per-metric weights for [`Objective::Composite`].
pub fn composite_objective<'a>(weights: impl IntoIterator<Item = (&'a str, f64)>) -> Objective {
    Objective::Composite(
        weights
            .into_iter()
            .map(|(k, w)| (k.to_string(), w))
            .collect::<BTreeMap<_, _>>(),
    )
}
