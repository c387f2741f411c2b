pub mod bayesian;
pub mod capabilities;
#[cfg(feature = "clustering")]
pub mod clustering;
pub mod composite;
pub mod config;
pub mod error;
#[cfg(feature = "bayesian")]
pub mod gp;
pub mod grid;
#[cfg(feature = "kde")]
pub mod kde;
pub mod metrics;
pub mod models;
pub mod optimizer;
pub mod selection;
pub mod simulation;
pub mod walk_forward_opt;

pub use bayesian::{BayesianOutcome, BayesianSearch, SearchDimension};
pub use capabilities::{Capabilities, Capability, Clusterer, DensityEstimator, SurrogateModel};
pub use composite::compute_composite_score;
pub use config::{Objective, OptimizationConfig, SearchMethod, CONFIG_ENV};
pub use error::{OptimizerError, OptimizerResult};
pub use grid::{
    closest_in_list, expand_param_grid, grid_distance, grid_param_index, params_match, snap_params_to_grid,
};
pub use metrics::{extract_metric, extract_metric_vector, Metric};
pub use models::*;
pub use optimizer::{composite_objective, grid_search, Evaluated, GridSearchOutcome, OptimizationReport, Optimizer};
pub use selection::{
    compute_robustness_score, select_final_params, FinalParamSelector, Selection, SelectionMethod, SelectionOptions,
};
pub use simulation::{AnalyzerKey, RunReport, RunRequest, SimulationRun, Simulator};
pub use walk_forward_opt::{
    validate_parameter_selection, walk_forward_analysis, walk_forward_windows, ValidationReport, WalkForwardOutcome,
    WalkForwardSpec, WindowMetric,
};
