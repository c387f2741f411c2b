use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{OptimizerError, OptimizerResult};
use crate::metrics::Metric;
use crate::models::{GridSpec, ParameterSet};
use crate::selection::SelectionOptions;
use crate::walk_forward_opt::WalkForwardSpec;

/// Environment variable naming the optimization config file.
pub const CONFIG_ENV: &str = "OPTIMIZATION_CONFIG";

const COMPOSITE: &str = "composite";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    #[default]
    Grid,
    WalkForward,
    Bayesian,
}

/// What a search ranks on.
#[derive(Debug, Clone, PartialEq)]
pub enum Objective {
    Metric(Metric),
    /// Weighted blend of metric names; always ranked higher-is-better.
    Composite(BTreeMap<String, f64>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationConfig {
    #[serde(default)]
    pub method: SearchMethod,
    #[serde(default = "default_metric")]
    pub metric: String,
    #[serde(default = "default_true")]
    pub maximize: bool,
    #[serde(default)]
    pub param_grid: GridSpec,
    #[serde(default)]
    pub fixed_params: ParameterSet,
    #[serde(default)]
    pub composite_weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub walk_forward: Option<WalkForwardSpec>,
    #[serde(default = "default_n_calls")]
    pub n_calls: usize,
    #[serde(default = "default_random_state")]
    pub random_state: u64,
    #[serde(default)]
    pub final_selection: SelectionOptions,
    #[serde(default)]
    pub validate_out_of_sample: bool,
}

fn default_metric() -> String {
    Metric::SharpeRatio.as_str().to_string()
}

fn default_true() -> bool {
    true
}

fn default_n_calls() -> usize {
    50
}

fn default_random_state() -> u64 {
    42
}

impl OptimizationConfig {
    pub fn new(param_grid: GridSpec) -> Self {
        Self {
            method: SearchMethod::Grid,
            metric: default_metric(),
            maximize: true,
            param_grid,
            fixed_params: ParameterSet::new(),
            composite_weights: BTreeMap::new(),
            walk_forward: None,
            n_calls: default_n_calls(),
            random_state: default_random_state(),
            final_selection: SelectionOptions::default(),
            validate_out_of_sample: false,
        }
    }

    pub fn from_json_str(s: &str) -> OptimizerResult<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> OptimizerResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Load the file named by `OPTIMIZATION_CONFIG`, reading `.env` first.
    pub fn from_env() -> OptimizerResult<Self> {
        dotenvy::dotenv().ok();
        let path = std::env::var(CONFIG_ENV).map_err(|_| OptimizerError::MissingKey(CONFIG_ENV.to_string()))?;
        Self::from_path(path)
    }

    pub fn is_composite(&self) -> bool {
        self.metric.trim().eq_ignore_ascii_case(COMPOSITE)
    }

    pub fn objective(&self) -> OptimizerResult<Objective> {
        if self.is_composite() {
            return Ok(Objective::Composite(self.composite_weights.clone()));
        }
        Ok(Objective::Metric(self.metric.parse()?))
    }

    /// Direction used for ranking records; composite scores always maximize.
    pub fn ranks_maximize(&self) -> bool {
        self.is_composite() || self.maximize
    }

    /// The walk-forward section, required by walk-forward search and
    /// out-of-sample validation.
    pub fn walk_forward_spec(&self) -> OptimizerResult<&WalkForwardSpec> {
        self.walk_forward
            .as_ref()
            .ok_or_else(|| OptimizerError::MissingKey("walk_forward".to_string()))
    }

    pub fn validate(&self) -> OptimizerResult<()> {
        self.param_grid.validate()?;

        if self.is_composite() {
            if self.composite_weights.is_empty() {
                return Err(OptimizerError::InvalidConfig(
                    "composite metric requires composite_weights".to_string(),
                ));
            }
            if self.method != SearchMethod::Grid {
                return Err(OptimizerError::InvalidConfig(
                    "composite metric is only supported by grid search".to_string(),
                ));
            }
            if self.validate_out_of_sample {
                return Err(OptimizerError::InvalidConfig(
                    "out-of-sample validation needs a single metric".to_string(),
                ));
            }
            for name in self.composite_weights.keys() {
                name.parse::<Metric>()?;
            }
        } else {
            self.metric.parse::<Metric>()?;
        }

        if self.method == SearchMethod::WalkForward || self.validate_out_of_sample {
            self.walk_forward_spec()?.validate()?;
        }
        if self.n_calls == 0 {
            return Err(OptimizerError::InvalidConfig("n_calls must be positive".to_string()));
        }
        self.final_selection.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParamValue;
    use crate::selection::SelectionMethod;

    const FULL: &str = r#"{
        "method": "walk_forward",
        "metric": "sharperatio",
        "param_grid": {"atr_period": [10, 14, 20], "risk": [0.02, 0.03]},
        "fixed_params": {"use_trailing": true},
        "walk_forward": {"from_date": "2020-01-01", "to_date": "2022-01-01", "train_days": 180, "test_days": 60},
        "final_selection": {"method": "plateau", "top_pct": 0.5}
    }"#;

    #[test]
    fn test_parse_full_config() {
        let config = OptimizationConfig::from_json_str(FULL).unwrap();
        assert_eq!(config.method, SearchMethod::WalkForward);
        assert!(config.maximize);
        assert_eq!(config.param_grid.names().collect::<Vec<_>>(), vec!["atr_period", "risk"]);
        assert_eq!(config.fixed_params.get("use_trailing"), Some(&ParamValue::Bool(true)));
        assert_eq!(config.final_selection.method, SelectionMethod::Plateau);
        assert_eq!(config.final_selection.robust_alpha, 0.7);
        assert_eq!(config.n_calls, 50);
        assert_eq!(config.objective().unwrap(), Objective::Metric(Metric::SharpeRatio));
    }

    #[test]
    fn test_missing_grid_rejected() {
        let err = OptimizationConfig::from_json_str(r#"{"metric": "cagr"}"#).unwrap_err();
        assert!(matches!(err, OptimizerError::EmptyGrid));

        let err = OptimizationConfig::from_json_str(r#"{"param_grid": {"a": []}}"#).unwrap_err();
        assert!(matches!(err, OptimizerError::EmptyCandidates(ref k) if k == "a"));
    }

    #[test]
    fn test_walk_forward_section_required() {
        let err = OptimizationConfig::from_json_str(r#"{"method": "walk_forward", "param_grid": {"a": [1]}}"#)
            .unwrap_err();
        assert!(matches!(err, OptimizerError::MissingKey(ref k) if k == "walk_forward"));
    }

    #[test]
    fn test_composite_rules() {
        let grid = GridSpec::new().with_axis("a", [1, 2]);
        let mut config = OptimizationConfig::new(grid);
        config.metric = "composite".to_string();
        assert!(config.validate().is_err());

        config.composite_weights.insert("sharperatio".to_string(), 0.6);
        config.composite_weights.insert("drawdown".to_string(), 0.4);
        assert!(config.validate().is_ok());
        assert!(config.ranks_maximize());

        config.method = SearchMethod::Bayesian;
        assert!(config.validate().is_err());

        config.method = SearchMethod::Grid;
        config.composite_weights.insert("alpha".to_string(), 1.0);
        assert!(matches!(config.validate(), Err(OptimizerError::UnknownMetric(_))));
    }

    #[test]
    fn test_unknown_metric_and_bounds() {
        let grid = GridSpec::new().with_axis("a", [1, 2]);
        let mut config = OptimizationConfig::new(grid);
        config.metric = "alpha".to_string();
        assert!(matches!(config.validate(), Err(OptimizerError::UnknownMetric(_))));

        config.metric = "drawdown".to_string();
        config.n_calls = 0;
        assert!(config.validate().is_err());
    }
}
