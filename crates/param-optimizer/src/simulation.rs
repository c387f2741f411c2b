use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{ParameterSet, RunWindow};

/// Analyzer outputs a completed run can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerKey {
    SharpeRatio,
    /// Maximum drawdown as a positive percentage (15.5 = 15.5%).
    MaxDrawdownPct,
    ClosedTrades,
    WonTrades,
    GrossProfit,
    GrossLoss,
}

/// Read-only view of a finished simulation.
pub trait SimulationRun {
    fn final_value(&self) -> f64;

    fn analyzer(&self, key: AnalyzerKey) -> Option<f64>;

    /// Daily returns in date order.
    fn return_series(&self) -> &[(NaiveDate, f64)];
}

/// One simulation request: the merged parameter set and an optional window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    pub params: ParameterSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<RunWindow>,
}

impl RunRequest {
    pub fn new(params: ParameterSet) -> Self {
        Self {
            params,
            window: None,
        }
    }

    pub fn windowed(params: ParameterSet, window: RunWindow) -> Self {
        Self {
            params,
            window: Some(window),
        }
    }
}

/// Runs one backtest per request.
///
/// `Ok(None)` means no run can be built for the request (for example no
/// data in the window); the point or window is skipped. `Err` is an
/// evaluation failure: it is logged and recorded as a missing metric.
/// Each call must use its own engine state, since calls may run in parallel.
pub trait Simulator: Sync {
    type Run: SimulationRun + Send;

    fn run(&self, request: &RunRequest) -> anyhow::Result<Option<Self::Run>>;
}

impl<F, R> Simulator for F
where
    F: Fn(&RunRequest) -> anyhow::Result<Option<R>> + Sync,
    R: SimulationRun + Send,
{
    type Run = R;

    fn run(&self, request: &RunRequest) -> anyhow::Result<Option<R>> {
        self(request)
    }
}

/// Plain-data run result, for engine adapters and exported runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub final_value: f64,
    #[serde(default)]
    pub analyzers: BTreeMap<AnalyzerKey, f64>,
    #[serde(default)]
    pub returns: Vec<(NaiveDate, f64)>,
}

impl RunReport {
    pub fn new(final_value: f64) -> Self {
        Self {
            final_value,
            ..Self::default()
        }
    }

    pub fn with_analyzer(mut self, key: AnalyzerKey, value: f64) -> Self {
        self.analyzers.insert(key, value);
        self
    }

    pub fn with_returns(mut self, returns: Vec<(NaiveDate, f64)>) -> Self {
        self.returns = returns;
        self
    }
}

impl SimulationRun for RunReport {
    fn final_value(&self) -> f64 {
        self.final_value
    }

    fn analyzer(&self, key: AnalyzerKey) -> Option<f64> {
        self.analyzers.get(&key).copied()
    }

    fn return_series(&self) -> &[(NaiveDate, f64)] {
        &self.returns
    }
}
