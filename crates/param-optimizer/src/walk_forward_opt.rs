use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{OptimizerError, OptimizerResult};
use crate::grid::expand_param_grid;
use crate::metrics::{extract_metric, Metric};
use crate::models::{sort_records, GridSpec, ParameterSet, ResultRecord, RunWindow, WalkForwardWindow};
use crate::simulation::{RunRequest, Simulator};

/// Sliding train/test scheme over a calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkForwardSpec {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub train_days: u32,
    pub test_days: u32,
}

impl WalkForwardSpec {
    pub fn validate(&self) -> OptimizerResult<()> {
        if self.train_days == 0 || self.test_days == 0 {
            return Err(OptimizerError::InvalidConfig(
                "walk_forward train_days and test_days must be positive".to_string(),
            ));
        }
        if self.from_date >= self.to_date {
            return Err(OptimizerError::InvalidConfig(format!(
                "walk_forward from_date {} must precede to_date {}",
                self.from_date, self.to_date
            )));
        }
        Ok(())
    }

    pub fn windows(&self) -> Vec<WalkForwardWindow> {
        walk_forward_windows(self.from_date, self.to_date, self.train_days, self.test_days)
    }
}

/// Train `[cur, cur+train)` then test `[cur+train, cur+train+test)`, sliding
/// by `test_days` while the pair still ends on or before `to`.
pub fn walk_forward_windows(
    from: NaiveDate,
    to: NaiveDate,
    train_days: u32,
    test_days: u32,
) -> Vec<WalkForwardWindow> {
    if train_days == 0 || test_days == 0 {
        return Vec::new();
    }
    let train = Duration::days(train_days as i64);
    let test = Duration::days(test_days as i64);

    let mut windows = Vec::new();
    let mut cur = from;
    while cur + train + test <= to {
        let split = cur + train;
        windows.push(WalkForwardWindow {
            train: RunWindow::new(cur, split),
            test: RunWindow::new(split, split + test),
        });
        cur += test;
    }
    windows
}

/// Records of a walk-forward pass, best mean first.
#[derive(Debug, Clone, Default)]
pub struct WalkForwardOutcome {
    pub records: Vec<ResultRecord>,
    pub windows: Vec<WalkForwardWindow>,
}

impl WalkForwardOutcome {
    pub fn best(&self) -> Option<&ResultRecord> {
        self.records.first()
    }
}

/// Test-window metric for one parameter set, or `None` when the window was
/// skipped (no run could be built, a run failed, or the metric is missing).
fn window_metric<S: Simulator>(
    simulator: &S,
    params: &ParameterSet,
    window: &WalkForwardWindow,
    metric: Metric,
) -> Option<f64> {
    match simulator.run(&RunRequest::windowed(params.clone(), window.train)) {
        Ok(Some(_)) => {}
        Ok(None) => {
            debug!("No train run for {} in {}", params, window.train);
            return None;
        }
        Err(e) => {
            warn!("Train run failed for {} in {}: {:#}", params, window.train, e);
            return None;
        }
    }

    test_metric(simulator, params, window, metric)
}

/// Metric of a single run over the test segment only.
fn test_metric<S: Simulator>(
    simulator: &S,
    params: &ParameterSet,
    window: &WalkForwardWindow,
    metric: Metric,
) -> Option<f64> {
    match simulator.run(&RunRequest::windowed(params.clone(), window.test)) {
        Ok(Some(run)) => extract_metric(&run, metric),
        Ok(None) => {
            debug!("No test run for {} in {}", params, window.test);
            None
        }
        Err(e) => {
            warn!("Test run failed for {} in {}: {:#}", params, window.test, e);
            None
        }
    }
}

/// Evaluate every grid point on every window and rank by mean test metric.
///
/// A point with no valid test window yields no record.
pub fn walk_forward_analysis<S: Simulator>(
    simulator: &S,
    grid: &GridSpec,
    fixed: &ParameterSet,
    spec: &WalkForwardSpec,
    metric: Metric,
    maximize: bool,
) -> OptimizerResult<WalkForwardOutcome> {
    spec.validate()?;
    let points: Vec<ParameterSet> = expand_param_grid(grid)?.map(|p| fixed.merged(&p)).collect();
    let windows = spec.windows();

    info!(
        "Walk-forward: {} parameter sets x {} windows ({}d train / {}d test)",
        points.len(),
        windows.len(),
        spec.train_days,
        spec.test_days
    );

    let mut records: Vec<ResultRecord> = points
        .par_iter()
        .filter_map(|params| {
            let window_metrics: Vec<f64> = windows
                .iter()
                .filter_map(|w| window_metric(simulator, params, w, metric))
                .collect();
            if window_metrics.is_empty() {
                return None;
            }
            let mean = window_metrics.iter().sum::<f64>() / window_metrics.len() as f64;
            let mut record = ResultRecord::new(params.clone(), Some(mean));
            record.window_metrics = window_metrics;
            Some(record)
        })
        .collect();

    sort_records(&mut records, maximize);
    if let Some(best) = records.first() {
        info!("Walk-forward best: {} mean {}={:?}", best.params, metric, best.value);
    } else {
        warn!("Walk-forward produced no valid parameter sets");
    }

    Ok(WalkForwardOutcome { records, windows })
}

/// Test metric of one selected parameter set in one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowMetric {
    pub test_start: NaiveDate,
    pub test_end: NaiveDate,
    pub value: f64,
}

/// Out-of-sample summary. `mean` and `std` are `None` when no window produced
/// a metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub per_window: Vec<WindowMetric>,
}

/// Replay `params` over the test segment of every walk-forward window, for
/// reporting only. Train segments are not run.
pub fn validate_parameter_selection<S: Simulator>(
    simulator: &S,
    params: &ParameterSet,
    spec: &WalkForwardSpec,
    metric: Metric,
) -> OptimizerResult<ValidationReport> {
    spec.validate()?;
    let per_window: Vec<WindowMetric> = spec
        .windows()
        .iter()
        .filter_map(|w| {
            test_metric(simulator, params, w, metric).map(|value| WindowMetric {
                test_start: w.test.start,
                test_end: w.test.end,
                value,
            })
        })
        .collect();

    if per_window.is_empty() {
        warn!("Out-of-sample validation of {} produced no windows", params);
        return Ok(ValidationReport::default());
    }

    let n = per_window.len() as f64;
    let mean = per_window.iter().map(|w| w.value).sum::<f64>() / n;
    let var = per_window.iter().map(|w| (w.value - mean).powi(2)).sum::<f64>() / n;
    info!(
        "Out-of-sample {}: mean {:.4}, std {:.4} over {} windows",
        metric,
        mean,
        var.sqrt(),
        per_window.len()
    );

    Ok(ValidationReport {
        mean: Some(mean),
        std: Some(var.sqrt()),
        per_window,
    })
}
