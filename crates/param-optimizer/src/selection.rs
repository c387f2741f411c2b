//! Final parameter selection over evaluated records.
//!
//! Every policy works on a stably re-ranked copy of the records (best first,
//! missing values last) and returns a complete parameter set: any key it
//! could not resolve is taken from the best record of the top subset.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::capabilities::Capabilities;
use crate::error::{OptimizerError, OptimizerResult};
use crate::grid::{
    closest_in_list, coerce_to_axis, grid_distance, grid_for_params, grid_neighbor_indices, params_match,
    snap_params_to_grid,
};
use crate::models::{sort_records, GridSpec, ParamValue, ParameterSet, ResultRecord};

/// Robustness score of a neighbourhood with no spread, per unit of mean.
const FLAT_NEIGHBOURHOOD_SCALE: f64 = 1e6;
const SPREAD_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMethod {
    #[default]
    Best,
    Plateau,
    PlateauFreq,
    PlateauKde,
    Cluster,
    Robust,
}

impl SelectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionMethod::Best => "best",
            SelectionMethod::Plateau => "plateau",
            SelectionMethod::PlateauFreq => "plateau_freq",
            SelectionMethod::PlateauKde => "plateau_kde",
            SelectionMethod::Cluster => "cluster",
            SelectionMethod::Robust => "robust",
        }
    }
}

impl fmt::Display for SelectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionMethod {
    type Err = OptimizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "best" => Ok(SelectionMethod::Best),
            "plateau" => Ok(SelectionMethod::Plateau),
            "plateau_freq" => Ok(SelectionMethod::PlateauFreq),
            "plateau_kde" => Ok(SelectionMethod::PlateauKde),
            "cluster" => Ok(SelectionMethod::Cluster),
            "robust" => Ok(SelectionMethod::Robust),
            other => Err(OptimizerError::UnknownMethod(other.to_string())),
        }
    }
}

/// Tuning for the selection policies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionOptions {
    pub method: SelectionMethod,
    /// Fraction of ranked records forming the top subset.
    pub top_pct: f64,
    /// When set, the top subset is every record at least this good.
    pub plateau_threshold: Option<f64>,
    /// Weight of the performance rank in `robust`.
    pub robust_alpha: f64,
    /// Neighbourhood radius in grid steps per dimension.
    pub robust_radius: usize,
    pub n_clusters: usize,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            method: SelectionMethod::Best,
            top_pct: 0.2,
            plateau_threshold: None,
            robust_alpha: 0.7,
            robust_radius: 1,
            n_clusters: 3,
        }
    }
}

impl SelectionOptions {
    pub fn with_method(mut self, method: SelectionMethod) -> Self {
        self.method = method;
        self
    }

    pub fn validate(&self) -> OptimizerResult<()> {
        if !(self.top_pct > 0.0 && self.top_pct <= 1.0) {
            return Err(OptimizerError::InvalidConfig(format!(
                "top_pct must be in (0, 1], got {}",
                self.top_pct
            )));
        }
        if !(0.0..=1.0).contains(&self.robust_alpha) {
            return Err(OptimizerError::InvalidConfig(format!(
                "robust_alpha must be in [0, 1], got {}",
                self.robust_alpha
            )));
        }
        if self.n_clusters == 0 {
            return Err(OptimizerError::InvalidConfig("n_clusters must be positive".to_string()));
        }
        Ok(())
    }
}

/// The chosen parameter set and the value it was evaluated at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub params: ParameterSet,
    pub value: Option<f64>,
    pub method: SelectionMethod,
    /// Policy actually applied when the requested one could not run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fell_back_to: Option<SelectionMethod>,
}

impl Selection {
    fn empty(method: SelectionMethod) -> Self {
        Self {
            params: ParameterSet::new(),
            value: None,
            method,
            fell_back_to: None,
        }
    }
}

/// Outcome of a single policy before value lookup.
struct Choice {
    params: ParameterSet,
    /// Ranked index whose value belongs to `params`, when known.
    index: Option<usize>,
    fell_back_to: Option<SelectionMethod>,
}

impl Choice {
    fn synthesized(params: ParameterSet) -> Self {
        Self {
            params,
            index: None,
            fell_back_to: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct FinalParamSelector {
    capabilities: Capabilities,
}

impl FinalParamSelector {
    pub fn new(capabilities: Capabilities) -> Self {
        Self { capabilities }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Pick one parameter set from `records`.
    ///
    /// `grid` supplies the candidate lists used for snapping and distances;
    /// without it they are rebuilt from the records. Records whose parameter
    /// keys differ from the first record's are rejected.
    pub fn select(
        &self,
        records: &[ResultRecord],
        grid: Option<&GridSpec>,
        options: &SelectionOptions,
        maximize: bool,
    ) -> OptimizerResult<Selection> {
        let Some(first) = records.first() else {
            warn!("No records to select from");
            return Ok(Selection::empty(options.method));
        };
        if let Some(odd) = records.iter().find(|r| !r.params.same_keys(&first.params)) {
            return Err(OptimizerError::MismatchedKeys {
                expected: first.params.sorted_keys(),
                found: odd.params.sorted_keys(),
            });
        }

        let keys: Vec<String> = first.params.keys().map(String::from).collect();
        let mut ranked = records.to_vec();
        sort_records(&mut ranked, maximize);

        let grid = match grid {
            Some(g) => g.clone(),
            None => GridSpec::from_records(&keys, &ranked),
        };
        let top = top_runs(&ranked, options, maximize);
        debug!(
            "Selecting with {} from {} records (top subset {})",
            options.method,
            ranked.len(),
            top.len()
        );

        let choice = match options.method {
            SelectionMethod::Best => Choice {
                params: ranked[0].params.clone(),
                index: Some(0),
                fell_back_to: None,
            },
            SelectionMethod::Plateau => Choice::synthesized(plateau(&top, &keys, &grid)),
            SelectionMethod::PlateauFreq => Choice::synthesized(plateau_freq(&ranked, &top, &keys, &grid)),
            SelectionMethod::PlateauKde => self.plateau_kde(&ranked, &top, &keys, &grid),
            SelectionMethod::Cluster => self.cluster(&top, &keys, &grid, options),
            SelectionMethod::Robust => {
                let index = robust_index(&ranked, &grid, options, maximize);
                Choice {
                    params: ranked[index].params.clone(),
                    index: Some(index),
                    fell_back_to: None,
                }
            }
        };

        let params = complete(choice.params, &keys, top[0]);
        let value = match choice.index {
            Some(i) => ranked[i].value,
            None => lookup_value(&params, &ranked),
        };

        info!(
            "Final params ({}{}): {} value={:?}",
            options.method,
            choice
                .fell_back_to
                .map(|m| format!(" -> {}", m))
                .unwrap_or_default(),
            params,
            value
        );

        Ok(Selection {
            params,
            value,
            method: options.method,
            fell_back_to: choice.fell_back_to,
        })
    }

    fn plateau_kde(
        &self,
        ranked: &[ResultRecord],
        top: &[&ResultRecord],
        keys: &[String],
        grid: &GridSpec,
    ) -> Choice {
        let Some(kde) = self.capabilities.kde.as_ref() else {
            warn!("Density estimation unavailable, using median plateau");
            return Choice {
                params: plateau(top, keys, grid),
                index: None,
                fell_back_to: Some(SelectionMethod::Plateau),
            };
        };

        let mut chosen = ParameterSet::new();
        for key in keys {
            let values = column(top, key);
            if values.is_empty() {
                continue;
            }
            let axis = grid.axis(key).filter(|a| !a.is_empty());
            let resolved = if values.iter().all(|v| v.is_bool()) {
                mode(&values)
            } else {
                let numeric: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
                let all_int = values.iter().all(|v| v.is_int());
                match numeric.len() {
                    0 => mode(&values),
                    1 => snap_number(numeric[0], all_int, axis),
                    _ => {
                        let points: Option<Vec<f64>> =
                            axis.and_then(|a| a.iter().map(ParamValue::as_f64).collect());
                        let peak = points
                            .as_deref()
                            .and_then(|pts| kde.peak(&numeric, pts))
                            .and_then(|i| axis.map(|a| a[i].clone()));
                        match peak {
                            Some(v) => v,
                            None => snap_number(upper_median(numeric), all_int, axis),
                        }
                    }
                }
            };
            chosen.insert(key.clone(), resolved);
        }

        let snapped = complete(snap_params_to_grid(&chosen, grid), keys, top[0]);
        Choice::synthesized(evaluated_or_nearest(snapped, ranked, grid))
    }

    fn cluster(
        &self,
        top: &[&ResultRecord],
        keys: &[String],
        grid: &GridSpec,
        options: &SelectionOptions,
    ) -> Choice {
        let fallback = |reason: &str| {
            debug!("Cluster selection falling back to plateau: {}", reason);
            Choice {
                params: plateau(top, keys, grid),
                index: None,
                fell_back_to: Some(SelectionMethod::Plateau),
            }
        };

        let Some(clusterer) = self.capabilities.clustering.as_ref() else {
            warn!("Clustering unavailable, using median plateau");
            return fallback("no clustering backend");
        };

        let grid_keys: Vec<&String> = keys
            .iter()
            .filter(|k| {
                grid.axis(k)
                    .is_some_and(|a| !a.is_empty() && a.iter().all(ParamValue::is_numeric))
            })
            .collect();
        if grid_keys.is_empty() {
            return fallback("no numeric grid parameters");
        }
        if top.len() < options.n_clusters {
            return fallback("fewer runs than clusters");
        }

        let rows: Option<Vec<Vec<f64>>> = top
            .iter()
            .map(|r| grid_keys.iter().map(|k| r.params.get(k).and_then(ParamValue::as_f64)).collect())
            .collect();
        let Some(rows) = rows else {
            return fallback("non-numeric values on a numeric axis");
        };

        let k = options.n_clusters.min(rows.len());
        let Some(labels) = clusterer.fit(&standardize(&rows), k) else {
            return fallback("clustering failed");
        };

        let mut counts: Vec<(usize, usize)> = Vec::new();
        for label in &labels {
            match counts.iter_mut().find(|(l, _)| l == label) {
                Some(slot) => slot.1 += 1,
                None => counts.push((*label, 1)),
            }
        }
        let mut largest = counts[0];
        for c in &counts[1..] {
            if c.1 > largest.1 {
                largest = *c;
            }
        }

        let members: Vec<&ResultRecord> = top
            .iter()
            .zip(&labels)
            .filter(|(_, l)| **l == largest.0)
            .map(|(r, _)| *r)
            .collect();
        debug!("Largest cluster holds {} of {} runs", members.len(), top.len());

        let mut chosen = ParameterSet::new();
        for key in keys {
            if grid_keys.contains(&key) {
                let values: Vec<f64> = members
                    .iter()
                    .filter_map(|r| r.params.get(key).and_then(ParamValue::as_f64))
                    .collect();
                if values.is_empty() {
                    continue;
                }
                let axis = grid.axis(key).filter(|a| !a.is_empty());
                let all_int = members
                    .iter()
                    .all(|r| r.params.get(key).is_some_and(ParamValue::is_int));
                chosen.insert(key.clone(), snap_number(upper_median(values), all_int, axis));
            } else if let Some(v) = members[0].params.get(key) {
                chosen.insert(key.clone(), v.clone());
            }
        }
        Choice::synthesized(chosen)
    }
}

/// [`FinalParamSelector::select`] with every compiled-in capability.
pub fn select_final_params(
    records: &[ResultRecord],
    grid: Option<&GridSpec>,
    options: &SelectionOptions,
    maximize: bool,
) -> OptimizerResult<Selection> {
    FinalParamSelector::default().select(records, grid, options, maximize)
}

/// Top subset of ranked records.
///
/// With a threshold, every record at least that good (at most, when
/// minimizing); if none qualify, or without a threshold, the first
/// `max(1, floor(n * top_pct))` records.
fn top_runs<'a>(ranked: &'a [ResultRecord], options: &SelectionOptions, maximize: bool) -> Vec<&'a ResultRecord> {
    if let Some(threshold) = options.plateau_threshold {
        let passing: Vec<&ResultRecord> = ranked
            .iter()
            .filter(|r| {
                r.finite_value()
                    .is_some_and(|v| if maximize { v >= threshold } else { v <= threshold })
            })
            .collect();
        if !passing.is_empty() {
            return passing;
        }
        debug!("No run meets threshold {}, using top_pct", threshold);
    }
    let n = ((ranked.len() as f64 * options.top_pct).floor() as usize).clamp(1, ranked.len());
    ranked[..n].iter().collect()
}

fn column<'a>(records: &[&'a ResultRecord], key: &str) -> Vec<&'a ParamValue> {
    records.iter().filter_map(|r| r.params.get(key)).collect()
}

/// Most frequent value; the earliest one wins ties.
fn mode(values: &[&ParamValue]) -> ParamValue {
    let mut counts: Vec<(&ParamValue, usize)> = Vec::new();
    for v in values {
        match counts.iter_mut().find(|(seen, _)| seen == v) {
            Some(slot) => slot.1 += 1,
            None => counts.push((*v, 1)),
        }
    }
    let mut best: Option<(&ParamValue, usize)> = None;
    for (v, n) in counts {
        if best.map_or(true, |(_, b)| n > b) {
            best = Some((v, n));
        }
    }
    best.map(|(v, _)| v.clone()).unwrap_or(ParamValue::Bool(false))
}

/// `sorted[len / 2]`: the upper median for even lengths.
fn upper_median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    values.get(values.len() / 2).copied().unwrap_or(0.0)
}

/// Nearest axis candidate, or the bare number (integral when every source
/// value was an integer) for keys without candidates.
fn snap_number(x: f64, all_int: bool, axis: Option<&[ParamValue]>) -> ParamValue {
    match axis {
        Some(candidates) => coerce_to_axis(closest_in_list(&ParamValue::Float(x), candidates), candidates),
        None if all_int => ParamValue::Int(x.round() as i64),
        None => ParamValue::Float(x),
    }
}

fn plateau(top: &[&ResultRecord], keys: &[String], grid: &GridSpec) -> ParameterSet {
    let mut chosen = ParameterSet::new();
    for key in keys {
        let values = column(top, key);
        if values.is_empty() {
            continue;
        }
        let resolved = if values.iter().all(|v| v.is_bool()) {
            mode(&values)
        } else {
            let numeric: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
            if numeric.is_empty() {
                mode(&values)
            } else {
                let all_int = values.iter().all(|v| v.is_int());
                let axis = grid.axis(key).filter(|a| !a.is_empty());
                snap_number(upper_median(numeric), all_int, axis)
            }
        };
        chosen.insert(key.clone(), resolved);
    }
    chosen
}

fn plateau_freq(ranked: &[ResultRecord], top: &[&ResultRecord], keys: &[String], grid: &GridSpec) -> ParameterSet {
    let mut chosen = ParameterSet::new();
    for key in keys {
        let values = column(top, key);
        if values.is_empty() {
            continue;
        }
        let mut resolved = mode(&values);
        if let Some(axis) = grid.axis(key).filter(|a| !a.is_empty()) {
            if !axis.contains(&resolved) {
                resolved = coerce_to_axis(closest_in_list(&resolved, axis), axis);
            }
        }
        chosen.insert(key.clone(), resolved);
    }
    let snapped = complete(snap_params_to_grid(&chosen, grid), keys, top[0]);
    evaluated_or_nearest(snapped, ranked, grid)
}

/// `candidate` if some record evaluated it, otherwise the evaluated record
/// closest in grid-index distance (earliest on ties).
fn evaluated_or_nearest(candidate: ParameterSet, ranked: &[ResultRecord], grid: &GridSpec) -> ParameterSet {
    if ranked.iter().any(|r| params_match(&r.params, &candidate)) {
        return candidate;
    }
    let local = grid_for_params(&candidate, grid);
    let mut best: Option<(&ResultRecord, usize)> = None;
    for record in ranked {
        let d = grid_distance(&record.params, &candidate, &local);
        if best.map_or(true, |(_, b)| d < b) {
            best = Some((record, d));
        }
    }
    match best {
        Some((record, d)) => {
            debug!("{} was never evaluated, using nearest run at distance {}", candidate, d);
            record.params.clone()
        }
        None => candidate,
    }
}

/// Every key of the first record, in its order; unresolved keys come from
/// `fallback`.
fn complete(params: ParameterSet, keys: &[String], fallback: &ResultRecord) -> ParameterSet {
    keys.iter()
        .filter_map(|k| {
            params
                .get(k)
                .or_else(|| fallback.params.get(k))
                .map(|v| (k.clone(), v.clone()))
        })
        .collect()
}

/// Value of the first ranked record matching `params`, else the best value.
fn lookup_value(params: &ParameterSet, ranked: &[ResultRecord]) -> Option<f64> {
    ranked
        .iter()
        .find(|r| params_match(&r.params, params))
        .or_else(|| ranked.first())
        .and_then(|r| r.value)
}

/// Per-column mean and population std scaling; constant columns divide by 1.
fn standardize(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };
    let n = rows.len() as f64;
    let dims = first.len();
    let stats: Vec<(f64, f64)> = (0..dims)
        .map(|d| {
            let mean = rows.iter().map(|r| r[d]).sum::<f64>() / n;
            let std = (rows.iter().map(|r| (r[d] - mean).powi(2)).sum::<f64>() / n).sqrt();
            (mean, if std > 0.0 { std } else { 1.0 })
        })
        .collect();
    rows.iter()
        .map(|r| r.iter().zip(&stats).map(|(x, (mean, std))| (x - mean) / std).collect())
        .collect()
}

/// Mean over standard deviation of the metric values of `records[index]`'s
/// grid neighbourhood (itself included).
///
/// Neighbours lie within `radius * dimensions` grid steps. A flat
/// neighbourhood scores `mean * 1e6`; a neighbourhood with no values
/// scores 0.
pub fn compute_robustness_score(index: usize, records: &[ResultRecord], grid: &GridSpec, radius: usize) -> f64 {
    let Some(center) = records.get(index) else {
        return 0.0;
    };
    let values: Vec<f64> = grid_neighbor_indices(&center.params, records.iter().map(|r| &r.params), grid, radius)
        .into_iter()
        .filter_map(|i| records[i].finite_value())
        .collect();
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    if std < SPREAD_EPSILON {
        mean * FLAT_NEIGHBOURHOOD_SCALE
    } else {
        mean / (std + SPREAD_EPSILON)
    }
}

/// Rank positions where the worst value gets 0 and the best `n - 1`; ties
/// share their average rank and missing values are worst.
fn goodness_ranks(values: &[Option<f64>]) -> Vec<f64> {
    let cmp = |a: Option<f64>, b: Option<f64>| match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    };
    let values: Vec<Option<f64>> = values.iter().map(|v| v.filter(|x| x.is_finite())).collect();
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| cmp(values[a], values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && cmp(values[order[end + 1]], values[order[start]]) == Ordering::Equal {
            end += 1;
        }
        let shared = (start + end) as f64 / 2.0;
        for &i in &order[start..=end] {
            ranks[i] = shared;
        }
        start = end + 1;
    }
    ranks
}

/// Index into `ranked` with the best blend of performance rank and
/// robustness rank. Robustness is scored on direction-adjusted values so
/// that larger is better for minimized metrics too.
fn robust_index(ranked: &[ResultRecord], grid: &GridSpec, options: &SelectionOptions, maximize: bool) -> usize {
    let oriented: Vec<ResultRecord> = ranked
        .iter()
        .map(|r| {
            let mut o = r.clone();
            o.value = r.finite_value().map(|v| if maximize { v } else { -v });
            o
        })
        .collect();

    let perf = goodness_ranks(&oriented.iter().map(|r| r.value).collect::<Vec<_>>());
    let robustness: Vec<Option<f64>> = (0..oriented.len())
        .map(|i| Some(compute_robustness_score(i, &oriented, grid, options.robust_radius)))
        .collect();
    let robust = goodness_ranks(&robustness);

    let alpha = options.robust_alpha;
    let mut best = (0, f64::NEG_INFINITY);
    for (i, (p, r)) in perf.iter().zip(&robust).enumerate() {
        let combined = alpha * p + (1.0 - alpha) * r;
        if combined > best.1 {
            best = (i, combined);
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_goodness_ranks_ties_and_missing() {
        let ranks = goodness_ranks(&[Some(1.0), None, Some(3.0), Some(1.0), Some(f64::NAN)]);
        // NaN counts as missing: two missing share ranks 0 and 1
        assert_eq!(ranks, vec![2.5, 0.5, 4.0, 2.5, 0.5]);
    }

    #[test]
    fn test_mode_first_occurrence() {
        let a = ParamValue::Int(1);
        let b = ParamValue::Int(2);
        assert_eq!(mode(&[&b, &a, &a, &b]), b);
        assert_eq!(mode(&[&a, &b, &b]), b);
    }

    #[test]
    fn test_upper_median() {
        assert_eq!(upper_median(vec![20.0, 10.0, 14.0]), 14.0);
        assert_eq!(upper_median(vec![4.0, 1.0, 3.0, 2.0]), 3.0);
    }

    #[test]
    fn test_snap_number_without_axis() {
        assert_eq!(snap_number(14.0, true, None), ParamValue::Int(14));
        assert_eq!(snap_number(0.5, false, None), ParamValue::Float(0.5));
        let axis = [ParamValue::Int(10), ParamValue::Int(20)];
        assert_eq!(snap_number(16.0, false, Some(&axis)), ParamValue::Int(20));
    }

    #[test]
    fn test_standardize_constant_column() {
        let out = standardize(&[vec![1.0, 5.0], vec![3.0, 5.0]]);
        assert_relative_eq!(out[0][0], -1.0);
        assert_relative_eq!(out[1][0], 1.0);
        assert_relative_eq!(out[0][1], 0.0);
    }

    #[test]
    fn test_method_names() {
        assert_eq!("PLATEAU_KDE".parse::<SelectionMethod>().unwrap(), SelectionMethod::PlateauKde);
        assert!(matches!(
            "median".parse::<SelectionMethod>(),
            Err(OptimizerError::UnknownMethod(_))
        ));
        let json = serde_json::to_string(&SelectionMethod::PlateauFreq).unwrap();
        assert_eq!(json, "\"plateau_freq\"");
    }

    #[test]
    fn test_options_validation() {
        assert!(SelectionOptions::default().validate().is_ok());
        let bad_pct = SelectionOptions {
            top_pct: 0.0,
            ..SelectionOptions::default()
        };
        assert!(bad_pct.validate().is_err());
        let bad_alpha = SelectionOptions {
            robust_alpha: 1.5,
            ..SelectionOptions::default()
        };
        assert!(bad_alpha.validate().is_err());
    }
}
