use crate::error::OptimizerResult;
use crate::models::{GridPoints, GridSpec, ParamValue, ParameterSet};

const MATCH_TOLERANCE: f64 = 1e-9;

/// Every point of `grid`, lazily, last axis varying fastest.
///
/// An empty grid (or an axis without candidates) is a configuration error.
pub fn expand_param_grid(grid: &GridSpec) -> OptimizerResult<GridPoints<'_>> {
    grid.validate()?;
    Ok(grid.points())
}

/// Nearest candidate to `value`.
///
/// An exactly equal candidate always wins. Otherwise numeric values pick the
/// candidate with the smallest absolute difference (first one on ties); a
/// value that cannot be compared numerically gets the first candidate. With
/// no candidates the value is returned unchanged.
pub fn closest_in_list(value: &ParamValue, candidates: &[ParamValue]) -> ParamValue {
    if candidates.is_empty() {
        return value.clone();
    }
    if let Some(exact) = candidates.iter().find(|c| *c == value) {
        return exact.clone();
    }
    nearest_index(value, candidates)
        .map(|i| candidates[i].clone())
        .unwrap_or_else(|| candidates[0].clone())
}

fn nearest_index(value: &ParamValue, candidates: &[ParamValue]) -> Option<usize> {
    let target = value.as_f64()?;
    let mut best: Option<(usize, f64)> = None;
    for (i, c) in candidates.iter().enumerate() {
        let Some(x) = c.as_f64() else {
            return None;
        };
        let dist = (x - target).abs();
        match best {
            Some((_, d)) if dist >= d => {}
            _ => best = Some((i, dist)),
        }
    }
    best.map(|(i, _)| i)
}

fn values_match(a: &ParamValue, b: &ParamValue) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => (x - y).abs() <= MATCH_TOLERANCE,
        _ => a == b,
    }
}

/// Same key set, numeric values within 1e-9, everything else exactly equal.
pub fn params_match(a: &ParameterSet, b: &ParameterSet) -> bool {
    if !a.same_keys(b) {
        return false;
    }
    a.iter().all(|(k, va)| b.get(k).is_some_and(|vb| values_match(va, vb)))
}

/// Replace every value whose key has grid candidates with the nearest one.
///
/// Keys without candidates pass through. When every candidate of a key is an
/// integer the snapped value is an integer too.
pub fn snap_params_to_grid(params: &ParameterSet, grid: &GridSpec) -> ParameterSet {
    params
        .iter()
        .map(|(k, v)| {
            let snapped = match grid.axis(k) {
                Some(candidates) if !candidates.is_empty() => {
                    coerce_to_axis(closest_in_list(v, candidates), candidates)
                }
                _ => v.clone(),
            };
            (k.to_string(), snapped)
        })
        .collect()
}

/// Integer axes keep integer values.
pub(crate) fn coerce_to_axis(value: ParamValue, candidates: &[ParamValue]) -> ParamValue {
    if candidates.iter().all(ParamValue::is_int) {
        if let ParamValue::Float(f) = value {
            return ParamValue::Int(f.round() as i64);
        }
    }
    value
}

/// Position of the nearest grid value: exact match first, then numeric
/// nearest. Non-numeric values with no match, and empty lists, give 0.
pub fn grid_param_index(value: &ParamValue, grid_list: &[ParamValue]) -> usize {
    if grid_list.is_empty() {
        return 0;
    }
    if let Some(i) = grid_list.iter().position(|c| values_match(c, value)) {
        return i;
    }
    nearest_index(value, grid_list).unwrap_or(0)
}

/// Per-axis grid indices of `params`, in grid axis order.
///
/// Keys missing from `params` map to index 0.
pub fn grid_indices(params: &ParameterSet, grid: &GridSpec) -> Vec<usize> {
    grid.axes()
        .filter(|(_, values)| !values.is_empty())
        .map(|(name, values)| {
            params
                .get(name)
                .map(|v| grid_param_index(v, values))
                .unwrap_or(0)
        })
        .collect()
}

/// Manhattan distance between two points in grid-index space.
pub fn grid_distance(a: &ParameterSet, b: &ParameterSet, grid: &GridSpec) -> usize {
    grid_indices(a, grid)
        .into_iter()
        .zip(grid_indices(b, grid))
        .map(|(x, y)| x.abs_diff(y))
        .sum()
}

/// Grid restricted to the keys present in `params` that have candidates.
pub fn grid_for_params(params: &ParameterSet, grid: &GridSpec) -> GridSpec {
    let mut out = GridSpec::new();
    for key in params.keys() {
        if let Some(values) = grid.axis(key) {
            if !values.is_empty() {
                out.insert(key, values.to_vec());
            }
        }
    }
    out
}

/// Indices of `points` within `radius * dimensions` grid steps of `center`.
///
/// With no grid dimensions every point is a neighbour.
pub fn grid_neighbor_indices<'a, I>(
    center: &ParameterSet,
    points: I,
    grid: &GridSpec,
    radius: usize,
) -> Vec<usize>
where
    I: IntoIterator<Item = &'a ParameterSet>,
{
    let local = grid_for_params(center, grid);
    let reach = radius * local.dimensions();
    let origin = grid_indices(center, &local);

    points
        .into_iter()
        .enumerate()
        .filter(|(_, p)| {
            if local.dimensions() == 0 {
                return true;
            }
            let dist: usize = grid_indices(p, &local)
                .into_iter()
                .zip(&origin)
                .map(|(x, &y)| x.abs_diff(y))
                .sum();
            dist <= reach
        })
        .map(|(i, _)| i)
        .collect()
}
