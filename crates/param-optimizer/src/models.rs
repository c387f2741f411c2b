use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{OptimizerError, OptimizerResult};

/// A single strategy parameter value.
///
/// `Int` and `Float` are numeric and compare with tolerance; `Bool` and
/// `Text` are categorical and only match exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            ParamValue::Bool(_) | ParamValue::Text(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ParamValue::Int(_) | ParamValue::Float(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, ParamValue::Int(_))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, ParamValue::Bool(_))
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

/// Parameter name to value, in insertion order.
///
/// Serialized as a JSON object; key order is kept on both sides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    entries: Vec<(String, ParamValue)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Insert or replace; a replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `self` overlaid with `overrides`.
    pub fn merged(&self, overrides: &ParameterSet) -> ParameterSet {
        let mut out = self.clone();
        for (k, v) in overrides.iter() {
            out.insert(k, v.clone());
        }
        out
    }

    /// Same key set, ignoring order.
    pub fn same_keys(&self, other: &ParameterSet) -> bool {
        self.len() == other.len() && self.keys().all(|k| other.contains_key(k))
    }

    pub fn sorted_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.keys().map(str::to_string).collect();
        keys.sort();
        keys
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", k, v)?;
        }
        f.write_str("}")
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = ParameterSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

impl Serialize for ParameterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ParameterSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = deserializer.deserialize_map(OrderedMapVisitor::<ParamValue>::new())?;
        Ok(entries.into_iter().collect())
    }
}

struct OrderedMapVisitor<V> {
    marker: std::marker::PhantomData<V>,
}

impl<V> OrderedMapVisitor<V> {
    fn new() -> Self {
        Self {
            marker: std::marker::PhantomData,
        }
    }
}

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = Vec<(String, V)>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map keyed by parameter name")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((k, v)) = access.next_entry::<String, V>()? {
            entries.push((k, v));
        }
        Ok(entries)
    }
}

/// Search space: parameter name to ordered candidate values, in declared order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridSpec {
    axes: Vec<(String, Vec<ParamValue>)>,
}

impl GridSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an axis.
    pub fn with_axis<V: Into<ParamValue>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.insert(name, values.into_iter().map(Into::into).collect());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<ParamValue>) {
        let name = name.into();
        match self.axes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = values,
            None => self.axes.push((name, values)),
        }
    }

    pub fn axis(&self, name: &str) -> Option<&[ParamValue]> {
        self.axes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.axes.iter().map(|(k, _)| k.as_str())
    }

    pub fn axes(&self) -> impl Iterator<Item = (&str, &[ParamValue])> {
        self.axes.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn dimensions(&self) -> usize {
        self.axes.len()
    }

    /// Number of grid points (product of axis lengths; 0 for an empty grid).
    /// A product that does not fit in `usize` is [`OptimizerError::GridTooLarge`].
    pub fn len(&self) -> OptimizerResult<usize> {
        if self.is_empty() {
            return Ok(0);
        }
        self.axes
            .iter()
            .try_fold(1usize, |acc, (_, v)| acc.checked_mul(v.len()))
            .ok_or(OptimizerError::GridTooLarge)
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty() || self.axes.iter().any(|(_, v)| v.is_empty())
    }

    /// Reject grids that would enumerate nothing.
    pub fn validate(&self) -> OptimizerResult<()> {
        if self.axes.is_empty() {
            return Err(OptimizerError::EmptyGrid);
        }
        if let Some((name, _)) = self.axes.iter().find(|(_, v)| v.is_empty()) {
            return Err(OptimizerError::EmptyCandidates(name.clone()));
        }
        self.len().map(|_| ())
    }

    /// Lazy Cartesian product; the last axis varies fastest.
    pub fn points(&self) -> GridPoints<'_> {
        GridPoints {
            grid: self,
            cursor: vec![0; self.axes.len()],
            done: self.is_empty(),
        }
    }

    /// Rebuild candidate lists from evaluated records.
    ///
    /// Distinct values per key in first-seen order, sorted ascending when
    /// every value of the key is numeric.
    pub fn from_records(keys: &[String], records: &[ResultRecord]) -> GridSpec {
        let mut grid = GridSpec::new();
        for key in keys {
            let mut values: Vec<ParamValue> = Vec::new();
            for record in records {
                if let Some(v) = record.params.get(key) {
                    if !values.contains(v) {
                        values.push(v.clone());
                    }
                }
            }
            if !values.is_empty() && values.iter().all(ParamValue::is_numeric) {
                values.sort_by(|a, b| {
                    let (x, y) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
                    x.partial_cmp(&y).unwrap_or(Ordering::Equal)
                });
                values.dedup_by(|a, b| match (a.as_f64(), b.as_f64()) {
                    (Some(x), Some(y)) => (x - y).abs() <= 1e-9,
                    _ => false,
                });
            }
            grid.insert(key.clone(), values);
        }
        grid
    }
}

impl Serialize for GridSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.axes.len()))?;
        for (k, v) in &self.axes {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for GridSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = deserializer.deserialize_map(OrderedMapVisitor::<Vec<ParamValue>>::new())?;
        let mut grid = GridSpec::new();
        for (k, v) in entries {
            grid.insert(k, v);
        }
        Ok(grid)
    }
}

/// Iterator over every point of a [`GridSpec`].
pub struct GridPoints<'a> {
    grid: &'a GridSpec,
    cursor: Vec<usize>,
    done: bool,
}

impl Iterator for GridPoints<'_> {
    type Item = ParameterSet;

    fn next(&mut self) -> Option<ParameterSet> {
        if self.done {
            return None;
        }
        let point: ParameterSet = self
            .grid
            .axes
            .iter()
            .zip(&self.cursor)
            .map(|((name, values), &i)| (name.clone(), values[i].clone()))
            .collect();

        // advance the odometer, last axis first
        let mut axis = self.cursor.len();
        loop {
            if axis == 0 {
                self.done = true;
                break;
            }
            axis -= 1;
            self.cursor[axis] += 1;
            if self.cursor[axis] < self.grid.axes[axis].1.len() {
                break;
            }
            self.cursor[axis] = 0;
        }

        Some(point)
    }
}

/// Raw metric values keyed by lowercase metric name.
pub type MetricVector = BTreeMap<String, Option<f64>>;

/// What a run produced for the optimization objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Scalar(Option<f64>),
    Vector(MetricVector),
}

/// One evaluated parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub params: ParameterSet,
    /// Ranking value. `None` when the run failed or the metric was unavailable.
    pub value: Option<f64>,
    /// Raw metric vector for composite objectives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricVector>,
    /// Per-window test metrics, in window order (walk-forward only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub window_metrics: Vec<f64>,
}

impl ResultRecord {
    pub fn new(params: ParameterSet, value: Option<f64>) -> Self {
        Self {
            params,
            value,
            metrics: None,
            window_metrics: Vec::new(),
        }
    }

    pub fn with_metrics(mut self, metrics: MetricVector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Finite ranking value; NaN and infinities count as missing.
    pub fn finite_value(&self) -> Option<f64> {
        self.value.filter(|v| v.is_finite())
    }
}

/// Ordering for ranking values: better first, missing always last.
pub fn compare_values(a: Option<f64>, b: Option<f64>, maximize: bool) -> Ordering {
    let a = a.filter(|v| v.is_finite());
    let b = b.filter(|v| v.is_finite());
    match (a, b) {
        (Some(x), Some(y)) => {
            let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
            if maximize {
                ord.reverse()
            } else {
                ord
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort, best first. Ties keep their current order.
pub fn sort_records(records: &mut [ResultRecord], maximize: bool) {
    records.sort_by(|a, b| compare_values(a.value, b.value, maximize));
}

/// Inclusive-start, exclusive-end calendar window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl RunWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl fmt::Display for RunWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.start, self.end)
    }
}

/// A train segment followed immediately by its test segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkForwardWindow {
    pub train: RunWindow,
    pub test: RunWindow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_value_untagged_json() {
        let v: Vec<ParamValue> = serde_json::from_str(r#"[true, 14, 0.02, 14.0, "fast"]"#).unwrap();
        assert_eq!(
            v,
            vec![
                ParamValue::Bool(true),
                ParamValue::Int(14),
                ParamValue::Float(0.02),
                ParamValue::Float(14.0),
                ParamValue::Text("fast".into()),
            ]
        );
    }

    #[test]
    fn test_parameter_set_keeps_order() {
        let p: ParameterSet = serde_json::from_str(r#"{"zeta": 1, "alpha": 2.5}"#).unwrap();
        assert_eq!(p.keys().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
        assert_eq!(serde_json::to_string(&p).unwrap(), r#"{"zeta":1,"alpha":2.5}"#);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut p = ParameterSet::new().with("a", 1).with("b", 2);
        p.insert("a", 5);
        assert_eq!(p.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(p.get("a"), Some(&ParamValue::Int(5)));
    }

    #[test]
    fn test_grid_points_last_axis_fastest() {
        let grid = GridSpec::new()
            .with_axis("atr_period", [10, 14])
            .with_axis("risk", [0.02, 0.03]);
        let points: Vec<String> = grid.points().map(|p| p.to_string()).collect();
        assert_eq!(
            points,
            vec![
                "{atr_period: 10, risk: 0.02}",
                "{atr_period: 10, risk: 0.03}",
                "{atr_period: 14, risk: 0.02}",
                "{atr_period: 14, risk: 0.03}",
            ]
        );
        assert_eq!(grid.len().unwrap(), 4);
    }

    #[test]
    fn test_grid_with_empty_axis_yields_nothing() {
        let grid = GridSpec::new().with_axis("a", [1, 2]).with_axis("b", Vec::<i64>::new());
        assert_eq!(grid.points().count(), 0);
        assert!(matches!(grid.validate(), Err(OptimizerError::EmptyCandidates(ref n)) if n == "b"));
        assert!(matches!(GridSpec::new().validate(), Err(OptimizerError::EmptyGrid)));
        assert_eq!(grid.len().unwrap(), 0);
    }

    #[test]
    fn test_oversized_grid_rejected() {
        let grid = (0..70).fold(GridSpec::new(), |g, i| g.with_axis(format!("p{}", i), [0, 1]));
        assert!(matches!(grid.len(), Err(OptimizerError::GridTooLarge)));
        assert!(matches!(grid.validate(), Err(OptimizerError::GridTooLarge)));
        assert!(matches!(crate::grid::expand_param_grid(&grid), Err(OptimizerError::GridTooLarge)));
    }

    #[test]
    fn test_none_sorts_last_both_directions() {
        let mut records = vec![
            ResultRecord::new(ParameterSet::new().with("a", 1), None),
            ResultRecord::new(ParameterSet::new().with("a", 2), Some(0.5)),
            ResultRecord::new(ParameterSet::new().with("a", 3), Some(-1.0)),
        ];
        sort_records(&mut records, true);
        assert_eq!(records[0].value, Some(0.5));
        assert_eq!(records[2].value, None);

        sort_records(&mut records, false);
        assert_eq!(records[0].value, Some(-1.0));
        assert_eq!(records[2].value, None);
    }

    #[test]
    fn test_rebuild_candidates_from_records() {
        let records = vec![
            ResultRecord::new(ParameterSet::new().with("p", 20).with("flag", true), Some(1.0)),
            ResultRecord::new(ParameterSet::new().with("p", 10).with("flag", false), Some(1.0)),
            ResultRecord::new(ParameterSet::new().with("p", 20).with("flag", true), Some(1.0)),
        ];
        let grid = GridSpec::from_records(&["p".to_string(), "flag".to_string()], &records);
        assert_eq!(grid.axis("p").unwrap(), &[ParamValue::Int(10), ParamValue::Int(20)]);
        assert_eq!(
            grid.axis("flag").unwrap(),
            &[ParamValue::Bool(true), ParamValue::Bool(false)]
        );
    }
}
