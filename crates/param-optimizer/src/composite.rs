use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::metrics::Metric;
use crate::models::ResultRecord;

/// Score assigned to a missing metric, and to a metric with no spread.
const NEUTRAL: f64 = 0.5;

/// Blend each record's raw metric vector into one ranking score.
///
/// For every weighted metric the values are min-max normalised across all
/// records; lower-is-better metrics are inverted; missing values score 0.5.
/// The weighted sum replaces `value`, and the result is sorted best first
/// with ties in input order. Weight names are matched case-insensitively;
/// zero weights are ignored.
pub fn compute_composite_score(
    records: &[ResultRecord],
    weights: &BTreeMap<String, f64>,
) -> Vec<ResultRecord> {
    if records.is_empty() || weights.is_empty() {
        return Vec::new();
    }

    let scores = composite_scores(records, weights);
    let mut out: Vec<ResultRecord> = records
        .iter()
        .cloned()
        .zip(scores)
        .map(|(mut r, s)| {
            r.value = Some(s);
            r
        })
        .collect();
    out.sort_by(|a, b| {
        b.value
            .unwrap_or(f64::NEG_INFINITY)
            .partial_cmp(&a.value.unwrap_or(f64::NEG_INFINITY))
            .unwrap_or(Ordering::Equal)
    });
    out
}

/// Composite score per record, in input order.
pub(crate) fn composite_scores(records: &[ResultRecord], weights: &BTreeMap<String, f64>) -> Vec<f64> {
    let weights: BTreeMap<String, f64> = weights
        .iter()
        .filter(|(_, w)| **w != 0.0)
        .map(|(k, w)| (k.trim().to_lowercase(), *w))
        .collect();

    let column = |key: &str| -> Vec<Option<f64>> {
        records
            .iter()
            .map(|r| {
                r.metrics
                    .as_ref()
                    .and_then(|m| m.get(key).copied().flatten())
                    .filter(|v| v.is_finite())
            })
            .collect()
    };

    let mut scores = vec![0.0; records.len()];
    for (key, weight) in &weights {
        let values = column(key);
        let lower_is_better = key.parse::<Metric>().is_ok_and(|m| m.lower_is_better());

        let bounds = values.iter().flatten().fold(None, |acc: Option<(f64, f64)>, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        });

        for (score, value) in scores.iter_mut().zip(&values) {
            let norm = match (value, bounds) {
                (Some(v), Some((lo, hi))) if hi > lo => {
                    let n = (v - lo) / (hi - lo);
                    if lower_is_better {
                        1.0 - n
                    } else {
                        n
                    }
                }
                _ => NEUTRAL,
            };
            *score += weight * norm;
        }
    }
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MetricVector, ParameterSet};
    use approx::assert_relative_eq;

    fn record(id: i64, sharpe: Option<f64>, drawdown: Option<f64>) -> ResultRecord {
        let mut m = MetricVector::new();
        m.insert("sharperatio".into(), sharpe);
        m.insert("drawdown".into(), drawdown);
        ResultRecord::new(ParameterSet::new().with("id", id), None).with_metrics(m)
    }

    fn weights(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn id(r: &ResultRecord) -> i64 {
        match r.params.get("id") {
            Some(crate::models::ParamValue::Int(i)) => *i,
            _ => -1,
        }
    }

    #[test]
    fn test_drawdown_inverted() {
        let records = vec![
            record(0, Some(1.0), Some(30.0)),
            record(1, Some(2.0), Some(10.0)),
            record(2, Some(1.5), Some(20.0)),
        ];
        let out = compute_composite_score(&records, &weights(&[("SharpeRatio", 0.5), ("drawdown", 0.5)]));

        assert_eq!(out.iter().map(id).collect::<Vec<_>>(), vec![1, 2, 0]);
        assert_relative_eq!(out[0].value.unwrap(), 1.0);
        assert_relative_eq!(out[1].value.unwrap(), 0.5);
        assert_relative_eq!(out[2].value.unwrap(), 0.0);
    }

    #[test]
    fn test_missing_values_neutral() {
        let records = vec![
            record(0, Some(1.0), None),
            record(1, None, None),
            record(2, Some(3.0), None),
        ];
        let out = compute_composite_score(&records, &weights(&[("sharperatio", 1.0), ("drawdown", 1.0)]));
        let by_id: BTreeMap<i64, f64> = out.iter().map(|r| (id(r), r.value.unwrap())).collect();
        assert_relative_eq!(by_id[&0], 0.0 + 0.5);
        assert_relative_eq!(by_id[&1], 0.5 + 0.5);
        assert_relative_eq!(by_id[&2], 1.0 + 0.5);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let records = vec![
            record(0, Some(1.0), Some(5.0)),
            record(1, Some(1.0), Some(5.0)),
            record(2, Some(1.0), Some(5.0)),
        ];
        let out = compute_composite_score(&records, &weights(&[("sharperatio", 1.0)]));
        assert_eq!(out.iter().map(id).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(out.iter().all(|r| r.value == Some(0.5)));
    }

    #[test]
    fn test_degenerate_weights() {
        let records = vec![record(0, Some(1.0), Some(5.0))];
        assert!(compute_composite_score(&records, &BTreeMap::new()).is_empty());
        assert!(compute_composite_score(&[], &weights(&[("sharperatio", 1.0)])).is_empty());

        let zeroed = compute_composite_score(&records, &weights(&[("sharperatio", 0.0)]));
        assert_eq!(zeroed.len(), 1);
        assert_eq!(zeroed[0].value, Some(0.0));
    }
}
