//! Row reconciliation: merging per-range analytics rows into one row per
//! distinct query, explicit about missing (metric, range) combinations.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::analytics::{MetricKind, QueryStats};
use crate::intent::QueryIntent;
use crate::timerange::TimeRange;

/// One fetched range paired with the rows the analytics source returned
/// for it.
#[derive(Debug, Clone)]
pub struct RangeSample {
    pub range: TimeRange,
    pub rows: Vec<QueryStats>,
}

/// A single metric value, or an explicit marker that the query did not
/// appear in that range's sample. Zero is a valid metric value, so absence
/// is never coerced to it. Serialises untagged: a JSON number or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricCell {
    Value(f64),
    NoData,
}

/// One reconciled report row, keyed by its exact query text.
///
/// `metrics` maps `"{metric}_{range_key}"` to a cell for every metric of
/// every fetched range; a query present in one range and absent in another
/// carries [`MetricCell::NoData`] for the missing combination rather than
/// omitting the entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledRow {
    pub query: String,
    pub metrics: BTreeMap<String, MetricCell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<QueryIntent>,
}

/// Composite cell key for one (metric, range) pair.
pub fn metric_key(metric: MetricKind, range: &TimeRange) -> String {
    format!("{}_{}", metric.key(), range.range_key())
}

/// Merge the per-range samples into one row per distinct query.
///
/// The output query set is the union across all samples; output order is
/// insertion order of first appearance (stable, not sorted), which fixes
/// default row order downstream. Lookup is by exact query-string match: no
/// case or whitespace folding is performed, so differently-cased variants
/// of the same wording stay distinct rows. Callers needing normalization
/// pre-normalize before reconciliation.
pub fn reconcile(samples: &[RangeSample]) -> Vec<ReconciledRow> {
    let mut rows: Vec<ReconciledRow> = Vec::new();
    let mut by_query: HashMap<String, usize> = HashMap::new();

    for sample in samples {
        for stats in &sample.rows {
            if !by_query.contains_key(&stats.query) {
                by_query.insert(stats.query.clone(), rows.len());
                rows.push(ReconciledRow {
                    query: stats.query.clone(),
                    metrics: BTreeMap::new(),
                    intent: None,
                });
            }
        }
    }

    for sample in samples {
        let lookup: HashMap<&str, &QueryStats> = sample
            .rows
            .iter()
            .map(|stats| (stats.query.as_str(), stats))
            .collect();
        for row in &mut rows {
            let stats = lookup.get(row.query.as_str());
            for metric in MetricKind::ALL {
                let cell = match stats {
                    Some(stats) => MetricCell::Value(stats.metric(metric)),
                    None => MetricCell::NoData,
                };
                row.metrics.insert(metric_key(metric, &sample.range), cell);
            }
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timerange::PresetRange;

    fn stats(query: &str, clicks: u64) -> QueryStats {
        QueryStats {
            query: query.to_string(),
            clicks,
            impressions: clicks * 20,
            ctr: 0.05,
            position: 4.0,
        }
    }

    fn last7() -> TimeRange {
        TimeRange::Preset(PresetRange::Last7Days)
    }

    fn january() -> TimeRange {
        TimeRange::Custom {
            start_date: "2024-01-01".to_string(),
            end_date: "2024-01-31".to_string(),
        }
    }

    #[test]
    fn output_is_union_of_query_sets() {
        let rows = reconcile(&[
            RangeSample {
                range: last7(),
                rows: vec![stats("a", 1), stats("b", 2)],
            },
            RangeSample {
                range: january(),
                rows: vec![stats("b", 3), stats("c", 4)],
            },
        ]);
        let queries: Vec<&str> = rows.iter().map(|r| r.query.as_str()).collect();
        assert_eq!(queries, vec!["a", "b", "c"]);
    }

    #[test]
    fn absent_combination_is_explicit_no_data_not_zero() {
        let rows = reconcile(&[
            RangeSample {
                range: last7(),
                rows: vec![stats("present", 0)],
            },
            RangeSample {
                range: january(),
                rows: vec![],
            },
        ]);
        let row = &rows[0];
        // A real zero stays a value...
        assert_eq!(
            row.metrics[&metric_key(MetricKind::Clicks, &last7())],
            MetricCell::Value(0.0)
        );
        // ...while absence from the other range is the marker, and the
        // entry is present in the mapping rather than omitted.
        assert_eq!(
            row.metrics[&metric_key(MetricKind::Clicks, &january())],
            MetricCell::NoData
        );
    }

    #[test]
    fn order_is_first_appearance_across_ranges() {
        let rows = reconcile(&[
            RangeSample {
                range: last7(),
                rows: vec![stats("zebra", 1)],
            },
            RangeSample {
                range: january(),
                rows: vec![stats("apple", 1), stats("zebra", 1)],
            },
        ]);
        let queries: Vec<&str> = rows.iter().map(|r| r.query.as_str()).collect();
        assert_eq!(queries, vec!["zebra", "apple"]);
    }

    #[test]
    fn query_text_is_not_normalised() {
        let rows = reconcile(&[RangeSample {
            range: last7(),
            rows: vec![stats("Shoes", 1), stats("shoes", 2)],
        }]);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn shoes_and_boots_scenario() {
        // last7days has "shoes" only, the custom January range has
        // "shoes" and "boots".
        let rows = reconcile(&[
            RangeSample {
                range: last7(),
                rows: vec![stats("shoes", 10)],
            },
            RangeSample {
                range: january(),
                rows: vec![stats("shoes", 40), stats("boots", 5)],
            },
        ]);
        assert_eq!(rows.len(), 2);

        let shoes = &rows[0];
        assert_eq!(shoes.query, "shoes");
        assert_eq!(
            shoes.metrics[&metric_key(MetricKind::Clicks, &last7())],
            MetricCell::Value(10.0)
        );
        assert_eq!(
            shoes.metrics[&metric_key(MetricKind::Clicks, &january())],
            MetricCell::Value(40.0)
        );

        let boots = &rows[1];
        assert_eq!(boots.query, "boots");
        assert_eq!(
            boots.metrics[&metric_key(MetricKind::Clicks, &last7())],
            MetricCell::NoData
        );
        assert_eq!(
            boots.metrics[&metric_key(MetricKind::Clicks, &january())],
            MetricCell::Value(5.0)
        );
    }

    #[test]
    fn cell_serialises_as_number_or_null() {
        assert_eq!(
            serde_json::to_string(&MetricCell::Value(5.0)).expect("json"),
            "5.0"
        );
        assert_eq!(
            serde_json::to_string(&MetricCell::NoData).expect("json"),
            "null"
        );
        let cell: MetricCell = serde_json::from_str("null").expect("parse");
        assert_eq!(cell, MetricCell::NoData);
    }
}
