//! The fetch-reconcile-annotate cycle behind `POST /api/reports/{id}/refresh`.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use searchdeck_core::analytics::{IntentClassifier, SearchAnalyticsSource};
use searchdeck_core::error::CoreError;
use searchdeck_core::intent::{align_intents, apply_intents, distinct_queries, parse_classifier_response};
use searchdeck_core::layout::{Block, ColumnLayout};
use searchdeck_core::reconcile::{reconcile, RangeSample, ReconciledRow};
use searchdeck_core::timerange::TimeRange;

use crate::error::AppError;

/// The distinct time ranges the layout's metric blocks reference, in slot
/// order. Two blocks over the same range share one fetch.
fn distinct_ranges(layout: &ColumnLayout) -> Vec<TimeRange> {
    let mut seen = HashSet::new();
    let mut ranges = Vec::new();
    for (_, block) in layout.blocks_in_order() {
        if let Block::Metric { time_range, .. } = block {
            if seen.insert(time_range.range_key()) {
                ranges.push(time_range.clone());
            }
        }
    }
    ranges
}

fn has_intent_block(layout: &ColumnLayout) -> bool {
    layout
        .blocks_in_order()
        .any(|(_, block)| matches!(block, Block::Intent { .. }))
}

/// Run one full refresh cycle for a report layout: fetch every referenced
/// range concurrently, reconcile into one row per query, then annotate with
/// intents when the layout asks for them.
///
/// Any single range failing aborts the whole cycle with no partial result;
/// a classifier failure only degrades the intent column, never the rows.
pub async fn refresh_rows(
    search: Arc<dyn SearchAnalyticsSource>,
    intents: Arc<dyn IntentClassifier>,
    property: &str,
    layout: &ColumnLayout,
    row_limit: u32,
) -> Result<Vec<ReconciledRow>, AppError> {
    let ranges = distinct_ranges(layout);
    if ranges.is_empty() {
        return Err(AppError::BadRequest(
            "report has no metric columns to refresh".to_string(),
        ));
    }

    let today = chrono::Utc::now().date_naive();

    let mut handles = Vec::with_capacity(ranges.len());
    for range in ranges {
        let resolved = range.resolve(today).map_err(AppError::from)?;
        let search = Arc::clone(&search);
        let property = property.to_string();
        handles.push((
            range,
            tokio::spawn(async move {
                search.fetch_query_stats(&property, &resolved, row_limit).await
            }),
        ));
    }

    let mut samples = Vec::with_capacity(handles.len());
    for (range, handle) in handles {
        let rows = handle
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("fetch task panicked: {e}")))?
            .map_err(|e| {
                AppError::from(CoreError::AnalyticsFetchFailed {
                    range: range.range_key(),
                    source: e,
                })
            })?;
        debug!(range = %range.range_key(), rows = rows.len(), "Fetched query stats");
        samples.push(RangeSample { range, rows });
    }

    let mut rows = reconcile(&samples);

    if has_intent_block(layout) && !rows.is_empty() {
        let queries = distinct_queries(&rows);
        let parsed = match intents.classify_batch(&queries).await {
            Ok(raw) => parse_classifier_response(&raw),
            Err(e) => {
                warn!(error = %e, "Intent classification failed; rows keep the degraded default");
                Vec::new()
            }
        };
        let aligned = align_intents(&queries, parsed);
        apply_intents(&mut rows, &queries, aligned);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use searchdeck_core::analytics::{MetricKind, QueryStats};
    use searchdeck_core::intent::IntentCategory;
    use searchdeck_core::reconcile::{metric_key, MetricCell};
    use searchdeck_core::timerange::{PresetRange, ResolvedRange};

    struct FakeSource {
        fail: bool,
    }

    #[async_trait::async_trait]
    impl SearchAnalyticsSource for FakeSource {
        async fn fetch_query_stats(
            &self,
            _property: &str,
            _range: &ResolvedRange,
            _row_limit: u32,
        ) -> anyhow::Result<Vec<QueryStats>> {
            if self.fail {
                anyhow::bail!("simulated upstream outage");
            }
            Ok(vec![QueryStats {
                query: "running shoes".to_string(),
                clicks: 12,
                impressions: 240,
                ctr: 0.05,
                position: 4.2,
            }])
        }
    }

    struct FakeClassifier {
        response: anyhow::Result<String>,
    }

    #[async_trait::async_trait]
    impl IntentClassifier for FakeClassifier {
        async fn classify_batch(&self, _queries: &[String]) -> anyhow::Result<String> {
            match &self.response {
                Ok(raw) => Ok(raw.clone()),
                Err(e) => anyhow::bail!("{e}"),
            }
        }
    }

    fn layout_with_clicks_and_intent() -> ColumnLayout {
        let mut layout = ColumnLayout::empty_grid();
        layout
            .insert_at(
                Block::Metric {
                    id: String::new(),
                    metric: MetricKind::Clicks,
                    time_range: TimeRange::Preset(PresetRange::Last7Days),
                },
                0,
            )
            .expect("metric block");
        layout
            .insert_at(Block::Intent { id: String::new() }, 1)
            .expect("intent block");
        layout
    }

    #[tokio::test]
    async fn refresh_fetches_reconciles_and_annotates() {
        let rows = refresh_rows(
            Arc::new(FakeSource { fail: false }),
            Arc::new(FakeClassifier {
                response: Ok(
                    r#"[{"intent":"Buy running shoes","category":"Transactional"}]"#.to_string(),
                ),
            }),
            "sc-domain:example.com",
            &layout_with_clicks_and_intent(),
            1000,
        )
        .await
        .expect("refresh");

        assert_eq!(rows.len(), 1);
        let key = metric_key(MetricKind::Clicks, &TimeRange::Preset(PresetRange::Last7Days));
        assert_eq!(rows[0].metrics.get(&key), Some(&MetricCell::Value(12.0)));
        let intent = rows[0].intent.as_ref().expect("intent attached");
        assert_eq!(intent.category, IntentCategory::Transactional);
    }

    #[tokio::test]
    async fn classifier_failure_degrades_but_keeps_rows() {
        let rows = refresh_rows(
            Arc::new(FakeSource { fail: false }),
            Arc::new(FakeClassifier {
                response: Err(anyhow::anyhow!("quota exhausted")),
            }),
            "sc-domain:example.com",
            &layout_with_clicks_and_intent(),
            1000,
        )
        .await
        .expect("refresh");

        assert_eq!(rows.len(), 1);
        let intent = rows[0].intent.as_ref().expect("degraded intent attached");
        assert_eq!(intent.category, IntentCategory::Unknown);
    }

    #[tokio::test]
    async fn single_range_failure_aborts_the_cycle() {
        let err = refresh_rows(
            Arc::new(FakeSource { fail: true }),
            Arc::new(FakeClassifier {
                response: Ok("[]".to_string()),
            }),
            "sc-domain:example.com",
            &layout_with_clicks_and_intent(),
            1000,
        )
        .await
        .expect_err("fetch failure");
        assert!(matches!(err, AppError::UpstreamFetch(_)));
    }

    #[tokio::test]
    async fn layout_without_metric_blocks_is_rejected() {
        let mut layout = ColumnLayout::empty_grid();
        layout
            .insert_at(Block::Intent { id: String::new() }, 0)
            .expect("intent block");

        let err = refresh_rows(
            Arc::new(FakeSource { fail: false }),
            Arc::new(FakeClassifier {
                response: Ok("[]".to_string()),
            }),
            "sc-domain:example.com",
            &layout,
            1000,
        )
        .await
        .expect_err("no metric blocks");
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn shared_ranges_fetch_once() {
        let mut layout = ColumnLayout::empty_grid();
        for (index, metric) in [MetricKind::Clicks, MetricKind::Impressions]
            .into_iter()
            .enumerate()
        {
            layout
                .insert_at(
                    Block::Metric {
                        id: String::new(),
                        metric,
                        time_range: TimeRange::Preset(PresetRange::Last7Days),
                    },
                    index,
                )
                .expect("insert");
        }
        assert_eq!(distinct_ranges(&layout).len(), 1);
    }
}
