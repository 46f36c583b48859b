//! Search-analytics fetch contract and metric primitives.

use serde::{Deserialize, Serialize};

use crate::timerange::ResolvedRange;

/// Default per-range row cap when the caller does not choose one.
pub const DEFAULT_ROW_LIMIT: u32 = 1000;

/// Upper bound the upstream analytics source accepts per request.
pub const MAX_ROW_LIMIT: u32 = 25_000;

/// The closed set of per-query metrics a report column can show.
///
/// `clicks`/`impressions` are non-negative counts, `ctr` a ratio in [0, 1],
/// `position` a positive average rank (lower is better).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Clicks,
    Impressions,
    Ctr,
    Position,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Clicks,
        MetricKind::Impressions,
        MetricKind::Ctr,
        MetricKind::Position,
    ];

    pub fn key(self) -> &'static str {
        match self {
            MetricKind::Clicks => "clicks",
            MetricKind::Impressions => "impressions",
            MetricKind::Ctr => "ctr",
            MetricKind::Position => "position",
        }
    }

    /// Capitalised display name used in column headers.
    pub fn display_name(self) -> &'static str {
        match self {
            MetricKind::Clicks => "Clicks",
            MetricKind::Impressions => "Impressions",
            MetricKind::Ctr => "Ctr",
            MetricKind::Position => "Position",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// One normalised analytics row: the metrics for one distinct query text
/// within one resolved time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryStats {
    pub query: String,
    pub clicks: u64,
    pub impressions: u64,
    pub ctr: f64,
    pub position: f64,
}

impl QueryStats {
    pub fn metric(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::Clicks => self.clicks as f64,
            MetricKind::Impressions => self.impressions as f64,
            MetricKind::Ctr => self.ctr,
            MetricKind::Position => self.position,
        }
    }
}

/// The consumed analytics fetch contract: one outbound call per resolved
/// window, dimensioned by query text only. Token validity and session
/// handling belong to the collaborator behind the implementation; this core
/// only reacts to a clean row set or a typed failure.
#[async_trait::async_trait]
pub trait SearchAnalyticsSource: Send + Sync + 'static {
    async fn fetch_query_stats(
        &self,
        property: &str,
        range: &ResolvedRange,
        row_limit: u32,
    ) -> anyhow::Result<Vec<QueryStats>>;
}

/// The consumed intent-classification contract: exactly one batched request
/// carrying the full ordered query list. The return value is the upstream
/// model's raw text; absence of any parseable structure within it is a valid
/// (degraded) response, so parsing lives with the annotator, not here.
#[async_trait::async_trait]
pub trait IntentClassifier: Send + Sync + 'static {
    async fn classify_batch(&self, queries: &[String]) -> anyhow::Result<String>;
}
