use thiserror::Error;

use crate::analytics::MetricKind;

/// Typed failures of the report engine.
///
/// Fetch-path failures (`AnalyticsFetchFailed`) abort the whole
/// fetch-and-reconcile cycle; layout-edit failures are rejected at the call
/// site without touching existing state; `ExportEmpty` is a user-facing,
/// recoverable rejection. Degraded intent classification is deliberately not
/// represented here — it is a fallback state, not an error.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid time range {0:?} (expected YYYY-MM-DD, start on or before end)")]
    InvalidRangeFormat(String),

    #[error("analytics fetch failed for range {range}: {source}")]
    AnalyticsFetchFailed {
        range: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("a column for {metric} over {range} already exists")]
    DuplicateMetric { metric: MetricKind, range: String },

    #[error("slot {0} is already occupied")]
    SlotOccupied(usize),

    #[error("no reconciled rows to export")]
    ExportEmpty,

    #[error("csv serialisation failed: {0}")]
    ExportFailed(#[source] anyhow::Error),
}
