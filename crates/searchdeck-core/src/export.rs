//! Cell formatting and CSV export.
//!
//! The same per-metric formatting rules feed on-screen display strings and
//! CSV fields; export additionally prefixes a UTF-8 BOM and quotes every
//! field unconditionally for spreadsheet-importer compatibility.

use crate::analytics::MetricKind;
use crate::error::CoreError;
use crate::layout::{Block, ColumnLayout};
use crate::reconcile::{metric_key, MetricCell, ReconciledRow};

/// Placeholder rendered for an explicit no-data cell, in both display and
/// CSV contexts.
pub const NO_DATA_PLACEHOLDER: &str = "-";

fn group_thousands(value: f64) -> String {
    let rounded = value.round().abs() as u64;
    let digits = rounded.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Render one metric cell: grouped integer for counts, two-decimal
/// percentage for ctr, one decimal for position, `-` for no data.
pub fn format_metric(metric: MetricKind, cell: MetricCell) -> String {
    let value = match cell {
        MetricCell::Value(value) => value,
        MetricCell::NoData => return NO_DATA_PLACEHOLDER.to_string(),
    };
    match metric {
        MetricKind::Clicks | MetricKind::Impressions => group_thousands(value),
        MetricKind::Ctr => format!("{:.2}%", value * 100.0),
        MetricKind::Position => format!("{value:.1}"),
    }
}

/// Display label for one non-empty block, e.g. `Clicks (L7D)` or
/// `Position (Custom)`.
pub fn column_label(block: &Block) -> String {
    match block {
        Block::Metric {
            metric, time_range, ..
        } => format!("{} ({})", metric.display_name(), time_range.short_label()),
        Block::Intent { .. } => "Intent".to_string(),
    }
}

/// Which reconciled rows an export covers. Selecting `All` never triggers a
/// fetch; both scopes read already-reconciled state only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportScope {
    All,
    /// The subset currently materialized for display. `page` is 1-based.
    Page { page: usize, per_page: usize },
}

impl ExportScope {
    fn slice<'a>(&self, rows: &'a [ReconciledRow]) -> &'a [ReconciledRow] {
        match *self {
            ExportScope::All => rows,
            ExportScope::Page { page, per_page } => {
                let start = page.saturating_sub(1).saturating_mul(per_page);
                let end = start.saturating_add(per_page).min(rows.len());
                rows.get(start..end).unwrap_or(&[])
            }
        }
    }
}

/// Header fields: `Query` first, then one field per non-empty block. The
/// intent block contributes both the `Intent` and `Category` columns.
fn header_fields(layout: &ColumnLayout) -> Vec<String> {
    let mut fields = vec!["Query".to_string()];
    for (_, block) in layout.blocks_in_order() {
        match block {
            Block::Metric { .. } => fields.push(column_label(block)),
            Block::Intent { .. } => {
                fields.push("Intent".to_string());
                fields.push("Category".to_string());
            }
        }
    }
    fields
}

fn row_fields(layout: &ColumnLayout, row: &ReconciledRow) -> Vec<String> {
    let mut fields = vec![row.query.clone()];
    for (_, block) in layout.blocks_in_order() {
        match block {
            Block::Metric {
                metric, time_range, ..
            } => {
                let cell = row
                    .metrics
                    .get(&metric_key(*metric, time_range))
                    .copied()
                    .unwrap_or(MetricCell::NoData);
                fields.push(format_metric(*metric, cell));
            }
            Block::Intent { .. } => match &row.intent {
                Some(intent) => {
                    fields.push(intent.description.clone());
                    fields.push(intent.category.as_str().to_string());
                }
                None => {
                    fields.push(NO_DATA_PLACEHOLDER.to_string());
                    fields.push(NO_DATA_PLACEHOLDER.to_string());
                }
            },
        }
    }
    fields
}

/// Serialise the scoped row set as CSV bytes: UTF-8 BOM, comma-delimited,
/// every field quoted. Fails with [`CoreError::ExportEmpty`] rather than
/// producing a header-only file when the scoped set has no rows.
pub fn export_csv(
    layout: &ColumnLayout,
    rows: &[ReconciledRow],
    scope: ExportScope,
) -> Result<Vec<u8>, CoreError> {
    let scoped = scope.slice(rows);
    if scoped.is_empty() {
        return Err(CoreError::ExportEmpty);
    }

    // BOM first so spreadsheet importers detect UTF-8.
    let buf = vec![0xEF, 0xBB, 0xBF];
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(buf);

    writer
        .write_record(header_fields(layout))
        .map_err(|e| CoreError::ExportFailed(anyhow::anyhow!("csv write failed: {e}")))?;
    for row in scoped {
        writer
            .write_record(row_fields(layout, row))
            .map_err(|e| CoreError::ExportFailed(anyhow::anyhow!("csv write failed: {e}")))?;
    }

    writer
        .into_inner()
        .map_err(|e| CoreError::ExportFailed(anyhow::anyhow!("csv flush failed: {e}")))
}
