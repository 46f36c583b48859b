//! The persisted report unit and its storage contract.

use serde::{Deserialize, Serialize};

use crate::layout::{Block, ColumnLayout};
use crate::reconcile::ReconciledRow;

/// One saved report: the property it samples, its column layout at stable
/// positions, and the reconciled rows frozen by the last completed fetch
/// cycle. The report exclusively owns its columns and rows; nothing is
/// shared by reference across reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub property: String,
    pub name: String,
    /// One entry per grid slot; `None` marks an empty column.
    pub columns: Vec<Option<Block>>,
    /// Replaced wholesale whenever a fetch-and-reconcile cycle completes,
    /// never incrementally patched.
    pub rows: Vec<ReconciledRow>,
    pub created_at: String,
    pub updated_at: String,
    pub last_fetched_at: Option<String>,
}

impl Report {
    /// A fresh, empty report with the minimum visible grid.
    pub fn new(property: &str, name: &str) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            property: property.to_string(),
            name: name.to_string(),
            columns: ColumnLayout::empty_grid().to_columns(),
            rows: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
            last_fetched_at: None,
        }
    }

    /// Rehydrate the layout from the persisted columns. Ids are
    /// regenerated for the session; persist via [`Report::set_layout`] to
    /// freeze the current ones.
    pub fn layout(&self) -> ColumnLayout {
        ColumnLayout::from_persisted(self.columns.clone())
    }

    pub fn set_layout(&mut self, layout: &ColumnLayout) {
        self.columns = layout.to_columns();
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

/// Listing shape; rows are omitted since they dominate document size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub id: String,
    pub property: String,
    pub name: String,
    pub row_count: usize,
    pub created_at: String,
    pub updated_at: String,
    pub last_fetched_at: Option<String>,
}

impl From<&Report> for ReportSummary {
    fn from(report: &Report) -> Self {
        Self {
            id: report.id.clone(),
            property: report.property.clone(),
            name: report.name.clone(),
            row_count: report.rows.len(),
            created_at: report.created_at.clone(),
            updated_at: report.updated_at.clone(),
            last_fetched_at: report.last_fetched_at.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReportRequest {
    pub name: String,
}

/// Report snapshot persistence. Writes are whole-document replaces keyed by
/// report id; concurrent edits are not reconciled and the later write wins.
#[async_trait::async_trait]
pub trait ReportStore: Send + Sync + 'static {
    async fn list_reports(&self, property: &str) -> anyhow::Result<Vec<ReportSummary>>;

    async fn get_report(&self, report_id: &str) -> anyhow::Result<Option<Report>>;

    async fn put_report(&self, report: &Report) -> anyhow::Result<()>;

    async fn delete_report(&self, report_id: &str) -> anyhow::Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::MIN_VISIBLE_SLOTS;

    #[test]
    fn new_report_starts_with_empty_grid_and_no_rows() {
        let report = Report::new("sc-domain:example.com", "Weekly keywords");
        assert_eq!(report.columns.len(), MIN_VISIBLE_SLOTS);
        assert!(report.columns.iter().all(Option::is_none));
        assert!(report.rows.is_empty());
        assert!(report.last_fetched_at.is_none());
    }

    #[test]
    fn summary_reflects_row_count() {
        let report = Report::new("sc-domain:example.com", "Weekly keywords");
        let summary = ReportSummary::from(&report);
        assert_eq!(summary.row_count, 0);
        assert_eq!(summary.name, "Weekly keywords");
    }
}
