//! JSON-file report persistence.
//!
//! One document per report at `{data_dir}/reports/{id}.json`, mirrored by an
//! in-memory map loaded once at startup. Writes replace the whole document
//! via a temp file and rename, so a crash mid-write never leaves a truncated
//! report on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::sync::RwLock;
use tracing::warn;

use searchdeck_core::report::{Report, ReportStore, ReportSummary};

pub struct JsonReportStore {
    dir: PathBuf,
    reports: RwLock<HashMap<String, Report>>,
}

impl JsonReportStore {
    /// Open the store rooted at `data_dir`, creating the reports directory
    /// and loading every existing document into memory. A document that no
    /// longer parses is skipped with a warning rather than failing startup.
    pub fn open(data_dir: &str) -> Result<Self> {
        let dir = Path::new(data_dir).join("reports");
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create reports dir {}", dir.display()))?;

        let mut reports = HashMap::new();
        for entry in std::fs::read_dir(&dir)
            .with_context(|| format!("read reports dir {}", dir.display()))?
        {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("read report {}", path.display()))?;
            match serde_json::from_str::<Report>(&raw) {
                Ok(report) => {
                    reports.insert(report.id.clone(), report);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable report document");
                }
            }
        }

        Ok(Self {
            dir,
            reports: RwLock::new(reports),
        })
    }

    fn report_path(&self, report_id: &str) -> PathBuf {
        self.dir.join(format!("{report_id}.json"))
    }

    async fn write_document(&self, report: &Report) -> Result<()> {
        let path = self.report_path(&report.id);
        let tmp = self.dir.join(format!("{}.json.tmp", report.id));
        let body = serde_json::to_vec_pretty(report)?;
        tokio::fs::write(&tmp, &body)
            .await
            .with_context(|| format!("write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("rename into {}", path.display()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ReportStore for JsonReportStore {
    async fn list_reports(&self, property: &str) -> Result<Vec<ReportSummary>> {
        let reports = self.reports.read().await;
        let mut summaries: Vec<ReportSummary> = reports
            .values()
            .filter(|report| report.property == property)
            .map(ReportSummary::from)
            .collect();
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(summaries)
    }

    async fn get_report(&self, report_id: &str) -> Result<Option<Report>> {
        Ok(self.reports.read().await.get(report_id).cloned())
    }

    async fn put_report(&self, report: &Report) -> Result<()> {
        // Hold the write lock across the file write so two puts for the same
        // report cannot interleave their temp-file renames.
        let mut reports = self.reports.write().await;
        self.write_document(report).await?;
        reports.insert(report.id.clone(), report.clone());
        Ok(())
    }

    async fn delete_report(&self, report_id: &str) -> Result<bool> {
        let mut reports = self.reports.write().await;
        if reports.remove(report_id).is_none() {
            return Ok(false);
        }
        match tokio::fs::remove_file(self.report_path(report_id)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(true)
    }
}
