use crate::types::{Report, ReportSummary};
use saju_common::{Result, SajuError};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Finished reports on disk: `{id}.json` (full record) and `{id}.txt` (text only)
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the report; returns the JSON path
    pub async fn save(&self, report: &Report) -> Result<PathBuf> {
        check_id(&report.id)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let json_path = self.dir.join(format!("{}.json", report.id));
        let data = serde_json::to_string_pretty(report)?;
        tokio::fs::write(&json_path, data).await?;

        let text_path = self.dir.join(format!("{}.txt", report.id));
        tokio::fs::write(&text_path, &report.text).await?;

        info!("Report saved to: {:?}", json_path);
        Ok(json_path)
    }

    pub async fn load(&self, id: &str) -> Result<Report> {
        check_id(id)?;
        let path = self.dir.join(format!("{}.json", id));
        if !path.exists() {
            return Err(SajuError::invalid_input(format!("Report not found: {}", id)));
        }

        let data = tokio::fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&data)?)
    }

    /// All stored reports, newest first. Unreadable files are skipped.
    pub async fn list(&self) -> Result<Vec<ReportSummary>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut summaries = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let data = tokio::fs::read_to_string(&path).await?;
            match serde_json::from_str::<Report>(&data) {
                Ok(report) => summaries.push(ReportSummary::from(&report)),
                Err(e) => warn!("Skipping unreadable report {:?}: {}", path, e),
            }
        }

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        debug!("Listed {} stored reports", summaries.len());
        Ok(summaries)
    }
}

fn check_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(SajuError::invalid_input(format!("Invalid report id: {:?}", id)))
    }
}
