use chrono::{DateTime, Utc};
use saju_calendar::{ChartRequest, FourPillarChart};
use saju_common::GenerationMode;
use saju_prompt::{LeverSelection, PromptBuilderInput, SajuTraits, ValidationResult};
use serde::{Deserialize, Serialize};

/// One report order: birth data plus the seed material for lever selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    /// Birth date, calendar system, leap flag and time slot
    pub birth: ChartRequest,

    pub persona_id: String,

    pub question_id: String,

    pub question_text: String,

    /// User or guest id
    pub subject_id: String,

    #[serde(default)]
    pub subject_name: Option<String>,

    /// Purchase count or session counter
    #[serde(default)]
    pub counter: u64,

    /// Order date (YYYY-MM-DD)
    pub date: String,

    #[serde(default)]
    pub concern_text: Option<String>,

    #[serde(default)]
    pub traits: SajuTraits,
}

impl ReportRequest {
    /// Prompt layer input for an already computed chart
    pub fn builder_input(&self, chart: FourPillarChart) -> PromptBuilderInput {
        PromptBuilderInput {
            persona_id: self.persona_id.clone(),
            question_id: self.question_id.clone(),
            subject_id: self.subject_id.clone(),
            counter: self.counter,
            date: self.date.clone(),
            question_text: self.question_text.clone(),
            concern_text: self.concern_text.clone(),
            subject_name: self.subject_name.clone(),
            chart,
            traits: self.traits.clone(),
        }
    }
}

/// Final state of a generated report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportStatus {
    /// Passed validation, every section generated
    Complete,
    /// Delivered with known defects; never shown as complete
    Degraded { reasons: Vec<String> },
}

impl ReportStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, ReportStatus::Complete)
    }
}

/// One contract section of the report text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionOutput {
    pub marker: String,
    pub title: String,
    pub text: String,
    /// Generation failed after retries; `text` is the placeholder
    pub failed: bool,
}

/// Generated report with everything needed to reproduce or audit it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: String,

    pub status: ReportStatus,

    pub persona_id: String,

    pub mode: GenerationMode,

    /// Final report text (after any repair rounds)
    pub text: String,

    /// `text` cut at the section markers
    pub sections: Vec<SectionOutput>,

    pub chart: FourPillarChart,

    pub levers: LeverSelection,

    /// Validation of `text`
    pub validation: ValidationResult,

    pub repair_attempts: u32,

    /// Markers of sections replaced by a failure placeholder
    #[serde(default)]
    pub failed_sections: Vec<String>,

    pub created_at: DateTime<Utc>,
}

/// Report job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Degraded,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

/// Running or finished report job
#[derive(Debug, Clone, Serialize)]
pub struct JobInfo {
    /// Job ID
    pub job_id: String,

    /// Subject the report is for
    pub subject_id: String,

    /// Status
    pub status: JobStatus,

    /// Progress percentage (0-100)
    pub progress: u8,

    /// Current message
    pub message: String,

    /// Started at
    pub started_at: DateTime<Utc>,
}

/// Stored report listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub id: String,
    pub persona_id: String,
    pub complete: bool,
    pub total_chars: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&Report> for ReportSummary {
    fn from(report: &Report) -> Self {
        Self {
            id: report.id.clone(),
            persona_id: report.persona_id.clone(),
            complete: report.status.is_complete(),
            total_chars: report.validation.stats.total_chars,
            created_at: report.created_at,
        }
    }
}
