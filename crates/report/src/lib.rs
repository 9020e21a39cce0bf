//! Saju report orchestration
//!
//! Section generation (sequential or parallel), cancellation, the repair loop,
//! the job registry and the on-disk report store

mod job_manager;
mod pipeline;
mod store;
mod types;
mod workflow;

pub use job_manager::{JobManager, JobProgress};
pub use pipeline::{PipelineSettings, ReportPipeline, FAILED_SECTION_NOTICE};
pub use store::ReportStore;
pub use types::{
    JobInfo, JobStatus, Report, ReportRequest, ReportStatus, ReportSummary, SectionOutput,
};
pub use workflow::ReportWorkflow;
