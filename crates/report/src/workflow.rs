use saju_common::{Result, SajuError};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::job_manager::{JobManager, JobProgress};
use crate::pipeline::ReportPipeline;
use crate::store::ReportStore;
use crate::types::{Report, ReportRequest};

/// Runs report jobs end to end: pipeline, job bookkeeping, persistence
pub struct ReportWorkflow {
    pipeline: Arc<ReportPipeline>,
    jobs: Arc<JobManager>,
    store: Arc<ReportStore>,
}

impl ReportWorkflow {
    pub fn new(pipeline: Arc<ReportPipeline>, jobs: Arc<JobManager>, store: Arc<ReportStore>) -> Self {
        Self {
            pipeline,
            jobs,
            store,
        }
    }

    pub fn jobs(&self) -> &Arc<JobManager> {
        &self.jobs
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    /// Register a job for `request`; cancel it through [`JobManager::cancel_job`]
    pub async fn create_job(&self, request: &ReportRequest) -> (String, CancellationToken) {
        self.jobs.create_job(&request.subject_id).await
    }

    /// Generate and store one report. A job cancelled at any point stores nothing.
    pub async fn execute(
        &self,
        job_id: &str,
        cancel: &CancellationToken,
        request: &ReportRequest,
    ) -> Result<(Report, PathBuf)> {
        let progress = JobProgress::new(self.jobs.clone(), job_id);

        let report = match self.pipeline.run_tracked(request, cancel, Some(&progress)).await {
            Ok(report) => report,
            Err(e) => {
                if matches!(e, SajuError::Cancelled(_)) {
                    self.jobs.cancel_job(job_id).await;
                } else {
                    error!("Report job {} failed: {}", job_id, e);
                    self.jobs.fail_job(job_id, e.to_string()).await;
                }
                return Err(e);
            }
        };

        progress.update(95, "Saving report").await;
        let path = self.save_unless_cancelled(job_id, cancel, &report).await?;

        self.jobs
            .complete_job(job_id, !report.status.is_complete())
            .await;
        info!("Report job {} finished: report {}", job_id, report.id);
        Ok((report, path))
    }

    /// Last cancellation check sits directly in front of the write
    async fn save_unless_cancelled(
        &self,
        job_id: &str,
        cancel: &CancellationToken,
        report: &Report,
    ) -> Result<PathBuf> {
        if cancel.is_cancelled() {
            info!("Report job {} cancelled before saving; result discarded", job_id);
            self.jobs.cancel_job(job_id).await;
            return Err(SajuError::cancelled("Report job cancelled before saving"));
        }

        match self.store.save(report).await {
            Ok(path) => Ok(path),
            Err(e) => {
                error!("Failed to save report {}: {}", report.id, e);
                self.jobs.fail_job(job_id, e.to_string()).await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::{
        body, pipeline, request, requested_marker, sample_report, ScriptedClient,
    };
    use crate::types::JobStatus;
    use saju_common::GenerationMode;

    fn workflow(client: Arc<ScriptedClient>, dir: &std::path::Path) -> ReportWorkflow {
        ReportWorkflow::new(
            Arc::new(pipeline(client, GenerationMode::Sequential, 1)),
            Arc::new(JobManager::new()),
            Arc::new(ReportStore::new(dir)),
        )
    }

    #[tokio::test]
    async fn test_execute_saves_and_completes() {
        let dir = tempfile::tempdir().unwrap();
        let client = ScriptedClient::new(|prompt, _| {
            let marker = requested_marker(prompt).unwrap_or_default();
            Ok(format!("{}\n{}", marker, body(12)))
        });
        let workflow = workflow(client, dir.path());
        let request = request();

        let (job_id, cancel) = workflow.create_job(&request).await;
        let (report, path) = workflow.execute(&job_id, &cancel, &request).await.unwrap();

        assert!(path.exists());
        assert!(report.status.is_complete());
        let job = workflow.jobs().get_job(&job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert_eq!(workflow.store().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_job_stores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let jobs = Arc::new(JobManager::new());
        let request = request();
        let (job_id, cancel) = jobs.create_job(&request.subject_id).await;

        // token flips while the first section is in flight
        let trigger = cancel.clone();
        let client = ScriptedClient::new(move |prompt, _| {
            trigger.cancel();
            let marker = requested_marker(prompt).unwrap_or_default();
            Ok(format!("{}\n{}", marker, body(12)))
        });
        let workflow = ReportWorkflow::new(
            Arc::new(pipeline(client.clone(), GenerationMode::Sequential, 1)),
            jobs.clone(),
            Arc::new(ReportStore::new(dir.path())),
        );

        let err = workflow.execute(&job_id, &cancel, &request).await.unwrap_err();
        assert!(matches!(err, SajuError::Cancelled(_)));
        assert_eq!(client.calls(), 1);
        assert_eq!(jobs.get_job(&job_id).await.unwrap().status, JobStatus::Cancelled);
        assert!(workflow.store().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_at_save_step_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let client = ScriptedClient::new(|_, _| Ok(String::new()));
        let workflow = workflow(client.clone(), dir.path());
        let request = request();
        let (job_id, cancel) = workflow.create_job(&request).await;
        workflow.jobs().update_progress(&job_id, 95, "Saving report").await;

        cancel.cancel();
        let err = workflow
            .save_unless_cancelled(&job_id, &cancel, &sample_report("late-cancel"))
            .await
            .unwrap_err();

        assert!(matches!(err, SajuError::Cancelled(_)));
        assert_eq!(client.calls(), 0);
        assert!(workflow.store().list().await.unwrap().is_empty());
        let job = workflow.jobs().get_job(&job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_input_error_fails_job() {
        let dir = tempfile::tempdir().unwrap();
        let client = ScriptedClient::new(|_, _| Ok(String::new()));
        let workflow = workflow(client, dir.path());
        let mut request = request();
        request.birth.time_slot = Some("13시".to_string());

        let (job_id, cancel) = workflow.create_job(&request).await;
        let err = workflow.execute(&job_id, &cancel, &request).await.unwrap_err();

        assert!(matches!(err, SajuError::InvalidTimeSlotToken(_)));
        let job = workflow.jobs().get_job(&job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
    }
}
