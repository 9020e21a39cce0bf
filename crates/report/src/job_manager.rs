use crate::types::{JobInfo, JobStatus};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

struct JobEntry {
    info: JobInfo,
    cancel: CancellationToken,
}

/// In-memory registry of report jobs and their cancellation tokens
#[derive(Default)]
pub struct JobManager {
    jobs: Arc<RwLock<HashMap<String, JobEntry>>>,
}

impl JobManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a running job; returns its id and cancellation token
    pub async fn create_job(&self, subject_id: &str) -> (String, CancellationToken) {
        let job_id = Uuid::new_v4().to_string();
        let cancel = CancellationToken::new();
        let info = JobInfo {
            job_id: job_id.clone(),
            subject_id: subject_id.to_string(),
            status: JobStatus::Running,
            progress: 0,
            message: "Starting...".to_string(),
            started_at: Utc::now(),
        };

        self.jobs.write().await.insert(
            job_id.clone(),
            JobEntry {
                info,
                cancel: cancel.clone(),
            },
        );
        (job_id, cancel)
    }

    pub async fn update_progress(&self, job_id: &str, progress: u8, message: impl Into<String>) {
        if let Some(job) = running_job(&mut *self.jobs.write().await, job_id) {
            job.info.progress = progress.min(100);
            job.info.message = message.into();
        }
    }

    /// Mark finished; `degraded` reports finish as `Degraded`, not `Completed`.
    /// Only running jobs change state.
    pub async fn complete_job(&self, job_id: &str, degraded: bool) {
        if let Some(job) = running_job(&mut *self.jobs.write().await, job_id) {
            job.info.progress = 100;
            if degraded {
                job.info.status = JobStatus::Degraded;
                job.info.message = "Completed with defects".to_string();
            } else {
                job.info.status = JobStatus::Completed;
                job.info.message = "Completed".to_string();
            }
        }
    }

    pub async fn fail_job(&self, job_id: &str, error: impl Into<String>) {
        if let Some(job) = running_job(&mut *self.jobs.write().await, job_id) {
            job.info.status = JobStatus::Failed;
            job.info.message = error.into();
        }
    }

    /// Flip the job's cancellation token. Finished jobs are left untouched.
    pub async fn cancel_job(&self, job_id: &str) -> bool {
        let mut jobs = self.jobs.write().await;
        let Some(job) = jobs.get_mut(job_id) else {
            return false;
        };
        if job.info.status.is_finished() {
            return false;
        }

        job.cancel.cancel();
        job.info.status = JobStatus::Cancelled;
        job.info.message = "Cancelled by user".to_string();
        info!("Report job cancelled: {}", job_id);
        true
    }

    pub async fn get_job(&self, job_id: &str) -> Option<JobInfo> {
        self.jobs.read().await.get(job_id).map(|job| job.info.clone())
    }

    pub async fn get_jobs(&self) -> Vec<JobInfo> {
        self.jobs.read().await.values().map(|job| job.info.clone()).collect()
    }

    /// Drop finished jobs from the registry
    pub async fn prune_finished(&self) -> usize {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| !job.info.status.is_finished());
        before - jobs.len()
    }
}

/// Progress handle for one job, handed to the pipeline
#[derive(Clone)]
pub struct JobProgress {
    jobs: Arc<JobManager>,
    job_id: String,
}

impl JobProgress {
    pub fn new(jobs: Arc<JobManager>, job_id: impl Into<String>) -> Self {
        Self {
            jobs,
            job_id: job_id.into(),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub async fn update(&self, progress: u8, message: impl Into<String>) {
        self.jobs.update_progress(&self.job_id, progress, message).await;
    }
}

fn running_job<'a>(jobs: &'a mut HashMap<String, JobEntry>, job_id: &str) -> Option<&'a mut JobEntry> {
    jobs.get_mut(job_id)
        .filter(|job| job.info.status == JobStatus::Running)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_job_lifecycle() {
        let manager = JobManager::new();
        let (job_id, _cancel) = manager.create_job("guest-1").await;

        manager.update_progress(&job_id, 40, "Section 3/8").await;
        let job = manager.get_job(&job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.progress, 40);
        assert_eq!(job.message, "Section 3/8");

        manager.complete_job(&job_id, true).await;
        let job = manager.get_job(&job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Degraded);
        assert_eq!(job.progress, 100);
    }

    #[tokio::test]
    async fn test_cancel_flips_token() {
        let manager = JobManager::new();
        let (job_id, cancel) = manager.create_job("guest-1").await;

        assert!(!cancel.is_cancelled());
        assert!(manager.cancel_job(&job_id).await);
        assert!(cancel.is_cancelled());
        assert_eq!(manager.get_job(&job_id).await.unwrap().status, JobStatus::Cancelled);

        // progress updates after cancellation do not revive the job
        manager.update_progress(&job_id, 90, "late").await;
        assert_eq!(manager.get_job(&job_id).await.unwrap().message, "Cancelled by user");
    }

    #[tokio::test]
    async fn test_cancel_unknown_or_finished() {
        let manager = JobManager::new();
        assert!(!manager.cancel_job("missing").await);

        let (job_id, cancel) = manager.create_job("guest-1").await;
        manager.complete_job(&job_id, false).await;
        assert!(!manager.cancel_job(&job_id).await);
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_prune_finished() {
        let manager = JobManager::new();
        let (done, _) = manager.create_job("a").await;
        let (_running, _) = manager.create_job("b").await;
        manager.fail_job(&done, "boom").await;

        assert_eq!(manager.prune_finished().await, 1);
        assert_eq!(manager.get_jobs().await.len(), 1);
    }
}
