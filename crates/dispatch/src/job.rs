//! Job tracker — guarantees a dispatch run's job record is closed exactly
//! once, whichever way the run ends.

use campaign_core::error::{CampaignError, CampaignResult};
use campaign_core::store::MessageStore;
use campaign_core::types::{DispatchStats, JobStats, JobStatus};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Lifecycle guard around one job record.
///
/// `open` creates the job as running; `finish` or `fail` closes it. Once
/// closed, further `fail` calls are no-ops. A tracker dropped while its job
/// is still open (a cancelled or panicking run) spawns a best-effort close
/// as failed on the current runtime.
pub struct JobTracker {
    store: Arc<dyn MessageStore>,
    campaign_id: Uuid,
    job_id: Option<Uuid>,
    closed: bool,
}

impl JobTracker {
    pub fn new(store: Arc<dyn MessageStore>, campaign_id: Uuid) -> Self {
        Self {
            store,
            campaign_id,
            job_id: None,
            closed: false,
        }
    }

    pub fn job_id(&self) -> Option<Uuid> {
        self.job_id
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Create the job in running state with `{total}` stats.
    pub async fn open(&mut self, total: u64) -> CampaignResult<Uuid> {
        if let Some(id) = self.job_id {
            return Ok(id);
        }
        let job = self
            .store
            .create_job(self.campaign_id, JobStatus::Running, JobStats::running(total))
            .await?;
        info!(job_id = %job.id, campaign_id = %self.campaign_id, total, "dispatch job opened");
        self.job_id = Some(job.id);
        Ok(job.id)
    }

    /// Close the job as finished with the run's aggregate counts.
    pub async fn finish(&mut self, stats: &DispatchStats) -> CampaignResult<()> {
        if self.closed {
            return Ok(());
        }
        let job_id = self.job_id.ok_or_else(|| {
            CampaignError::Internal(anyhow::anyhow!("job finished before it was opened"))
        })?;
        self.store
            .update_job(
                job_id,
                JobStatus::Finished,
                Some(Utc::now()),
                JobStats::finished(stats),
            )
            .await?;
        self.closed = true;
        info!(
            job_id = %job_id,
            campaign_id = %self.campaign_id,
            total = stats.total,
            sent = stats.sent,
            failed = stats.failed,
            skipped_unsubscribed = stats.skipped_unsubscribed,
            "dispatch job finished"
        );
        Ok(())
    }

    /// Close the job as failed. When no job was opened yet, a job is created
    /// directly in failed state. Store errors here are logged, not returned:
    /// the caller is already propagating `cause`.
    pub async fn fail(&mut self, cause: &CampaignError, partial: Option<&DispatchStats>) {
        if self.closed {
            return;
        }
        self.closed = true;
        let message = cause.to_string();

        let existing = self.job_id;
        let result = match existing {
            Some(job_id) => {
                self.store
                    .update_job(
                        job_id,
                        JobStatus::Failed,
                        Some(Utc::now()),
                        JobStats::failed(message.clone(), partial),
                    )
                    .await
            }
            None => self
                .store
                .create_job(
                    self.campaign_id,
                    JobStatus::Failed,
                    JobStats::failed(message.clone(), None),
                )
                .await
                .map(|job| {
                    self.job_id = Some(job.id);
                }),
        };

        match result {
            Ok(()) => warn!(
                job_id = ?self.job_id,
                campaign_id = %self.campaign_id,
                error = %message,
                "dispatch job failed"
            ),
            Err(e) => error!(
                job_id = ?self.job_id,
                campaign_id = %self.campaign_id,
                cause = %message,
                error = %e,
                "could not record dispatch job failure"
            ),
        }
    }
}

impl Drop for JobTracker {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let Some(job_id) = self.job_id else {
            return;
        };
        warn!(job_id = %job_id, campaign_id = %self.campaign_id, "dispatch job dropped while running");

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            error!(job_id = %job_id, "no runtime available to close abandoned job");
            return;
        };
        let store = self.store.clone();
        handle.spawn(async move {
            let stats = JobStats::failed("dispatch run aborted", None);
            if let Err(e) = store
                .update_job(job_id, JobStatus::Failed, Some(Utc::now()), stats)
                .await
            {
                error!(job_id = %job_id, error = %e, "could not close abandoned job");
            }
        });
    }
}
