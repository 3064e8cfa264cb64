//! Periodic maintenance: stale export jobs and expired sessions.
//!
//! A job that was never downloaded keeps its spool files forever unless
//! something reaps it. The sweeper runs on a cron schedule and removes
//! every job, whatever its status, that has not been touched within the
//! retention window, together with its artifacts.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing::{debug, info};

use signet_core::config::export::ExportConfig;
use signet_core::error::AppError;
use signet_core::result::AppResult;
use signet_database::repositories::{ExportJobRepository, SessionRepository};

use crate::artifacts::{ArtifactStore, remove_quietly};

/// Cron-driven retention sweeper.
pub struct RetentionSweeper {
    scheduler: JobScheduler,
}

impl std::fmt::Debug for RetentionSweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetentionSweeper").finish()
    }
}

impl RetentionSweeper {
    /// Register the sweep schedule and start the scheduler.
    pub async fn start(
        config: &ExportConfig,
        job_repo: Arc<ExportJobRepository>,
        session_repo: Arc<SessionRepository>,
        artifacts: Arc<ArtifactStore>,
    ) -> AppResult<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        let retention = Duration::minutes(config.retention_minutes);
        let job = CronJob::new_async(config.sweep_schedule.as_str(), move |_uuid, _lock| {
            let job_repo = Arc::clone(&job_repo);
            let session_repo = Arc::clone(&session_repo);
            let artifacts = Arc::clone(&artifacts);
            Box::pin(async move {
                if let Err(e) = sweep_once(&job_repo, &session_repo, &artifacts, retention).await {
                    tracing::error!("Retention sweep failed: {}", e);
                }
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create sweep schedule: {}", e)))?;

        scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add sweep schedule: {}", e)))?;
        scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        info!(
            schedule = %config.sweep_schedule,
            retention_minutes = config.retention_minutes,
            "Retention sweeper started"
        );
        Ok(Self { scheduler })
    }

    /// Stop the scheduler.
    pub async fn shutdown(mut self) -> AppResult<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;
        info!("Retention sweeper stopped");
        Ok(())
    }
}

/// One retention pass: reap stale jobs with their spool files, then drop
/// expired sessions.
pub async fn sweep_once(
    job_repo: &ExportJobRepository,
    session_repo: &SessionRepository,
    artifacts: &ArtifactStore,
    retention: Duration,
) -> AppResult<()> {
    let now = Utc::now();

    let stale = job_repo.find_stale(now - retention).await?;
    for job in stale {
        artifacts.remove_files(&job.partial_artifacts).await;
        remove_quietly(&artifacts.path_of(&ArtifactStore::final_name(&job.id))).await;
        job_repo.delete(&job.id).await?;
        info!(job_id = %job.id, status = %job.status, "Stale export job reaped");
    }

    let removed = session_repo.delete_expired(now).await?;
    if removed > 0 {
        debug!(sessions = removed, "Expired sessions removed");
    }

    Ok(())
}
