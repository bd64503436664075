/// Job runner
///
/// Spawns one cooperative loop per job. Each loop sleeps until the job's
/// next scheduled boundary, runs one sweep, logs failures, and never retries
/// within a window. Jobs have no mutual exclusion; every sweep is idempotent
/// on its own.
///
/// # Example
///
/// ```no_run
/// use taskhive_scheduler::{jobs::JobContext, runner::JobRunner};
/// use std::sync::Arc;
///
/// # async fn example(ctx: JobContext) -> anyhow::Result<()> {
/// let runner = JobRunner::new(Arc::new(ctx));
/// let shutdown = runner.shutdown_token();
///
/// tokio::spawn(async move {
///     tokio::signal::ctrl_c().await.ok();
///     shutdown.cancel();
/// });
///
/// runner.run().await;
/// # Ok(())
/// # }
/// ```

use crate::jobs::{
    archive::ArchiveJob, digest::DigestJob, recurrence::RecurrenceJob, reminders::ReminderJob,
    Job, JobContext,
};
use chrono::Utc;
use std::sync::Arc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Runs all scheduler jobs until shutdown
pub struct JobRunner {
    ctx: Arc<JobContext>,
    jobs: Vec<Arc<dyn Job>>,
    shutdown: CancellationToken,
}

impl JobRunner {
    /// Creates a runner with the full job set
    pub fn new(ctx: Arc<JobContext>) -> Self {
        Self {
            ctx,
            jobs: vec![
                Arc::new(DigestJob),
                Arc::new(ReminderJob),
                Arc::new(ArchiveJob),
                Arc::new(RecurrenceJob),
            ],
            shutdown: CancellationToken::new(),
        }
    }

    /// Creates a runner with a custom job set
    pub fn with_jobs(ctx: Arc<JobContext>, jobs: Vec<Arc<dyn Job>>) -> Self {
        Self {
            ctx,
            jobs,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that stops every job loop when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Runs all job loops to completion (i.e. until shutdown)
    pub async fn run(self) {
        let mut handles = Vec::new();

        for job in self.jobs {
            let ctx = Arc::clone(&self.ctx);
            let shutdown = self.shutdown.clone();

            handles.push(tokio::spawn(async move {
                tracing::info!(job = job.name(), "Job loop started");

                loop {
                    let next = job.schedule().next_occurrence(Utc::now());
                    let wait = (next - Utc::now())
                        .to_std()
                        .unwrap_or(std::time::Duration::ZERO);

                    tracing::debug!(job = job.name(), next = %next, "Sleeping until next run");

                    tokio::select! {
                        _ = shutdown.cancelled() => {
                            tracing::info!(job = job.name(), "Job loop stopped");
                            break;
                        }
                        _ = sleep(wait) => {
                            if let Err(e) = job.run(&ctx).await {
                                tracing::error!(job = job.name(), error = %e, "Job run failed");
                            }
                        }
                    }
                }
            }));
        }

        for handle in handles {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::JobSchedule;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use taskhive_shared::mailer::NoopMailer;

    struct CountingJob {
        runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Job for CountingJob {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn schedule(&self) -> JobSchedule {
            JobSchedule::EveryMinutes(1)
        }

        async fn run(&self, _ctx: &JobContext) -> anyhow::Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn test_ctx() -> Arc<JobContext> {
        let db = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgresql://localhost:1/taskhive_offline")
            .expect("lazy pool");

        Arc::new(JobContext {
            db,
            mailer: Arc::new(NoopMailer),
            frontend_url: "http://localhost:3000".to_string(),
        })
    }

    #[tokio::test]
    async fn test_runner_stops_on_shutdown() {
        let runs = Arc::new(AtomicUsize::new(0));
        let runner = JobRunner::with_jobs(
            test_ctx(),
            vec![Arc::new(CountingJob {
                runs: Arc::clone(&runs),
            })],
        );

        let shutdown = runner.shutdown_token();
        let handle = tokio::spawn(runner.run());

        // The job is sleeping toward its first minute boundary; cancel it
        shutdown.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("runner should stop promptly")
            .unwrap();

        // At most one run can sneak in if the spawn landed on a boundary
        assert!(runs.load(Ordering::SeqCst) <= 1);
    }
}
