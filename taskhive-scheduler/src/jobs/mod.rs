/// Scheduler jobs
///
/// Each job is an independent, idempotent sweep over the tasks table. Jobs
/// share nothing but the [`JobContext`]; overlapping runs are tolerated by
/// construction (timestamp comparisons and insert-if-missing writes).
///
/// | Job | Schedule |
/// | --- | --- |
/// | [`digest::DigestJob`] | daily 09:00 UTC |
/// | [`reminders::ReminderJob`] | every 30 minutes |
/// | [`archive::ArchiveJob`] | Sunday 00:00 UTC |
/// | [`recurrence::RecurrenceJob`] | daily 01:00 UTC |

pub mod archive;
pub mod digest;
pub mod recurrence;
pub mod reminders;

use crate::schedule::JobSchedule;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use taskhive_shared::mailer::Mailer;

/// Shared resources handed to every job run
pub struct JobContext {
    /// Database connection pool
    pub db: PgPool,

    /// Outgoing email sender
    pub mailer: Arc<dyn Mailer>,

    /// Frontend base URL for links in emails
    pub frontend_url: String,
}

/// A scheduled job
#[async_trait]
pub trait Job: Send + Sync {
    /// Job name for logging
    fn name(&self) -> &'static str;

    /// When the job fires
    fn schedule(&self) -> JobSchedule;

    /// One sweep; errors are logged by the runner and never retried
    async fn run(&self, ctx: &JobContext) -> anyhow::Result<()>;
}
