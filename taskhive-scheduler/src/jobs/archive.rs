/// Weekly archive sweep
///
/// Sunday 00:00 UTC: tasks completed more than 30 days ago get their
/// `archived_at` stamped, dropping them out of default list queries and
/// dashboards. Pure timestamp comparison, so overlapping runs are harmless.

use super::{Job, JobContext};
use crate::schedule::JobSchedule;
use async_trait::async_trait;
use chrono::{Duration, Utc, Weekday};
use taskhive_shared::models::task::Task;

/// Completed tasks older than this are archived
const ARCHIVE_AFTER_DAYS: i64 = 30;

pub struct ArchiveJob;

#[async_trait]
impl Job for ArchiveJob {
    fn name(&self) -> &'static str {
        "archive-completed"
    }

    fn schedule(&self) -> JobSchedule {
        JobSchedule::WeeklyAt {
            weekday: Weekday::Sun,
            hour: 0,
            minute: 0,
        }
    }

    async fn run(&self, ctx: &JobContext) -> anyhow::Result<()> {
        let cutoff = Utc::now() - Duration::days(ARCHIVE_AFTER_DAYS);
        let archived = Task::archive_completed_before(&ctx.db, cutoff).await?;

        tracing::info!(archived, "Archive sweep finished");
        Ok(())
    }
}
