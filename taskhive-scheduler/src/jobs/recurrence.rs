/// Nightly recurrence regeneration
///
/// At 01:00 UTC: every completed, unarchived task carrying a recurrence
/// pattern spawns a copy with its due date advanced by the pattern and a
/// fresh start date, then the source task is archived. Archiving the source
/// is what makes the job idempotent: a pattern regenerates exactly once per
/// completion.

use super::{Job, JobContext};
use crate::schedule::JobSchedule;
use async_trait::async_trait;
use chrono::Utc;
use taskhive_shared::models::task::{RecurrencePattern, Task};

pub struct RecurrenceJob;

#[async_trait]
impl Job for RecurrenceJob {
    fn name(&self) -> &'static str {
        "recurrence-regeneration"
    }

    fn schedule(&self) -> JobSchedule {
        JobSchedule::DailyAt { hour: 1, minute: 0 }
    }

    async fn run(&self, ctx: &JobContext) -> anyhow::Result<()> {
        let tasks = Task::list_completed_recurring(&ctx.db).await?;
        let mut spawned = 0usize;

        for task in &tasks {
            let Some(pattern) = task
                .recurrence_pattern
                .as_ref()
                .and_then(RecurrencePattern::from_value)
            else {
                tracing::warn!(task_id = %task.id, "Recurring task has no usable pattern, skipping");
                continue;
            };

            // A recurring task without a due date has nothing to advance
            let Some(due_date) = task.due_date else {
                tracing::warn!(task_id = %task.id, "Recurring task has no due date, skipping");
                continue;
            };

            let next_due = pattern.next_due_date(due_date);

            if Task::spawn_next_occurrence(&ctx.db, task.id, next_due, Utc::now())
                .await?
                .is_some()
            {
                Task::archive(&ctx.db, task.id).await?;
                spawned += 1;
            }
        }

        tracing::info!(candidates = tasks.len(), spawned, "Recurrence regeneration finished");
        Ok(())
    }
}
