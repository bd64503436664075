/// Due-date reminder sweep
///
/// Every 30 minutes: find unarchived tasks due within the next 24 hours that
/// are still open and whose assignee opted into reminders, then insert a
/// reminder notification and send the reminder email. The notification insert
/// is insert-if-missing keyed on (task, type), so a task is reminded at most
/// once per due date and overlapping sweeps stay idempotent.

use super::{Job, JobContext};
use crate::schedule::JobSchedule;
use async_trait::async_trait;
use taskhive_shared::{
    mailer::templates,
    models::{notification::Notification, task::Task},
};

pub struct ReminderJob;

#[async_trait]
impl Job for ReminderJob {
    fn name(&self) -> &'static str {
        "due-date-reminders"
    }

    fn schedule(&self) -> JobSchedule {
        JobSchedule::EveryMinutes(30)
    }

    async fn run(&self, ctx: &JobContext) -> anyhow::Result<()> {
        let due_tasks = Task::due_within_24h(&ctx.db).await?;
        let mut sent = 0usize;

        for task in &due_tasks {
            let created = Notification::create_reminder_if_missing(
                &ctx.db,
                task.assigned_to,
                task.id,
                &format!("Task Due Soon: {}", task.title),
                &format!("Your task \"{}\" is due within 24 hours", task.title),
            )
            .await?;

            // Already reminded on an earlier sweep
            if created.is_none() {
                continue;
            }

            let content = templates::due_date_reminder(task, &ctx.frontend_url);
            if let Err(e) = ctx.mailer.send(content.to(&task.email)).await {
                tracing::warn!(error = %e, task_id = %task.id, "Failed to send reminder email");
            }

            sent += 1;
        }

        tracing::info!(eligible = due_tasks.len(), sent, "Due date reminder sweep finished");
        Ok(())
    }
}
