/// Daily digest email
///
/// At 09:00 UTC: for every active user whose settings opt into the digest,
/// gather today's counters (due today, completed today, overdue, in
/// progress) plus up to five of today's tasks, and send the summary email.
/// A failure for one recipient is logged and does not stop the rest.

use super::{Job, JobContext};
use crate::schedule::JobSchedule;
use async_trait::async_trait;
use taskhive_shared::{
    mailer::templates::{self, DigestData},
    models::{task::Task, user::DigestRecipient},
};

/// Maximum tasks listed in the digest body
const DIGEST_TASK_LIMIT: i64 = 5;

pub struct DigestJob;

impl DigestJob {
    async fn digest_for(ctx: &JobContext, user: &DigestRecipient) -> anyhow::Result<DigestData> {
        Ok(DigestData {
            due_today: Task::due_today_count(&ctx.db, user.id).await?,
            completed: Task::completed_today_count(&ctx.db, user.id).await?,
            overdue: Task::overdue_count(&ctx.db, user.id).await?,
            in_progress: Task::in_progress_count(&ctx.db, user.id).await?,
            tasks: Task::due_today_list(&ctx.db, user.id, DIGEST_TASK_LIMIT).await?,
        })
    }
}

#[async_trait]
impl Job for DigestJob {
    fn name(&self) -> &'static str {
        "daily-digest"
    }

    fn schedule(&self) -> JobSchedule {
        JobSchedule::DailyAt { hour: 9, minute: 0 }
    }

    async fn run(&self, ctx: &JobContext) -> anyhow::Result<()> {
        let recipients = taskhive_shared::models::user::User::list_digest_recipients(&ctx.db).await?;
        let mut sent = 0usize;

        for user in &recipients {
            let data = match Self::digest_for(ctx, user).await {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(error = %e, user_id = %user.id, "Failed to assemble digest");
                    continue;
                }
            };

            let content = templates::daily_digest(&user.full_name, &data);
            match ctx.mailer.send(content.to(&user.email)).await {
                Ok(()) => sent += 1,
                Err(e) => {
                    tracing::warn!(error = %e, user_id = %user.id, "Failed to send digest email");
                }
            }
        }

        tracing::info!(recipients = recipients.len(), sent, "Daily digest finished");
        Ok(())
    }
}
