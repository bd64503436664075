/// Notification model and database operations
///
/// Notifications are written by request handlers (assignment, status change,
/// comment) and by the reminder job. Reminder inserts go through
/// [`Notification::create_reminder_if_missing`] so overlapping scheduler runs
/// stay idempotent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Kind of notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// A task was assigned to the user
    TaskAssignment,

    /// One of the user's tasks changed status
    StatusUpdate,

    /// Someone commented on the user's task
    Comment,

    /// One of the user's tasks is due within 24 hours
    DueDateReminder,
}

impl NotificationType {
    /// Type as its database string
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::TaskAssignment => "task_assignment",
            NotificationType::StatusUpdate => "status_update",
            NotificationType::Comment => "comment",
            NotificationType::DueDateReminder => "due_date_reminder",
        }
    }
}

/// Notification model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    /// Unique notification ID
    pub id: Uuid,

    /// Recipient
    pub user_id: Uuid,

    /// Task the notification refers to
    pub task_id: Option<Uuid>,

    /// Type string (see [`NotificationType`])
    pub notification_type: String,

    /// Short title shown in the notification list
    pub title: String,

    /// Longer message body
    pub message: String,

    /// Whether the user has read it
    pub is_read: bool,

    /// Whether a matching email was sent
    pub email_sent: bool,

    /// When the notification was created
    pub created_at: DateTime<Utc>,
}

/// Notification joined with its task's title
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct NotificationWithTask {
    pub id: Uuid,
    pub user_id: Uuid,
    pub task_id: Option<Uuid>,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub email_sent: bool,
    pub created_at: DateTime<Utc>,
    pub task_title: Option<String>,
}

/// Input for creating a notification
#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub user_id: Uuid,
    pub task_id: Option<Uuid>,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub email_sent: bool,
}

impl Notification {
    /// Creates a notification
    pub async fn create(pool: &PgPool, data: CreateNotification) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, task_id, notification_type, title, message, email_sent)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, task_id, notification_type, title, message,
                      is_read, email_sent, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.task_id)
        .bind(data.notification_type.as_str())
        .bind(data.title)
        .bind(data.message)
        .bind(data.email_sent)
        .fetch_one(pool)
        .await
    }

    /// Creates a due-date reminder unless the task already has one
    ///
    /// Returns the new notification, or `None` when the task was already
    /// reminded. The `NOT EXISTS` guard is what keeps overlapping reminder
    /// sweeps from double-notifying.
    pub async fn create_reminder_if_missing(
        pool: &PgPool,
        user_id: Uuid,
        task_id: Uuid,
        title: &str,
        message: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, task_id, notification_type, title, message, email_sent)
            SELECT $1, $2, 'due_date_reminder', $3, $4, TRUE
            WHERE NOT EXISTS (
                SELECT 1 FROM notifications
                WHERE task_id = $2 AND notification_type = 'due_date_reminder'
            )
            RETURNING id, user_id, task_id, notification_type, title, message,
                      is_read, email_sent, created_at
            "#,
        )
        .bind(user_id)
        .bind(task_id)
        .bind(title)
        .bind(message)
        .fetch_optional(pool)
        .await
    }

    /// Lists a user's notifications newest first, optionally filtered by read state
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        is_read: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NotificationWithTask>, sqlx::Error> {
        let mut query = String::from(
            "SELECT n.id, n.user_id, n.task_id, n.notification_type, n.title, n.message, \
                    n.is_read, n.email_sent, n.created_at, t.title AS task_title \
             FROM notifications n \
             LEFT JOIN tasks t ON n.task_id = t.id \
             WHERE n.user_id = $1",
        );
        let mut bind_count = 1;

        if is_read.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND n.is_read = ${}", bind_count));
        }

        query.push_str(&format!(
            " ORDER BY n.created_at DESC LIMIT ${} OFFSET ${}",
            bind_count + 1,
            bind_count + 2
        ));

        let mut q = sqlx::query_as::<_, NotificationWithTask>(&query).bind(user_id);
        if let Some(read) = is_read {
            q = q.bind(read);
        }

        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Counts a user's notifications matching the list filter
    pub async fn count_for_user(
        pool: &PgPool,
        user_id: Uuid,
        is_read: Option<bool>,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = match is_read {
            Some(read) => {
                sqlx::query_as(
                    "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = $2",
                )
                .bind(user_id)
                .bind(read)
                .fetch_one(pool)
                .await?
            }
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
                    .bind(user_id)
                    .fetch_one(pool)
                    .await?
            }
        };

        Ok(count)
    }

    /// Counts a user's unread notifications
    pub async fn unread_count(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Marks one of the user's notifications as read
    pub async fn mark_read(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications SET is_read = TRUE
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, task_id, notification_type, title, message,
                      is_read, email_sent, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Marks all of a user's notifications as read
    pub async fn mark_all_read(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Deletes one of the user's notifications
    pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_type_as_str() {
        assert_eq!(NotificationType::TaskAssignment.as_str(), "task_assignment");
        assert_eq!(NotificationType::StatusUpdate.as_str(), "status_update");
        assert_eq!(NotificationType::Comment.as_str(), "comment");
        assert_eq!(
            NotificationType::DueDateReminder.as_str(),
            "due_date_reminder"
        );
    }

    #[test]
    fn test_notification_type_serde_matches_db_strings() {
        let json = serde_json::to_string(&NotificationType::DueDateReminder).unwrap();
        assert_eq!(json, "\"due_date_reminder\"");
    }
}
