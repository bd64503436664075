/// Task history (field-level audit trail)
///
/// One row per change: task creation and archiving get a bare action row,
/// updates get one row per changed field with the old and new values as text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Audit action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    Created,
    Updated,
    Archived,
}

impl HistoryAction {
    /// Action as its database string
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::Created => "created",
            HistoryAction::Updated => "updated",
            HistoryAction::Archived => "archived",
        }
    }
}

/// Task history row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskHistory {
    /// Unique history row ID
    pub id: Uuid,

    /// Task the change applies to
    pub task_id: Uuid,

    /// Who made the change
    pub user_id: Option<Uuid>,

    /// Action string (see [`HistoryAction`])
    pub action: String,

    /// Changed field name for `updated` rows
    pub field_changed: Option<String>,

    /// Previous value, stringified
    pub old_value: Option<String>,

    /// New value, stringified
    pub new_value: Option<String>,

    /// When the change happened
    pub timestamp: DateTime<Utc>,
}

/// History row joined with user and task names, for audit/dashboard views
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub field_changed: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub user_name: Option<String>,
    pub task_title: Option<String>,
}

impl TaskHistory {
    /// Records a bare action (created/archived)
    pub async fn record(
        pool: &PgPool,
        task_id: Uuid,
        user_id: Uuid,
        action: HistoryAction,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO task_history (task_id, user_id, action) VALUES ($1, $2, $3)")
            .bind(task_id)
            .bind(user_id)
            .bind(action.as_str())
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Records a field change
    pub async fn record_field_change(
        pool: &PgPool,
        task_id: Uuid,
        user_id: Uuid,
        field: &str,
        old_value: &str,
        new_value: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO task_history (task_id, user_id, action, field_changed, old_value, new_value)
            VALUES ($1, $2, 'updated', $3, $4, $5)
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .bind(field)
        .bind(old_value)
        .bind(new_value)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Lists a task's history newest first, with user names
    pub async fn list_for_task(
        pool: &PgPool,
        task_id: Uuid,
    ) -> Result<Vec<HistoryEntry>, sqlx::Error> {
        sqlx::query_as::<_, HistoryEntry>(
            r#"
            SELECT th.id, th.task_id, th.user_id, th.action, th.field_changed,
                   th.old_value, th.new_value, th.timestamp,
                   u.full_name AS user_name, NULL::text AS task_title
            FROM task_history th
            LEFT JOIN users u ON th.user_id = u.id
            WHERE th.task_id = $1
            ORDER BY th.timestamp DESC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    /// Lists recent activity on tasks the user created or is assigned to
    pub async fn recent_for_user(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<HistoryEntry>, sqlx::Error> {
        sqlx::query_as::<_, HistoryEntry>(
            r#"
            SELECT th.id, th.task_id, th.user_id, th.action, th.field_changed,
                   th.old_value, th.new_value, th.timestamp,
                   u.full_name AS user_name, t.title AS task_title
            FROM task_history th
            LEFT JOIN tasks t ON th.task_id = t.id
            LEFT JOIN users u ON th.user_id = u.id
            WHERE t.assigned_to = $1 OR t.created_by = $1
            ORDER BY th.timestamp DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_action_as_str() {
        assert_eq!(HistoryAction::Created.as_str(), "created");
        assert_eq!(HistoryAction::Updated.as_str(), "updated");
        assert_eq!(HistoryAction::Archived.as_str(), "archived");
    }
}
