/// Per-user settings
///
/// One row per user, created at registration. Email notification preferences
/// are a JSONB object of booleans so the scheduler can filter recipients with
/// a single `->>` predicate.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// Email notification preference flags stored in `email_notifications`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailPrefs {
    /// Email when a task is assigned to me
    pub task_assigned: bool,

    /// Email when one of my tasks changes status
    pub status_update: bool,

    /// Email when someone comments on my task
    pub comment: bool,

    /// Email when a task of mine comes due within 24 hours
    pub due_date_reminder: bool,

    /// Daily morning summary email
    pub daily_digest: bool,
}

impl Default for EmailPrefs {
    fn default() -> Self {
        Self {
            task_assigned: true,
            status_update: true,
            comment: true,
            due_date_reminder: true,
            daily_digest: false,
        }
    }
}

/// User settings row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSettings {
    /// Owning user
    pub user_id: Uuid,

    /// UI theme ("light" or "dark")
    pub theme: String,

    /// Email notification preferences (see [`EmailPrefs`])
    pub email_notifications: JsonValue,

    /// IANA timezone name
    pub timezone: String,

    /// UI language code
    pub language: String,
}

/// Input for updating settings; only `Some` fields are written
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSettings {
    pub theme: Option<String>,
    pub email_notifications: Option<EmailPrefs>,
    pub timezone: Option<String>,
    pub language: Option<String>,
}

impl UpdateSettings {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.theme.is_none()
            && self.email_notifications.is_none()
            && self.timezone.is_none()
            && self.language.is_none()
    }
}

impl UserSettings {
    /// Creates the default settings row for a new user
    pub async fn create_default(pool: &PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO user_settings (user_id) VALUES ($1)")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Finds a user's settings row
    pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserSettings>(
            "SELECT user_id, theme, email_notifications, timezone, language \
             FROM user_settings WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Updates settings; only `Some` fields in `data` are written
    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        data: UpdateSettings,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_by_user(pool, user_id).await;
        }

        let mut fields = Vec::new();
        let mut bind_count = 1;

        if data.theme.is_some() {
            bind_count += 1;
            fields.push(format!("theme = ${}", bind_count));
        }
        if data.email_notifications.is_some() {
            bind_count += 1;
            fields.push(format!("email_notifications = ${}", bind_count));
        }
        if data.timezone.is_some() {
            bind_count += 1;
            fields.push(format!("timezone = ${}", bind_count));
        }
        if data.language.is_some() {
            bind_count += 1;
            fields.push(format!("language = ${}", bind_count));
        }

        let query = format!(
            "UPDATE user_settings SET {} WHERE user_id = $1 \
             RETURNING user_id, theme, email_notifications, timezone, language",
            fields.join(", ")
        );

        let mut q = sqlx::query_as::<_, UserSettings>(&query).bind(user_id);

        if let Some(theme) = data.theme {
            q = q.bind(theme);
        }
        if let Some(prefs) = data.email_notifications {
            q = q.bind(serde_json::to_value(prefs).unwrap_or_default());
        }
        if let Some(tz) = data.timezone {
            q = q.bind(tz);
        }
        if let Some(lang) = data.language {
            q = q.bind(lang);
        }

        q.fetch_optional(pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_prefs_defaults() {
        let prefs = EmailPrefs::default();
        assert!(prefs.task_assigned);
        assert!(prefs.due_date_reminder);
        assert!(!prefs.daily_digest);
    }

    #[test]
    fn test_email_prefs_matches_schema_default() {
        // The JSONB default in the migration must deserialize into EmailPrefs.
        let schema_default = serde_json::json!({
            "task_assigned": true,
            "status_update": true,
            "comment": true,
            "due_date_reminder": true,
            "daily_digest": false
        });

        let prefs: EmailPrefs = serde_json::from_value(schema_default).unwrap();
        assert!(!prefs.daily_digest);
    }

    #[test]
    fn test_update_settings_is_empty() {
        assert!(UpdateSettings::default().is_empty());
        assert!(!UpdateSettings {
            theme: Some("dark".to_string()),
            ..Default::default()
        }
        .is_empty());
    }
}
