/// Attachment metadata model
///
/// Rows describe files stored on local disk under the uploads directory; the
/// API serves them statically under `/uploads`. Deleting the row and the file
/// are separate steps owned by the handler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Attachment model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attachment {
    /// Unique attachment ID
    pub id: Uuid,

    /// Task the file belongs to
    pub task_id: Uuid,

    /// Original file name as uploaded
    pub file_name: String,

    /// Public URL path, e.g. "/uploads/7f3a....pdf"
    pub file_url: String,

    /// File size in bytes
    pub file_size: i64,

    /// MIME type reported by the client
    pub file_type: Option<String>,

    /// User who uploaded the file
    pub uploaded_by: Option<Uuid>,

    /// When the file was uploaded
    pub created_at: DateTime<Utc>,
}

/// Input for recording an uploaded file
#[derive(Debug, Clone)]
pub struct CreateAttachment {
    pub task_id: Uuid,
    pub file_name: String,
    pub file_url: String,
    pub file_size: i64,
    pub file_type: Option<String>,
    pub uploaded_by: Uuid,
}

impl Attachment {
    /// Records an uploaded file
    pub async fn create(pool: &PgPool, data: CreateAttachment) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Attachment>(
            r#"
            INSERT INTO attachments (task_id, file_name, file_url, file_size, file_type, uploaded_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, task_id, file_name, file_url, file_size, file_type, uploaded_by, created_at
            "#,
        )
        .bind(data.task_id)
        .bind(data.file_name)
        .bind(data.file_url)
        .bind(data.file_size)
        .bind(data.file_type)
        .bind(data.uploaded_by)
        .fetch_one(pool)
        .await
    }

    /// Finds an attachment scoped to its task
    pub async fn find_by_id_and_task(
        pool: &PgPool,
        id: Uuid,
        task_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Attachment>(
            "SELECT id, task_id, file_name, file_url, file_size, file_type, uploaded_by, created_at \
             FROM attachments WHERE id = $1 AND task_id = $2",
        )
        .bind(id)
        .bind(task_id)
        .fetch_optional(pool)
        .await
    }

    /// Deletes an attachment row
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM attachments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
