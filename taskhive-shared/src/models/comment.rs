/// Comment model and database operations
///
/// Comments thread via `parent_comment_id`; the client builds the tree from
/// the flat, chronologically ordered list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Comment model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    /// Unique comment ID
    pub id: Uuid,

    /// Task the comment belongs to
    pub task_id: Uuid,

    /// Author (None if the account was removed)
    pub user_id: Option<Uuid>,

    /// Comment body
    pub content: String,

    /// Parent comment for threaded replies
    pub parent_comment_id: Option<Uuid>,

    /// When the comment was posted
    pub created_at: DateTime<Utc>,
}

/// Comment joined with its author's name and avatar
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CommentWithAuthor {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Option<Uuid>,
    pub content: String,
    pub parent_comment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub user_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Input for posting a comment
#[derive(Debug, Clone)]
pub struct CreateComment {
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub parent_comment_id: Option<Uuid>,
}

impl Comment {
    /// Posts a comment on a task
    pub async fn create(pool: &PgPool, data: CreateComment) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (task_id, user_id, content, parent_comment_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, task_id, user_id, content, parent_comment_id, created_at
            "#,
        )
        .bind(data.task_id)
        .bind(data.user_id)
        .bind(data.content)
        .bind(data.parent_comment_id)
        .fetch_one(pool)
        .await
    }

    /// Lists a task's comments oldest first, with author names
    pub async fn list_for_task(
        pool: &PgPool,
        task_id: Uuid,
    ) -> Result<Vec<CommentWithAuthor>, sqlx::Error> {
        sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            SELECT c.id, c.task_id, c.user_id, c.content, c.parent_comment_id, c.created_at,
                   u.full_name AS user_name, u.avatar_url
            FROM comments c
            LEFT JOIN users u ON c.user_id = u.id
            WHERE c.task_id = $1
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }
}
