/// Category model and database operations
///
/// Categories are flat (no nesting) and shared across all users. Deleting a
/// category leaves its tasks uncategorized via `ON DELETE SET NULL`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Category model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    /// Unique category ID
    pub id: Uuid,

    /// Category name
    pub name: String,

    /// Hex color, e.g. "#228BE6"
    pub color: String,

    /// Optional icon (emoji or icon name)
    pub icon: Option<String>,

    /// User who created the category
    pub created_by: Option<Uuid>,

    /// When the category was created
    pub created_at: DateTime<Utc>,
}

/// Category joined with its creator's name, for list/detail responses
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryWithCreator {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub icon: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub created_by_name: Option<String>,
}

/// Input for creating a category
#[derive(Debug, Clone)]
pub struct CreateCategory {
    pub name: String,
    pub color: String,
    pub icon: Option<String>,
    pub created_by: Uuid,
}

/// Input for updating a category; only `Some` fields are written
#[derive(Debug, Clone, Default)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub color: Option<String>,
    /// `Some(None)` clears the icon
    pub icon: Option<Option<String>>,
}

impl UpdateCategory {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.color.is_none() && self.icon.is_none()
    }
}

impl Category {
    /// Creates a new category
    pub async fn create(pool: &PgPool, data: CreateCategory) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, color, icon, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, color, icon, created_by, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.color)
        .bind(data.icon)
        .bind(data.created_by)
        .fetch_one(pool)
        .await
    }

    /// Lists all categories with creator names, newest first
    pub async fn list(pool: &PgPool) -> Result<Vec<CategoryWithCreator>, sqlx::Error> {
        sqlx::query_as::<_, CategoryWithCreator>(
            r#"
            SELECT c.id, c.name, c.color, c.icon, c.created_by, c.created_at,
                   u.full_name AS created_by_name
            FROM categories c
            LEFT JOIN users u ON c.created_by = u.id
            ORDER BY c.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Finds a category (with creator name) by ID
    pub async fn find_by_id(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<CategoryWithCreator>, sqlx::Error> {
        sqlx::query_as::<_, CategoryWithCreator>(
            r#"
            SELECT c.id, c.name, c.color, c.icon, c.created_by, c.created_at,
                   u.full_name AS created_by_name
            FROM categories c
            LEFT JOIN users u ON c.created_by = u.id
            WHERE c.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Updates a category; only `Some` fields in `data` are written
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateCategory,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return sqlx::query_as::<_, Category>(
                "SELECT id, name, color, icon, created_by, created_at FROM categories WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(pool)
            .await;
        }

        let mut fields = Vec::new();
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            fields.push(format!("name = ${}", bind_count));
        }
        if data.color.is_some() {
            bind_count += 1;
            fields.push(format!("color = ${}", bind_count));
        }
        if data.icon.is_some() {
            bind_count += 1;
            fields.push(format!("icon = ${}", bind_count));
        }

        let query = format!(
            "UPDATE categories SET {} WHERE id = $1 \
             RETURNING id, name, color, icon, created_by, created_at",
            fields.join(", ")
        );

        let mut q = sqlx::query_as::<_, Category>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(color) = data.color {
            q = q.bind(color);
        }
        if let Some(icon) = data.icon {
            q = q.bind(icon);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a category
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_category_is_empty() {
        assert!(UpdateCategory::default().is_empty());
        assert!(!UpdateCategory {
            icon: Some(None),
            ..Default::default()
        }
        .is_empty());
    }
}
