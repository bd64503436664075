/// User model and database operations
///
/// Passwords are stored as Argon2id hashes, never in plaintext. Deleting a
/// user is a deactivation (`is_active = false`); rows are never removed so
/// task history and comments keep their authors.
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::models::user::{User, CreateUser};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     username: "jdoe".to_string(),
///     email: "jdoe@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     full_name: "Jane Doe".to_string(),
/// }).await?;
///
/// let found = User::find_by_email(&pool, "jdoe@example.com").await?;
/// assert!(found.is_some());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, password_hash, full_name, avatar_url, role, \
                            is_active, created_at, last_login";

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access, including user administration
    Admin,

    /// Can create/archive tasks and manage categories
    Manager,

    /// Regular member, sees only assigned tasks
    User,
}

impl Role {
    /// Role as its database string
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "user" => Ok(Role::User),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// User model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Unique username
    pub username: String,

    /// Unique email address
    pub email: String,

    /// Argon2id password hash, never serialized into responses
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Display name
    pub full_name: String,

    /// Optional avatar URL
    pub avatar_url: Option<String>,

    /// Role string ("admin", "manager", "user")
    pub role: String,

    /// False once the account is deactivated
    pub is_active: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the user last logged in
    pub last_login: Option<DateTime<Utc>>,
}

/// User joined with their settings row, returned by `/me` and `GET /users/:id`
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub theme: Option<String>,
    pub email_notifications: Option<JsonValue>,
    pub timezone: Option<String>,
    pub language: Option<String>,
}

/// Recipient row for the daily digest job
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DigestRecipient {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    /// Argon2id hash, not the plaintext password
    pub password_hash: String,
    pub full_name: String,
}

/// Input for updating a user; only `Some` fields are written
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    /// `Some(None)` clears the avatar
    pub avatar_url: Option<Option<String>>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UpdateUser {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.full_name.is_none()
            && self.avatar_url.is_none()
            && self.role.is_none()
            && self.is_active.is_none()
    }
}

impl User {
    /// Creates a new user with the default `user` role
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, full_name)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(data.username)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.full_name)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email address
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Checks whether a user already exists with the given email or username
    ///
    /// Used by registration to return a 400 before attempting the insert.
    pub async fn exists_with_email_or_username(
        pool: &PgPool,
        email: &str,
        username: &str,
    ) -> Result<bool, sqlx::Error> {
        let row: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM users WHERE email = $1 OR username = $2")
                .bind(email)
                .bind(username)
                .fetch_optional(pool)
                .await?;

        Ok(row.is_some())
    }

    /// Finds a user joined with their settings row
    pub async fn find_profile(pool: &PgPool, id: Uuid) -> Result<Option<UserProfile>, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT u.id, u.username, u.email, u.full_name, u.avatar_url, u.role,
                   u.is_active, u.created_at, u.last_login,
                   s.theme, s.email_notifications, s.timezone, s.language
            FROM users u
            LEFT JOIN user_settings s ON u.id = s.user_id
            WHERE u.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Updates a user; only `Some` fields in `data` are written
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let mut fields = Vec::new();
        let mut bind_count = 1;

        if data.username.is_some() {
            bind_count += 1;
            fields.push(format!("username = ${}", bind_count));
        }
        if data.email.is_some() {
            bind_count += 1;
            fields.push(format!("email = ${}", bind_count));
        }
        if data.full_name.is_some() {
            bind_count += 1;
            fields.push(format!("full_name = ${}", bind_count));
        }
        if data.avatar_url.is_some() {
            bind_count += 1;
            fields.push(format!("avatar_url = ${}", bind_count));
        }
        if data.role.is_some() {
            bind_count += 1;
            fields.push(format!("role = ${}", bind_count));
        }
        if data.is_active.is_some() {
            bind_count += 1;
            fields.push(format!("is_active = ${}", bind_count));
        }

        let query = format!(
            "UPDATE users SET {} WHERE id = $1 RETURNING {USER_COLUMNS}",
            fields.join(", ")
        );

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(username) = data.username {
            q = q.bind(username);
        }
        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(full_name) = data.full_name {
            q = q.bind(full_name);
        }
        if let Some(avatar) = data.avatar_url {
            q = q.bind(avatar);
        }
        if let Some(role) = data.role {
            q = q.bind(role.as_str());
        }
        if let Some(active) = data.is_active {
            q = q.bind(active);
        }

        q.fetch_optional(pool).await
    }

    /// Replaces the stored password hash
    pub async fn update_password(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deactivates an account (soft delete)
    pub async fn deactivate(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Stamps the last login timestamp after a successful authentication
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists users with optional role/activity filters, newest first
    pub async fn list(
        pool: &PgPool,
        role: Option<&str>,
        is_active: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = format!("SELECT {USER_COLUMNS} FROM users WHERE TRUE");
        let mut bind_count = 0;

        if role.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND role = ${}", bind_count));
        }
        if is_active.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND is_active = ${}", bind_count));
        }

        query.push_str(&format!(
            " ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
            bind_count + 1,
            bind_count + 2
        ));

        let mut q = sqlx::query_as::<_, User>(&query);
        if let Some(role) = role {
            q = q.bind(role.to_string());
        }
        if let Some(active) = is_active {
            q = q.bind(active);
        }

        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Counts users matching the list filters
    pub async fn count(
        pool: &PgPool,
        role: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<i64, sqlx::Error> {
        let mut query = String::from("SELECT COUNT(*) FROM users WHERE TRUE");
        let mut bind_count = 0;

        if role.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND role = ${}", bind_count));
        }
        if is_active.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND is_active = ${}", bind_count));
        }

        let mut q = sqlx::query_as::<_, (i64,)>(&query);
        if let Some(role) = role {
            q = q.bind(role.to_string());
        }
        if let Some(active) = is_active {
            q = q.bind(active);
        }

        let (count,) = q.fetch_one(pool).await?;
        Ok(count)
    }

    /// Lists active users who opted into the daily digest email
    pub async fn list_digest_recipients(pool: &PgPool) -> Result<Vec<DigestRecipient>, sqlx::Error> {
        sqlx::query_as::<_, DigestRecipient>(
            r#"
            SELECT u.id, u.email, u.full_name
            FROM users u
            JOIN user_settings s ON u.id = s.user_id
            WHERE u.is_active = TRUE
              AND s.email_notifications->>'daily_digest' = 'true'
            "#,
        )
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        for role in [Role::Admin, Role::Manager, Role::User] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_update_user_is_empty() {
        assert!(UpdateUser::default().is_empty());

        let update = UpdateUser {
            full_name: Some("New Name".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            username: "jdoe".to_string(),
            email: "jdoe@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            full_name: "Jane Doe".to_string(),
            avatar_url: None,
            role: "user".to_string(),
            is_active: true,
            created_at: Utc::now(),
            last_login: None,
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(json.contains("jdoe"));
    }
}
