/// First-run database seeding
///
/// Creates the bootstrap admin account, its settings row, and the default
/// category set. Every statement is insert-if-missing, so seeding an already
/// populated database is a no-op.

use crate::auth::password::hash_password;
use sqlx::PgPool;
use tracing::info;

/// Default categories created on first run: (name, color, icon)
const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Work", "#228BE6", "💼"),
    ("Personal", "#40C057", "👤"),
    ("Urgent", "#FA5252", "🚨"),
    ("Development", "#7950F2", "💻"),
    ("Meeting", "#FD7E14", "📅"),
    ("Research", "#20C997", "🔍"),
];

/// Seeds the admin user and default categories
///
/// # Arguments
///
/// * `pool` - Database connection pool
/// * `admin_email` - Email for the bootstrap admin account
/// * `admin_password` - Initial plaintext password (hashed before storage)
///
/// # Errors
///
/// Returns an error if password hashing or any insert fails.
pub async fn seed(pool: &PgPool, admin_email: &str, admin_password: &str) -> anyhow::Result<()> {
    let password_hash = hash_password(admin_password)?;

    let admin_id: Option<(uuid::Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (username, email, password_hash, full_name, role)
        VALUES ('admin', $1, $2, 'Admin User', 'admin')
        ON CONFLICT (email) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(admin_email)
    .bind(password_hash)
    .fetch_optional(pool)
    .await?;

    let Some((admin_id,)) = admin_id else {
        info!("Admin account already exists, skipping seed");
        return Ok(());
    };

    sqlx::query("INSERT INTO user_settings (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(admin_id)
        .execute(pool)
        .await?;

    for (name, color, icon) in DEFAULT_CATEGORIES {
        sqlx::query(
            r#"
            INSERT INTO categories (name, color, icon, created_by)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(name)
        .bind(color)
        .bind(icon)
        .bind(admin_id)
        .execute(pool)
        .await?;
    }

    info!(email = admin_email, "Seeded admin account and default categories");
    Ok(())
}
