//! # TaskHive Database Seeder
//!
//! One-shot tool that runs migrations and creates the bootstrap admin
//! account plus the default category set. Safe to re-run: every insert is
//! insert-if-missing.
//!
//! ## Usage
//!
//! ```bash
//! ADMIN_EMAIL=admin@taskhive.app ADMIN_PASSWORD=changeme \
//!     cargo run -p taskhive-api --bin taskhive-seed
//! ```

use taskhive_shared::db::{migrations::run_migrations, pool, seed::seed};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
    let admin_email =
        std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@taskhive.app".to_string());
    let admin_password = std::env::var("ADMIN_PASSWORD")
        .map_err(|_| anyhow::anyhow!("ADMIN_PASSWORD environment variable is required"))?;

    let db = pool::create_pool(pool::DatabaseConfig {
        url: database_url,
        max_connections: 2,
        ..Default::default()
    })
    .await?;

    run_migrations(&db).await?;
    seed(&db, &admin_email, &admin_password).await?;

    tracing::info!(email = %admin_email, "Seeding complete");
    Ok(())
}
