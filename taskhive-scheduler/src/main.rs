//! # TaskHive Scheduler
//!
//! Standalone process for the four time-driven jobs: daily digest, due-date
//! reminders, the weekly archive sweep, and nightly recurrence regeneration.
//! Runs against the same database as the API server; the API owns schema
//! migrations.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskhive-scheduler
//! ```

use std::sync::Arc;
use taskhive_scheduler::{config::Config, jobs::JobContext, runner::JobRunner};
use taskhive_shared::{
    db::pool,
    mailer::{Mailer, NoopMailer, SmtpMailer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskhive_scheduler=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "TaskHive Scheduler v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database_url.clone(),
        max_connections: config.max_connections,
        ..Default::default()
    })
    .await?;

    let mailer: Arc<dyn Mailer> = if config.email_enabled {
        Arc::new(SmtpMailer::new(config.smtp.clone())?)
    } else {
        tracing::info!("Email notifications disabled");
        Arc::new(NoopMailer)
    };

    let ctx = Arc::new(JobContext {
        db,
        mailer,
        frontend_url: config.frontend_url.clone(),
    });

    let runner = JobRunner::new(ctx);
    let shutdown = runner.shutdown_token();

    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutdown signal received, stopping jobs...");
        shutdown.cancel();
    });

    runner.run().await;

    tracing::info!("Scheduler stopped");
    Ok(())
}
