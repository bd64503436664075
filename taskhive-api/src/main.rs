//! # TaskHive API Server
//!
//! REST API for the TaskHive task manager: authentication, users, tasks,
//! categories, notifications, and dashboards over PostgreSQL.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskhive-api
//! ```

use std::sync::Arc;
use taskhive_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskhive_shared::{
    db::{migrations::run_migrations, pool},
    mailer::{Mailer, NoopMailer, SmtpMailer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskhive_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "TaskHive API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    run_migrations(&db).await?;

    let mailer: Arc<dyn Mailer> = if config.email.enabled {
        Arc::new(SmtpMailer::new(config.email.smtp_settings())?)
    } else {
        tracing::info!("Email notifications disabled");
        Arc::new(NoopMailer)
    };

    let bind_address = config.bind_address();
    let state = AppState::new(db, config, mailer);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutdown signal received, exiting...");
    })
    .await?;

    Ok(())
}
