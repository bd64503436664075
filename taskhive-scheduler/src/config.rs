/// Configuration management for the scheduler
///
/// The scheduler reads the same environment as the API server but only the
/// variables it needs: the database, the SMTP relay, and the frontend URL
/// used in email links.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 5)
/// - `FRONTEND_URL`: base for task links in emails
/// - `ENABLE_EMAIL_NOTIFICATIONS`: "true" to send mail
/// - `SMTP_HOST` / `SMTP_PORT` / `SMTP_USERNAME` / `SMTP_PASSWORD` / `EMAIL_FROM`

use std::env;
use taskhive_shared::mailer::SmtpSettings;

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Frontend origin for email links
    pub frontend_url: String,

    /// Master switch for outgoing email
    pub email_enabled: bool,

    /// SMTP connection settings
    pub smtp: SmtpSettings,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is missing or a numeric variable
    /// fails to parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()?;

        let email_enabled = env::var("ENABLE_EMAIL_NOTIFICATIONS")
            .map(|v| v == "true")
            .unwrap_or(false);

        Ok(Self {
            database_url,
            max_connections,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            email_enabled,
            smtp: SmtpSettings {
                host: env::var("SMTP_HOST").unwrap_or_default(),
                port: env::var("SMTP_PORT")
                    .unwrap_or_else(|_| "587".to_string())
                    .parse::<u16>()?,
                username: env::var("SMTP_USERNAME").unwrap_or_default(),
                password: env::var("SMTP_PASSWORD").unwrap_or_default(),
                from: env::var("EMAIL_FROM")
                    .unwrap_or_else(|_| "TaskHive <noreply@taskhive.app>".to_string()),
            },
        })
    }
}
