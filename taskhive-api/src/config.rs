/// Configuration management for the API server
///
/// Configuration comes from environment variables (a `.env` file is honored
/// in development).
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `API_HOST` / `API_PORT`: bind address (default: 0.0.0.0:5000)
/// - `JWT_SECRET`: access token signing key, at least 32 chars (required)
/// - `ACCESS_TOKEN_TTL_HOURS`: access token lifetime (default: 24)
/// - `REFRESH_TOKEN_TTL_DAYS`: refresh token lifetime (default: 30)
/// - `FRONTEND_URL`: CORS origin and base for email links
/// - `ENABLE_EMAIL_NOTIFICATIONS`: "true" to send mail
/// - `SMTP_HOST` / `SMTP_PORT` / `SMTP_USERNAME` / `SMTP_PASSWORD` / `EMAIL_FROM`
/// - `UPLOAD_DIR`: attachment storage directory (default: ./uploads)
/// - `MAX_UPLOAD_BYTES`: multipart body limit (default: 10 MB)
/// - `RATE_LIMIT_WINDOW_SECS` / `RATE_LIMIT_MAX_REQUESTS`: default 900 / 100
/// - `PRODUCTION`: "true" enables HSTS and strict CORS

use serde::{Deserialize, Serialize};
use std::env;
use taskhive_shared::mailer::SmtpSettings;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT and refresh token configuration
    pub auth: AuthConfig,

    /// Email configuration
    pub email: EmailConfig,

    /// Attachment upload configuration
    pub uploads: UploadConfig,

    /// Rate limit configuration
    pub rate_limit: RateLimitConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Frontend origin for CORS and email links
    pub frontend_url: String,

    /// Production mode (HSTS, strict CORS)
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

/// Token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing, at least 32 chars
    pub jwt_secret: String,

    /// Access token lifetime in hours
    pub access_token_ttl_hours: i64,

    /// Refresh token lifetime in days
    pub refresh_token_ttl_days: i64,
}

/// Email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Master switch for outgoing email
    pub enabled: bool,

    /// SMTP relay host
    pub smtp_host: String,

    /// SMTP relay port
    pub smtp_port: u16,

    /// SMTP username
    pub smtp_username: String,

    /// SMTP password
    pub smtp_password: String,

    /// From address on outgoing mail
    pub from: String,
}

impl EmailConfig {
    /// SMTP settings for building the mailer
    pub fn smtp_settings(&self) -> SmtpSettings {
        SmtpSettings {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
            from: self.from.clone(),
        }
    }
}

/// Attachment upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Directory uploaded files are written to (served under /uploads)
    pub dir: String,

    /// Maximum multipart body size in bytes
    pub max_bytes: usize,
}

/// Rate limit configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Window length in seconds
    pub window_secs: u64,

    /// Requests allowed per window per client
    pub max_requests: u32,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` or `JWT_SECRET` are missing, the
    /// secret is shorter than 32 chars, or a numeric variable fails to parse.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        Ok(Self {
            api: ApiConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env_or("API_PORT", 5000)?,
                frontend_url: env::var("FRONTEND_URL")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
                production: env_or("PRODUCTION", false)?,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            auth: AuthConfig {
                jwt_secret,
                access_token_ttl_hours: env_or("ACCESS_TOKEN_TTL_HOURS", 24)?,
                refresh_token_ttl_days: env_or("REFRESH_TOKEN_TTL_DAYS", 30)?,
            },
            email: EmailConfig {
                enabled: env_or("ENABLE_EMAIL_NOTIFICATIONS", false)?,
                smtp_host: env::var("SMTP_HOST").unwrap_or_default(),
                smtp_port: env_or("SMTP_PORT", 587)?,
                smtp_username: env::var("SMTP_USERNAME").unwrap_or_default(),
                smtp_password: env::var("SMTP_PASSWORD").unwrap_or_default(),
                from: env::var("EMAIL_FROM")
                    .unwrap_or_else(|_| "TaskHive <noreply@taskhive.app>".to_string()),
            },
            uploads: UploadConfig {
                dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string()),
                max_bytes: env_or("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            },
            rate_limit: RateLimitConfig {
                window_secs: env_or("RATE_LIMIT_WINDOW_SECS", 900)?,
                max_requests: env_or("RATE_LIMIT_MAX_REQUESTS", 100)?,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn test_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                frontend_url: "http://localhost:3000".to_string(),
                production: false,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/taskhive_test".to_string(),
                max_connections: 5,
            },
            auth: AuthConfig {
                jwt_secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                access_token_ttl_hours: 24,
                refresh_token_ttl_days: 30,
            },
            email: EmailConfig {
                enabled: false,
                smtp_host: String::new(),
                smtp_port: 587,
                smtp_username: String::new(),
                smtp_password: String::new(),
                from: "TaskHive <noreply@taskhive.app>".to_string(),
            },
            uploads: UploadConfig {
                dir: "./uploads".to_string(),
                max_bytes: 10 * 1024 * 1024,
            },
            rate_limit: RateLimitConfig {
                window_secs: 900,
                max_requests: 100,
            },
        }
    }

    #[test]
    fn test_bind_address() {
        let config = test_config();
        assert_eq!(config.bind_address(), "127.0.0.1:5000");
    }

    #[test]
    fn test_smtp_settings_mapping() {
        let mut config = test_config();
        config.email.smtp_host = "smtp.example.com".to_string();

        let settings = config.email.smtp_settings();
        assert_eq!(settings.host, "smtp.example.com");
        assert_eq!(settings.port, 587);
    }
}
