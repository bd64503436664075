/// Templated HTML email delivery
///
/// Handlers and scheduler jobs send through the [`Mailer`] trait so tests and
/// email-disabled deployments can swap in [`NoopMailer`]. Sends are awaited at
/// the call site, and callers log failures instead of propagating them; a
/// mail outage never fails a request or a scheduler iteration.

pub mod templates;

use async_trait::async_trait;
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::debug;

/// Error type for mail delivery
#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    /// A from/to address failed to parse
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// The message could not be assembled
    #[error("Failed to build message: {0}")]
    BuildError(String),

    /// SMTP-level failure
    #[error("Failed to send email: {0}")]
    TransportError(String),
}

/// A rendered email ready to send
#[derive(Debug, Clone)]
pub struct EmailMessage {
    /// Recipient address
    pub to: String,

    /// Subject line
    pub subject: String,

    /// HTML body
    pub html: String,
}

/// SMTP connection settings
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// From address on outgoing mail, e.g. "TaskHive <noreply@taskhive.app>"
    pub from: String,
}

/// Email sender abstraction
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends one email
    async fn send(&self, message: EmailMessage) -> Result<(), MailerError>;
}

/// SMTP mailer over STARTTLS
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    /// Creates an SMTP mailer from connection settings
    ///
    /// # Errors
    ///
    /// Returns `MailerError::TransportError` if the relay cannot be
    /// configured (e.g. invalid host name).
    pub fn new(settings: SmtpSettings) -> Result<Self, MailerError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| MailerError::TransportError(format!("SMTP relay setup failed: {}", e)))?
            .port(settings.port)
            .credentials(Credentials::new(settings.username, settings.password))
            .build();

        Ok(Self {
            transport,
            from: settings.from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailerError> {
        let email = Message::builder()
            .from(self
                .from
                .parse()
                .map_err(|_| MailerError::InvalidAddress(self.from.clone()))?)
            .to(message
                .to
                .parse()
                .map_err(|_| MailerError::InvalidAddress(message.to.clone()))?)
            .subject(&message.subject)
            .header(ContentType::TEXT_HTML)
            .body(message.html)
            .map_err(|e| MailerError::BuildError(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| MailerError::TransportError(e.to_string()))?;

        debug!(to = %message.to, subject = %message.subject, "Email sent");
        Ok(())
    }
}

/// Mailer that drops everything
///
/// Used when `ENABLE_EMAIL_NOTIFICATIONS` is off and in tests.
#[derive(Debug, Default)]
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailerError> {
        debug!(to = %message.to, subject = %message.subject, "Email notifications disabled, dropping email");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_mailer_accepts_anything() {
        let mailer = NoopMailer;
        let result = mailer
            .send(EmailMessage {
                to: "someone@example.com".to_string(),
                subject: "hi".to_string(),
                html: "<p>hi</p>".to_string(),
            })
            .await;
        assert!(result.is_ok());
    }
}
