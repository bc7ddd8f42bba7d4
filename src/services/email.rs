//! Outgoing email delivery.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

use crate::config::{EmailBackend, EmailConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<()>;
}

/// Builds the mailer selected by `email.backend`.
pub fn from_config(config: &EmailConfig) -> Result<Arc<dyn Mailer>> {
    let mailer: Arc<dyn Mailer> = match config.backend {
        EmailBackend::Log => Arc::new(LogMailer),
        EmailBackend::Smtp => Arc::new(SmtpMailer::new(config)?),
    };
    Ok(mailer)
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let sender: Mailbox = config
            .sender_email
            .parse()
            .with_context(|| format!("Invalid sender address: {}", config.sender_email))?;

        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)
                .with_context(|| format!("Invalid SMTP relay: {}", config.smtp_server))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_server)
        };

        let mut builder = builder.port(config.smtp_port);
        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            sender,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        let to: Mailbox = email
            .to
            .parse()
            .with_context(|| format!("Invalid recipient address: {}", email.to))?;

        let message = Message::builder()
            .from(self.sender.clone())
            .to(to)
            .subject(email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)
            .context("Failed to build email")?;

        self.transport
            .send(message)
            .await
            .context("SMTP delivery failed")?;

        debug!("Delivered email to {}", email.to);
        Ok(())
    }
}

/// Writes mail to the log. Used in development.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        info!(to = %email.to, subject = %email.subject, "Email (log backend)\n{}", email.body);
        Ok(())
    }
}

/// Keeps every message in memory so callers can inspect the outbox.
#[derive(Default)]
pub struct MemoryMailer {
    outbox: Mutex<Vec<OutgoingEmail>>,
    failing: AtomicBool,
}

impl MemoryMailer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every `send` fails without recording the message.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    #[must_use]
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent message addressed to `to`.
    #[must_use]
    pub fn last_to(&self, to: &str) -> Option<OutgoingEmail> {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|m| m.to == to)
            .cloned()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("Mail delivery disabled");
        }
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(to: &str) -> OutgoingEmail {
        OutgoingEmail {
            to: to.to_string(),
            subject: "Hello".to_string(),
            body: "Body".to_string(),
        }
    }

    #[tokio::test]
    async fn test_memory_mailer_records_messages() {
        let mailer = MemoryMailer::new();
        mailer.send(email("a@example.com")).await.unwrap();
        mailer.send(email("b@example.com")).await.unwrap();

        assert_eq!(mailer.sent().len(), 2);
        assert_eq!(mailer.last_to("b@example.com").unwrap().to, "b@example.com");
        assert!(mailer.last_to("c@example.com").is_none());
    }

    #[tokio::test]
    async fn test_memory_mailer_can_fail() {
        let mailer = MemoryMailer::new();
        mailer.set_failing(true);
        assert!(mailer.send(email("a@example.com")).await.is_err());
        assert!(mailer.sent().is_empty());
    }

    #[test]
    fn test_smtp_mailer_rejects_bad_sender() {
        let config = EmailConfig {
            backend: EmailBackend::Smtp,
            smtp_server: "smtp.example.com".to_string(),
            sender_email: "not an address".to_string(),
            ..EmailConfig::default()
        };
        assert!(SmtpMailer::new(&config).is_err());
    }

    #[test]
    fn test_from_config_defaults_to_log() {
        assert!(from_config(&EmailConfig::default()).is_ok());
    }
}
