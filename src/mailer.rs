use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;

use crate::config::MailConfig;
use crate::error::{AppError, Result};

/// Outgoing message built from a contact form submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub reply_to: String,
    pub subject: String,
    pub body: String,
}

/// Outbound mail seam
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a message to the site owner
    async fn send(&self, email: OutgoingEmail) -> Result<()>;
}

/// Relays through an authenticated SMTP server
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let username = config.username.clone().unwrap_or_default();
        let password = config.password.clone().unwrap_or_default();
        let contact = config.contact_email.clone().unwrap_or_default();

        let from: Mailbox = username
            .parse()
            .map_err(|e| AppError::Mail(format!("Invalid sender address {}: {}", username, e)))?;
        let to: Mailbox = contact
            .parse()
            .map_err(|e| AppError::Mail(format!("Invalid contact address {}: {}", contact, e)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| AppError::Mail(format!("Invalid SMTP relay {}: {}", config.smtp_host, e)))?
            .port(config.smtp_port)
            .credentials(Credentials::new(username, password))
            .build();

        Ok(Self { transport, from, to })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(email.subject)
            .header(ContentType::TEXT_PLAIN);

        // The submitter's address only goes into Reply-To; relays reject
        // foreign From addresses.
        match email.reply_to.parse::<Mailbox>() {
            Ok(reply_to) => builder = builder.reply_to(reply_to),
            Err(e) => tracing::warn!("Dropping unparsable reply-to {}: {}", email.reply_to, e),
        }

        let message = builder
            .body(email.body)
            .map_err(|e| AppError::Mail(format!("Failed to build message: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Mail(format!("SMTP delivery failed: {}", e)))?;

        tracing::info!("Contact email relayed to {}", self.to);
        Ok(())
    }
}

/// Used when no mail credentials are configured; every send fails
pub struct UnconfiguredMailer;

#[async_trait]
impl Mailer for UnconfiguredMailer {
    async fn send(&self, _email: OutgoingEmail) -> Result<()> {
        Err(AppError::Mail("Email delivery is not configured".to_string()))
    }
}

/// Pick the mailer for the given configuration
pub fn build_mailer(config: &MailConfig) -> Result<Arc<dyn Mailer>> {
    if !config.is_configured() {
        tracing::warn!("Mail credentials missing; contact form submissions will fail");
        return Ok(Arc::new(UnconfiguredMailer));
    }

    let mailer = SmtpMailer::new(config)?;
    tracing::info!("SMTP mailer ready via {}:{}", config.smtp_host, config.smtp_port);
    Ok(Arc::new(mailer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_mailer_refuses_to_send() {
        let mailer = build_mailer(&MailConfig::default()).unwrap();
        let result = mailer
            .send(OutgoingEmail {
                reply_to: "a@example.com".into(),
                subject: "s".into(),
                body: "b".into(),
            })
            .await;
        assert!(matches!(result, Err(AppError::Mail(_))));
    }

    #[test]
    fn invalid_contact_address_is_rejected_at_startup() {
        let config = MailConfig {
            username: Some("site@example.com".into()),
            password: Some("secret".into()),
            contact_email: Some("not an address".into()),
            ..MailConfig::default()
        };
        assert!(SmtpMailer::new(&config).is_err());
    }
}
