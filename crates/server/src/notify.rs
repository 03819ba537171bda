//! Email delivery of rendered quotes over SMTP (STARTTLS). Missing sender
//! credentials surface at send time, where the orchestrator degrades the
//! run, never at startup.

use std::path::Path;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use quoteforge_core::config::EmailConfig;
use secrecy::ExposeSecret;
use tracing::info;

use crate::orchestrator::NotificationDispatcher;

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("email notifier is not configured: {0}")]
    Misconfigured(String),
    #[error("invalid email address: {0}")]
    InvalidAddress(String),
    #[error("could not read attachment: {0}")]
    Attachment(#[from] std::io::Error),
    #[error("smtp transport failure: {0}")]
    Transport(String),
}

pub struct EmailNotifier {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    sender_email: Option<String>,
    sender_name: String,
}

impl EmailNotifier {
    pub fn from_config(config: &EmailConfig) -> Result<Self, NotificationError> {
        let transport = match (&config.sender_email, &config.sender_password) {
            (Some(email), Some(password)) => {
                let transport =
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                        .map_err(|error| NotificationError::Transport(error.to_string()))?
                        .port(config.smtp_port)
                        .credentials(Credentials::new(
                            email.clone(),
                            password.expose_secret().to_owned(),
                        ))
                        .build();
                Some(transport)
            }
            _ => None,
        };

        Ok(Self {
            transport,
            sender_email: config.sender_email.clone(),
            sender_name: config.sender_name.clone(),
        })
    }
}

#[async_trait]
impl NotificationDispatcher for EmailNotifier {
    async fn send(
        &self,
        to_address: &str,
        client_name: &str,
        attachment: &Path,
        subject: &str,
        body: &str,
    ) -> Result<(), NotificationError> {
        let (transport, sender_email) = match (&self.transport, &self.sender_email) {
            (Some(transport), Some(sender_email)) => (transport, sender_email),
            _ => {
                return Err(NotificationError::Misconfigured(
                    "sender email and password must both be set".to_owned(),
                ));
            }
        };

        let from: Mailbox = format!("{} <{sender_email}>", self.sender_name)
            .parse()
            .map_err(|_| NotificationError::InvalidAddress(sender_email.clone()))?;
        let to: Mailbox = to_address
            .parse()
            .map_err(|_| NotificationError::InvalidAddress(to_address.to_owned()))?;

        let attachment_name = attachment
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("quote.pdf")
            .to_owned();
        let media_type = if attachment.extension().is_some_and(|ext| ext == "html") {
            "text/html"
        } else {
            "application/pdf"
        };
        let content_type = ContentType::parse(media_type)
            .map_err(|error| NotificationError::Transport(error.to_string()))?;
        let bytes = tokio::fs::read(attachment).await?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(body.to_owned()))
                    .singlepart(Attachment::new(attachment_name).body(bytes, content_type)),
            )
            .map_err(|error| NotificationError::Transport(error.to_string()))?;

        transport
            .send(message)
            .await
            .map_err(|error| NotificationError::Transport(error.to_string()))?;

        info!(to = %to_address, client = %client_name, "quote email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use quoteforge_core::config::EmailConfig;
    use secrecy::SecretString;

    use super::{EmailNotifier, NotificationError};
    use crate::orchestrator::NotificationDispatcher;

    fn config(with_credentials: bool) -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.example.com".to_owned(),
            smtp_port: 587,
            sender_email: with_credentials.then(|| "quotes@example.com".to_owned()),
            sender_password: with_credentials.then(|| SecretString::from("hunter2".to_owned())),
            sender_name: "Quoteforge".to_owned(),
        }
    }

    #[tokio::test]
    async fn missing_credentials_fail_at_send_time() {
        let notifier = EmailNotifier::from_config(&config(false)).unwrap();
        let result = notifier
            .send("client@example.com", "Client", Path::new("quote.pdf"), "subject", "body")
            .await;
        assert!(matches!(result, Err(NotificationError::Misconfigured(_))));
    }

    #[tokio::test]
    async fn invalid_recipient_is_rejected_before_any_io() {
        let notifier = EmailNotifier::from_config(&config(true)).unwrap();
        let result = notifier
            .send("not-an-address", "Client", Path::new("missing.pdf"), "subject", "body")
            .await;
        assert!(matches!(result, Err(NotificationError::InvalidAddress(_))));
    }
}
