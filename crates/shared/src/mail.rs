//! Mail service for transactional emails.
//!
//! Uses `lettre` for SMTP transport.

use std::time::Duration;

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType, transport::smtp::authentication::Credentials,
};
use thiserror::Error;

use crate::config::MailConfig;

/// Mail service errors.
#[derive(Debug, Error)]
pub enum MailError {
    /// Failed to build the email message.
    #[error("Failed to build email: {0}")]
    Build(String),
    /// Failed to send the email.
    #[error("Failed to send email: {0}")]
    Send(String),
    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Mail service for sending plain-text transactional emails.
#[derive(Clone)]
pub struct MailService {
    config: MailConfig,
}

impl MailService {
    /// Creates a new mail service.
    #[must_use]
    pub const fn new(config: MailConfig) -> Self {
        Self { config }
    }

    fn create_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
        let creds = Credentials::new(
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| MailError::Send(e.to_string()))?
            .port(self.config.smtp_port)
            .credentials(creds)
            .timeout(Some(Duration::from_secs(self.config.timeout_secs)))
            .build();

        Ok(transport)
    }

    /// Sends a plain-text email.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be built or sent.
    pub async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), MailError> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let email = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| MailError::InvalidAddress(format!("{e}")))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| MailError::InvalidAddress(format!("{e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| MailError::Build(e.to_string()))?;

        let transport = self.create_transport()?;
        transport
            .send(email)
            .await
            .map_err(|e| MailError::Send(e.to_string()))?;

        Ok(())
    }

    /// Returns the configured sender display name.
    #[must_use]
    pub fn from_name(&self) -> &str {
        &self.config.from_name
    }
}
