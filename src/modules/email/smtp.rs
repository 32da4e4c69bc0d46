use lettre::message::MultiPart;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::transport::smtp::PoolConfig;
use lettre::{Message, SmtpTransport, Transport};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::manager::SmtpCredentialManager;

/// Failure reported by a mail transport. The message is for logging; callers
/// branch on the error kind wrapping it, not on the text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Delivery collaborator. Implementations send one message to the already
/// resolved recipient list, with the HTML body as the primary representation
/// and the text body as the fallback. No retries are expected here.
pub trait MailTransport {
    fn send(
        &self,
        from_address: &str,
        recipients: &[String],
        subject: &str,
        html_body: &str,
        text_body: &str,
    ) -> Result<(), TransportError>;
}

/// Structure to hold SMTP credentials with metadata
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SmtpCredentials {
    // The email address/username for SMTP authentication
    pub username: String,
    // The password or app-specific password for SMTP
    pub password: String,
    // SMTP server hostname (e.g., smtp.gmail.com)
    pub host: String,
    // SMTP server port (typically 587 for TLS)
    pub port: u16,
    // When these credentials were last updated
    pub last_updated: u64,
}

/// lettre-backed SMTP implementation of `MailTransport`
pub struct SmtpMailer {
    credentials: SmtpCredentials,
}

impl SmtpMailer {
    pub fn new(credentials: SmtpCredentials) -> Self {
        Self { credentials }
    }

    /// Build a mailer from the credentials held in the OS keyring
    pub fn from_keyring() -> Result<Self, TransportError> {
        let manager =
            SmtpCredentialManager::new().map_err(|e| TransportError(e.to_string()))?;
        let credentials = manager
            .get_credentials()
            .map_err(|e| TransportError(e.to_string()))?;
        Ok(Self::new(credentials))
    }
}

impl MailTransport for SmtpMailer {
    fn send(
        &self,
        from_address: &str,
        recipients: &[String],
        subject: &str,
        html_body: &str,
        text_body: &str,
    ) -> Result<(), TransportError> {
        // Assemble the message with one To header per recipient
        let mut builder = Message::builder()
            .from(
                from_address
                    .parse()
                    .map_err(|e| TransportError(format!("Invalid from address: {}", e)))?,
            )
            .subject(subject);

        for recipient in recipients {
            builder = builder.to(recipient
                .parse()
                .map_err(|e| TransportError(format!("Invalid to address: {}", e)))?);
        }

        let email = builder
            .multipart(MultiPart::alternative_plain_html(
                text_body.to_string(),
                html_body.to_string(),
            ))
            .map_err(|e| TransportError(format!("Failed to create email: {}", e)))?;

        // Configure TLS parameters
        let tls_parameters = TlsParameters::builder(self.credentials.host.clone())
            .build()
            .map_err(|e| TransportError(format!("Failed to build TLS parameters: {}", e)))?;

        // Set up SMTP transport with explicit TLS configuration
        let mailer = SmtpTransport::relay(&self.credentials.host)
            .map_err(|e| TransportError(format!("Failed to create SMTP transport: {}", e)))?
            .credentials(Credentials::new(
                self.credentials.username.clone(),
                self.credentials.password.clone(),
            ))
            .port(self.credentials.port)
            .tls(Tls::Required(tls_parameters))
            .pool_config(PoolConfig::new().max_size(1))
            .timeout(Some(std::time::Duration::from_secs(10)))
            .build();

        match mailer.send(&email) {
            Ok(_) => Ok(()),
            Err(e) => Err(TransportError(format!("Failed to send email: {}", e))),
        }
    }
}
