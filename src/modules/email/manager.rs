use keyring::Entry;
use thiserror::Error;

use super::smtp::SmtpCredentials;
use crate::modules::utils::time::get_current_timestamp;

/// Failures when reading or writing keyring-held SMTP credentials
#[derive(Error, Debug)]
pub enum CredentialStoreError {
    #[error("keyring access failed: {0}")]
    Keyring(String),
    #[error("stored credentials are malformed: {0}")]
    Malformed(String),
}

/// Keeps the SMTP account credentials in the operating system keyring, as a
/// JSON blob, so they never live in configuration files.
pub struct SmtpCredentialManager {
    keyring: Entry,
}

impl SmtpCredentialManager {
    pub fn new() -> Result<Self, CredentialStoreError> {
        let keyring = Entry::new("membergate", "smtp-credentials")
            .map_err(|e| CredentialStoreError::Keyring(e.to_string()))?;
        Ok(Self { keyring })
    }

    /// Store new SMTP credentials in the system keyring
    pub fn store_credentials(
        &self,
        username: &str,
        password: &str,
        host: &str,
        port: u16,
    ) -> Result<(), CredentialStoreError> {
        let credentials = SmtpCredentials {
            username: username.to_string(),
            password: password.to_string(),
            host: host.to_string(),
            port,
            last_updated: get_current_timestamp(),
        };

        let creds_json = serde_json::to_string(&credentials)
            .map_err(|e| CredentialStoreError::Malformed(e.to_string()))?;

        self.keyring
            .set_password(&creds_json)
            .map_err(|e| CredentialStoreError::Keyring(e.to_string()))
    }

    /// Retrieve stored SMTP credentials from the system keyring
    pub fn get_credentials(&self) -> Result<SmtpCredentials, CredentialStoreError> {
        let creds_json = self
            .keyring
            .get_password()
            .map_err(|e| CredentialStoreError::Keyring(e.to_string()))?;

        serde_json::from_str(&creds_json)
            .map_err(|e| CredentialStoreError::Malformed(e.to_string()))
    }

    /// Delete stored credentials from the system keyring
    pub fn delete_credentials(&self) -> Result<(), CredentialStoreError> {
        self.keyring
            .delete_password()
            .map_err(|e| CredentialStoreError::Keyring(e.to_string()))
    }
}
