use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::modules::utils::time::get_current_timestamp;
use crate::{RESET_TOKEN_DURATION, TOKEN_LENGTH};

/// What a pending token entitles its bearer to do
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    EmailVerify,
    PasswordReset,
}

/// A single-use bearer token stored against a member until consumed.
/// Possession of the value is the whole proof; there is no structure inside it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PendingToken {
    pub value: String,
    pub purpose: TokenPurpose,
    pub expires_at: Option<u64>,
}

impl PendingToken {
    /// A token expiring at exactly the current instant counts as expired
    pub fn is_expired(&self, current_time: u64) -> bool {
        matches!(self.expires_at, Some(expiry) if current_time >= expiry)
    }
}

/// Generate a fresh token for the given purpose.
///
/// Verification tokens stay valid until consumed; reset tokens carry a
/// 12 hour expiry. The caller is responsible for storing the token on the
/// member - issuing here persists nothing.
pub fn issue_token(purpose: TokenPurpose) -> PendingToken {
    // Generate cryptographically secure random token
    let value: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect();

    let expires_at = match purpose {
        TokenPurpose::EmailVerify => None,
        TokenPurpose::PasswordReset => Some(get_current_timestamp() + RESET_TOKEN_DURATION),
    };

    PendingToken {
        value,
        purpose,
        expires_at,
    }
}
