use thiserror::Error;

use super::password::PasswordPolicyError;
use super::store::{Member, MemberStore, NewMember, StoreError};
use super::tokens::{issue_token, TokenPurpose};
use crate::modules::email::audit::AuditStore;
use crate::modules::email::service::{EmailError, EmailService};
use crate::modules::email::smtp::MailTransport;
use crate::modules::email::templates::TemplateStore;
use crate::modules::utils::logging::log_auth_event;
use crate::modules::utils::time::get_current_timestamp;

/// Outcomes of the account lifecycle operations. Each is a distinct local
/// result, not a generic failure; nothing here is retried internally.
///
/// `Notification` is special: it is returned after the state change has
/// already been persisted (registration and password reset are not rolled
/// back when the trailing email fails), so the caller sees the dispatch
/// failure while the account mutation stands.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("there's already a user with that email address")]
    DuplicateEmail,
    #[error("there's already a user with that username, please choose a different one")]
    DuplicateUsername,
    #[error("cannot find that account in the system")]
    NotFound,
    #[error("that link is no longer valid")]
    InvalidToken,
    #[error("the link has expired, please request a new one")]
    ExpiredToken,
    #[error("this email address has already been verified")]
    AlreadyVerified,
    #[error("the account is locked, please use forgotten password to reset")]
    LockedOut,
    #[error("please verify your email before logging in")]
    NotVerified,
    #[error("the username/password provided is not correct")]
    InvalidCredentials,
    #[error("there's a problem with your password: {0}")]
    CredentialRejected(PasswordPolicyError),
    #[error(transparent)]
    Notification(#[from] EmailError),
}

impl From<StoreError> for AuthError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DuplicateEmail => AuthError::DuplicateEmail,
            StoreError::DuplicateUsername => AuthError::DuplicateUsername,
        }
    }
}

/// Owns the state-transition rules of a member account: registration, email
/// verification, login gating, password reset, and profile updates. Every
/// transition that matters to the member triggers a templated notification
/// through the email service.
///
/// Operations run synchronously to completion; concurrent requests racing on
/// the same member are serialized by the member store's own guarantees.
pub struct AccountManager<S, T, A, M>
where
    S: MemberStore,
    T: TemplateStore,
    A: AuditStore,
    M: MailTransport,
{
    members: S,
    emails: EmailService<T, A, M>,
}

impl<S, T, A, M> AccountManager<S, T, A, M>
where
    S: MemberStore,
    T: TemplateStore,
    A: AuditStore,
    M: MailTransport,
{
    pub fn new(members: S, emails: EmailService<T, A, M>) -> Self {
        Self { members, emails }
    }

    pub fn members(&self) -> &S {
        &self.members
    }

    pub fn members_mut(&mut self) -> &mut S {
        &mut self.members
    }

    pub fn emails(&self) -> &EmailService<T, A, M> {
        &self.emails
    }

    /// Register a new member and send the verification email.
    ///
    /// The member is created unverified with a pending verification token.
    /// If the verification email cannot be sent the member nevertheless
    /// stands; the dispatch failure comes back as `Notification`.
    pub fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Member, AuthError> {
        // Check if there is already a member with that email address
        if self.members.find_by_email(email).is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        // Check if the username is already in use
        if self.members.find_by_username(username).is_some() {
            return Err(AuthError::DuplicateUsername);
        }

        let mut member = self.members.create(NewMember {
            username: username.to_string(),
            email: email.to_string(),
            display_name: display_name.to_string(),
        })?;

        self.members
            .set_credential(&member, password)
            .map_err(AuthError::CredentialRejected)?;

        // Issue the verification token and store it on the member
        let token = issue_token(TokenPurpose::EmailVerify);
        member.pending_token = Some(token.clone());
        self.members.save(&member);

        log_auth_event("register", username, true, None);

        self.emails
            .send_verify_email_notification(&member.email, &token.value)?;

        Ok(member)
    }

    /// Consume an email verification token.
    pub fn verify_email(&mut self, token: &str) -> Result<Member, AuthError> {
        let mut member = self
            .members
            .find_by_pending_token(token)
            .ok_or(AuthError::InvalidToken)?;

        match member.pending_token.as_ref() {
            Some(pending) if pending.purpose == TokenPurpose::EmailVerify => {}
            _ => return Err(AuthError::InvalidToken),
        }

        if member.email_verified {
            // The token is spent either way
            member.pending_token = None;
            self.members.save(&member);
            log_auth_event("verify_email", &member.username, false, Some("already verified"));
            return Err(AuthError::AlreadyVerified);
        }

        member.email_verified = true;
        member.email_verified_at = Some(get_current_timestamp());
        member.pending_token = None;
        self.members.save(&member);

        log_auth_event("verify_email", &member.username, true, None);
        Ok(member)
    }

    /// Check a login attempt and return the member for session establishment.
    ///
    /// Lockout is checked before the credential so a locked account never
    /// leaks whether the password was correct.
    pub fn login(&self, username: &str, password: &str) -> Result<Member, AuthError> {
        let member = match self.members.find_by_username(username) {
            Some(member) => member,
            None => {
                log_auth_event("login", username, false, Some("unknown username"));
                return Err(AuthError::NotFound);
            }
        };

        if member.locked_out {
            log_auth_event("login", username, false, Some("locked out"));
            return Err(AuthError::LockedOut);
        }

        if !member.email_verified {
            log_auth_event("login", username, false, Some("email not verified"));
            return Err(AuthError::NotVerified);
        }

        if !self.members.verify_credential(&member, password) {
            log_auth_event("login", username, false, Some("bad credentials"));
            return Err(AuthError::InvalidCredentials);
        }

        log_auth_event("login", username, true, None);
        Ok(member)
    }

    /// Issue a password reset token and send the reset email.
    ///
    /// A fresh token replaces whatever token was pending before, of any
    /// purpose, so only the latest reset link works.
    pub fn request_password_reset(&mut self, email: &str) -> Result<(), AuthError> {
        let mut member = self
            .members
            .find_by_email(email)
            .ok_or(AuthError::NotFound)?;

        let token = issue_token(TokenPurpose::PasswordReset);
        member.pending_token = Some(token.clone());
        self.members.save(&member);

        log_auth_event(
            "request_password_reset",
            &member.username,
            true,
            Some("reset email sent"),
        );

        self.emails
            .send_reset_password_notification(&member.email, &token.value)?;

        Ok(())
    }

    /// Consume a password reset token and set the new credential.
    ///
    /// Clears any lockout, then confirms the change by email. An expired
    /// token stays on the member; requesting a fresh reset is the way out.
    pub fn reset_password(&mut self, token: &str, new_password: &str) -> Result<Member, AuthError> {
        let mut member = self
            .members
            .find_by_pending_token(token)
            .ok_or(AuthError::InvalidToken)?;

        let pending = match member.pending_token.clone() {
            Some(pending) if pending.purpose == TokenPurpose::PasswordReset => pending,
            _ => return Err(AuthError::InvalidToken),
        };

        if pending.is_expired(get_current_timestamp()) {
            log_auth_event("reset_password", &member.username, false, Some("token expired"));
            return Err(AuthError::ExpiredToken);
        }

        self.members
            .set_credential(&member, new_password)
            .map_err(AuthError::CredentialRejected)?;

        member.pending_token = None;
        member.locked_out = false;
        self.members.save(&member);

        log_auth_event("reset_password", &member.username, true, Some("password changed"));

        self.emails
            .send_password_changed_notification(&member.email)?;

        Ok(member)
    }

    /// Update the display name and email of an authenticated member
    pub fn update_profile(&mut self, member: &Member, display_name: &str, email: &str) -> Member {
        let mut updated = member.clone();
        updated.display_name = display_name.to_string();
        updated.email = email.to_string();
        self.members.save(&updated);

        log_auth_event("update_profile", &updated.username, true, None);
        updated
    }

    /// Change the password of an authenticated member. A policy rejection
    /// surfaces as `CredentialRejected` and nothing is mutated.
    pub fn change_password(&mut self, member: &Member, new_password: &str) -> Result<(), AuthError> {
        self.members
            .set_credential(member, new_password)
            .map_err(AuthError::CredentialRejected)?;

        log_auth_event("change_password", &member.username, true, None);
        Ok(())
    }
}
