use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::password::{
    generate_salt, hash_password, validate_password, verify_password, PasswordPolicyError,
};
use super::tokens::PendingToken;

/// A registered account with its credential and verification state.
/// The password credential itself lives with the store, never on the member.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Member {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub email_verified: bool,
    pub email_verified_at: Option<u64>,
    pub locked_out: bool,
    pub pending_token: Option<PendingToken>,
}

/// The details needed to create a member; everything else starts at defaults
#[derive(Debug, Clone)]
pub struct NewMember {
    pub username: String,
    pub email: String,
    pub display_name: String,
}

/// Uniqueness violations reported by a member store
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    #[error("a member with that email address already exists")]
    DuplicateEmail,
    #[error("a member with that username already exists")]
    DuplicateUsername,
}

/// Storage collaborator for members.
///
/// Implementors must enforce username/email uniqueness in `create`, and must
/// make token lookup and the subsequent `save` that clears a pending token
/// atomic relative to each other, so the same token cannot be consumed twice
/// by concurrent requests. This crate introduces no locking of its own.
pub trait MemberStore {
    fn find_by_username(&self, username: &str) -> Option<Member>;
    fn find_by_email(&self, email: &str) -> Option<Member>;
    fn find_by_pending_token(&self, token: &str) -> Option<Member>;
    fn create(&mut self, details: NewMember) -> Result<Member, StoreError>;
    fn save(&mut self, member: &Member);
    fn set_credential(&mut self, member: &Member, password: &str)
        -> Result<(), PasswordPolicyError>;
    fn verify_credential(&self, member: &Member, password: &str) -> bool;
}

/// Hashed credential held in a side table, keyed by member id
#[derive(Serialize, Deserialize, Debug, Clone)]
struct StoredCredential {
    salt: Vec<u8>,
    hash: String,
}

/// HashMap-backed member store. Ids are assigned sequentially; username and
/// email comparisons are case-insensitive so "Sam" and "sam" collide.
pub struct InMemoryMemberStore {
    members: HashMap<u64, Member>,
    credentials: HashMap<u64, StoredCredential>,
    next_id: u64,
}

impl Default for InMemoryMemberStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMemberStore {
    pub fn new() -> Self {
        Self {
            members: HashMap::new(),
            credentials: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl MemberStore for InMemoryMemberStore {
    fn find_by_username(&self, username: &str) -> Option<Member> {
        self.members
            .values()
            .find(|m| m.username.eq_ignore_ascii_case(username))
            .cloned()
    }

    fn find_by_email(&self, email: &str) -> Option<Member> {
        self.members
            .values()
            .find(|m| m.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    fn find_by_pending_token(&self, token: &str) -> Option<Member> {
        self.members
            .values()
            .find(|m| {
                m.pending_token
                    .as_ref()
                    .map(|p| p.value == token)
                    .unwrap_or(false)
            })
            .cloned()
    }

    fn create(&mut self, details: NewMember) -> Result<Member, StoreError> {
        // Email uniqueness is checked ahead of username uniqueness
        if self.find_by_email(&details.email).is_some() {
            return Err(StoreError::DuplicateEmail);
        }
        if self.find_by_username(&details.username).is_some() {
            return Err(StoreError::DuplicateUsername);
        }

        let member = Member {
            id: self.next_id,
            username: details.username.trim().to_string(),
            email: details.email.trim().to_string(),
            display_name: details.display_name,
            email_verified: false,
            email_verified_at: None,
            locked_out: false,
            pending_token: None,
        };
        self.next_id += 1;

        self.members.insert(member.id, member.clone());
        Ok(member)
    }

    fn save(&mut self, member: &Member) {
        self.members.insert(member.id, member.clone());
    }

    fn set_credential(
        &mut self,
        member: &Member,
        password: &str,
    ) -> Result<(), PasswordPolicyError> {
        validate_password(password)?;

        let salt = generate_salt();
        let hash = hash_password(password, &salt);
        self.credentials
            .insert(member.id, StoredCredential { salt, hash });
        Ok(())
    }

    fn verify_credential(&self, member: &Member, password: &str) -> bool {
        match self.credentials.get(&member.id) {
            Some(cred) => verify_password(password, &cred.salt, &cred.hash),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::auth::tokens::{issue_token, TokenPurpose};

    fn sam() -> NewMember {
        NewMember {
            username: "Sam".to_string(),
            email: "sam@example.com".to_string(),
            display_name: "Sam Smith".to_string(),
        }
    }

    #[test]
    fn test_member_creation_defaults() {
        let mut store = InMemoryMemberStore::new();

        let member = store.create(sam()).unwrap();
        assert_eq!(member.username, "Sam");
        assert_eq!(member.email, "sam@example.com");
        assert!(!member.email_verified);
        assert!(member.email_verified_at.is_none());
        assert!(!member.locked_out);
        assert!(member.pending_token.is_none());
    }

    #[test]
    fn test_uniqueness_enforcement() {
        let mut store = InMemoryMemberStore::new();
        store.create(sam()).unwrap();

        // Same email, different username - email wins the check order
        let result = store.create(NewMember {
            username: "OtherSam".to_string(),
            email: "SAM@example.com".to_string(),
            display_name: "Other".to_string(),
        });
        assert_eq!(result, Err(StoreError::DuplicateEmail));

        // Same username, different email
        let result = store.create(NewMember {
            username: "sam".to_string(),
            email: "other@example.com".to_string(),
            display_name: "Other".to_string(),
        });
        assert_eq!(result, Err(StoreError::DuplicateUsername));

        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_case_insensitive_lookups() {
        let mut store = InMemoryMemberStore::new();
        store.create(sam()).unwrap();

        assert!(store.find_by_username("sam").is_some());
        assert!(store.find_by_username("SAM").is_some());
        assert!(store.find_by_email("Sam@Example.com").is_some());
        assert!(store.find_by_username("samantha").is_none());
    }

    #[test]
    fn test_credential_roundtrip() {
        let mut store = InMemoryMemberStore::new();
        let member = store.create(sam()).unwrap();

        // No credential yet
        assert!(!store.verify_credential(&member, "Password123!"));

        store.set_credential(&member, "Password123!").unwrap();
        assert!(store.verify_credential(&member, "Password123!"));
        assert!(!store.verify_credential(&member, "WrongPassword1!"));
    }

    #[test]
    fn test_credential_policy_rejection() {
        let mut store = InMemoryMemberStore::new();
        let member = store.create(sam()).unwrap();

        let result = store.set_credential(&member, "weak");
        assert_eq!(result, Err(PasswordPolicyError::TooShort));

        // The rejected password must not have been stored
        assert!(!store.verify_credential(&member, "weak"));
    }

    #[test]
    fn test_find_by_pending_token() {
        let mut store = InMemoryMemberStore::new();
        let mut member = store.create(sam()).unwrap();

        let token = issue_token(TokenPurpose::EmailVerify);
        member.pending_token = Some(token.clone());
        store.save(&member);

        let found = store.find_by_pending_token(&token.value).unwrap();
        assert_eq!(found.id, member.id);
        assert!(store.find_by_pending_token("no-such-token").is_none());
    }
}
