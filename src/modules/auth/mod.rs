pub mod manager;
pub mod password;
pub mod store;
pub mod tokens;

// Re-export the main types and functions
pub use manager::{AccountManager, AuthError};
pub use password::{validate_password, PasswordPolicyError};
pub use store::{InMemoryMemberStore, Member, MemberStore, NewMember, StoreError};
pub use tokens::{issue_token, PendingToken, TokenPurpose};
