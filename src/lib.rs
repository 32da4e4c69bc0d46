// First, declare the modules folder itself
mod modules;

// Re-export everything from modules for easier access
pub use modules::{
    auth,
    config,
    email,
    utils,
};

// Re-export commonly used types
pub use modules::auth::manager::{AccountManager, AuthError};
pub use modules::auth::password::{validate_password, PasswordPolicyError};
pub use modules::auth::store::{InMemoryMemberStore, Member, MemberStore, NewMember, StoreError};
pub use modules::auth::tokens::{issue_token, PendingToken, TokenPurpose};
pub use modules::config::SiteSettings;
pub use modules::email::audit::{AuditHandle, AuditStore, EmailAuditRecord, InMemoryAuditStore};
pub use modules::email::manager::SmtpCredentialManager;
pub use modules::email::service::{ContactForm, EmailError, EmailService};
pub use modules::email::smtp::{MailTransport, SmtpCredentials, SmtpMailer, TransportError};
pub use modules::email::templates::{
    mail_merge, standard_templates, EmailTemplate, InMemoryTemplateStore, TemplateStore,
};

// Constants
pub const RESET_TOKEN_DURATION: u64 = 43_200; // 12 hours
pub const TOKEN_LENGTH: usize = 32;

// Type aliases
pub type HmacSha256 = hmac::Hmac<sha2::Sha256>;
