pub mod audit;
pub mod manager;
pub mod service;
pub mod smtp;
pub mod templates;

// Re-export the main types and functions
pub use audit::{AuditHandle, AuditStore, EmailAuditRecord, InMemoryAuditStore};
pub use manager::SmtpCredentialManager;
pub use service::{ContactForm, EmailError, EmailService};
pub use smtp::{MailTransport, SmtpCredentials, SmtpMailer, TransportError};
pub use templates::{mail_merge, standard_templates, EmailTemplate, InMemoryTemplateStore, TemplateStore};
