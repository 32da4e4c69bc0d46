use thiserror::Error;

use super::audit::{AuditStore, EmailAuditRecord};
use super::smtp::{MailTransport, TransportError};
use super::templates::{mail_merge, TemplateStore};
use crate::modules::config::SiteSettings;
use crate::modules::utils::logging::log_email_event;
use crate::modules::utils::time::get_current_timestamp;

/// Failures of a notification dispatch. A `Transport` error means the audit
/// record was already persisted with `sent=false`; nothing is retried here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email template not found: {0}")]
    TemplateNotFound(String),
    #[error("there needs to be a from address in site settings")]
    MissingFromAddress,
    #[error("there needs to be a to address in site settings")]
    MissingRecipients,
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// A visitor's contact form submission, as handed over by the form layer
#[derive(Debug, Clone)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub comment: String,
}

/// The home to all outbound emails from the site.
///
/// Dispatch is synchronous and sequential: resolve the template, merge the
/// fields, redirect recipients when in test mode, write the audit record,
/// then hand the message to the transport and record the outcome.
pub struct EmailService<T, A, M>
where
    T: TemplateStore,
    A: AuditStore,
    M: MailTransport,
{
    templates: T,
    audit: A,
    transport: M,
    settings: SiteSettings,
}

impl<T, A, M> EmailService<T, A, M>
where
    T: TemplateStore,
    A: AuditStore,
    M: MailTransport,
{
    pub fn new(templates: T, audit: A, transport: M, settings: SiteSettings) -> Self {
        Self {
            templates,
            audit,
            transport,
            settings,
        }
    }

    pub fn settings(&self) -> &SiteSettings {
        &self.settings
    }

    pub fn audit_store(&self) -> &A {
        &self.audit
    }

    pub fn transport(&self) -> &M {
        &self.transport
    }

    /// Resolve a named template, merge the fields into both bodies, and send
    /// to the given comma-separated recipient list.
    pub fn send_notification(
        &mut self,
        template_name: &str,
        fields: &[(&str, &str)],
        to_addresses: &str,
    ) -> Result<(), EmailError> {
        let template = self
            .templates
            .find_by_name(template_name)
            .ok_or_else(|| EmailError::TemplateNotFound(template_name.to_string()))?;

        // Mail merge the supplied fields; anything not supplied stays put
        let mut html_content = template.html_content;
        let mut text_content = template.text_content;
        for (key, value) in fields {
            mail_merge(key, value, &mut html_content, &mut text_content);
        }

        let outcome = self.send_mail(to_addresses, template.subject, html_content, text_content);
        log_email_event(
            template_name,
            to_addresses,
            outcome.is_ok(),
            outcome.as_ref().err().map(|e| e.to_string()).as_deref(),
        );
        outcome
    }

    /// Send the email verification link to the new member
    pub fn send_verify_email_notification(
        &mut self,
        members_email: &str,
        verification_token: &str,
    ) -> Result<(), EmailError> {
        let url = format!(
            "{}/verify?token={}",
            self.settings.base_url, verification_token
        );
        self.send_notification("Verify Email", &[("verify-url", &url)], members_email)
    }

    /// Send the reset password link to the member
    pub fn send_reset_password_notification(
        &mut self,
        members_email: &str,
        reset_token: &str,
    ) -> Result<(), EmailError> {
        let url = format!(
            "{}/reset-password?token={}",
            self.settings.base_url, reset_token
        );
        self.send_notification("Reset Password", &[("reset-url", &url)], members_email)
    }

    /// Send a note to the member telling them their password has changed
    pub fn send_password_changed_notification(
        &mut self,
        members_email: &str,
    ) -> Result<(), EmailError> {
        self.send_notification("Password Changed", &[], members_email)
    }

    /// Send a contact form submission on to the site admins
    pub fn send_contact_notification_to_admin(
        &mut self,
        form: &ContactForm,
    ) -> Result<(), EmailError> {
        if self.settings.admin_addresses.is_empty() {
            return Err(EmailError::MissingRecipients);
        }
        let to_addresses = self.settings.admin_addresses.clone();

        self.send_notification(
            "New Contact Form Notification",
            &[
                ("name", &form.name),
                ("email", &form.email),
                ("comment", &form.comment),
            ],
            &to_addresses,
        )
    }

    /// Audit and send one composed email.
    ///
    /// The audit record is persisted before the transport attempt so a crash
    /// mid-send still leaves an "attempted, unconfirmed" trace.
    fn send_mail(
        &mut self,
        to_addresses: &str,
        mut subject: String,
        html_content: String,
        text_content: String,
    ) -> Result<(), EmailError> {
        if self.settings.from_address.is_empty() {
            return Err(EmailError::MissingFromAddress);
        }

        // In test mode every email goes to the test accounts instead, and the
        // subject keeps the original recipients visible for tracing
        let mut recipients = to_addresses.to_string();
        if self.settings.test_mode {
            recipients = self.settings.test_addresses.clone();
            subject = format!("{}(TEST MODE) - {}", subject, to_addresses);
        }

        let mut record = EmailAuditRecord {
            recipients: recipients.clone(),
            subject: subject.clone(),
            html_content: html_content.clone(),
            text_content: text_content.clone(),
            sent: false,
            sent_at: None,
            test_mode: self.settings.test_mode,
        };
        let handle = self.audit.create(record.clone());

        // One To entry per non-blank element of the comma-separated list
        let to_list: Vec<String> = recipients
            .split(',')
            .filter(|r| !r.is_empty())
            .map(String::from)
            .collect();

        match self.transport.send(
            &self.settings.from_address,
            &to_list,
            &subject,
            &html_content,
            &text_content,
        ) {
            Ok(()) => {
                record.sent = true;
                record.sent_at = Some(get_current_timestamp());
                self.audit.update(handle, record);
                Ok(())
            }
            Err(e) => {
                log::error!("Problem sending the email: {}", e);
                Err(EmailError::Transport(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::email::audit::InMemoryAuditStore;
    use crate::modules::email::templates::{
        standard_templates, EmailTemplate, InMemoryTemplateStore,
    };
    use std::cell::RefCell;

    /// Transport stand-in that records every send and can be told to fail
    struct RecordingTransport {
        sent: RefCell<Vec<SentMail>>,
        fail: bool,
    }

    #[derive(Debug, Clone)]
    struct SentMail {
        from: String,
        recipients: Vec<String>,
        subject: String,
        html_body: String,
        text_body: String,
    }

    impl RecordingTransport {
        fn new() -> Self {
            Self {
                sent: RefCell::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                sent: RefCell::new(Vec::new()),
                fail: true,
            }
        }
    }

    impl MailTransport for RecordingTransport {
        fn send(
            &self,
            from_address: &str,
            recipients: &[String],
            subject: &str,
            html_body: &str,
            text_body: &str,
        ) -> Result<(), TransportError> {
            if self.fail {
                return Err(TransportError("connection refused".to_string()));
            }
            self.sent.borrow_mut().push(SentMail {
                from: from_address.to_string(),
                recipients: recipients.to_vec(),
                subject: subject.to_string(),
                html_body: html_body.to_string(),
                text_body: text_body.to_string(),
            });
            Ok(())
        }
    }

    type TestService = EmailService<InMemoryTemplateStore, InMemoryAuditStore, RecordingTransport>;

    fn service(settings: SiteSettings, transport: RecordingTransport) -> TestService {
        EmailService::new(
            InMemoryTemplateStore::new(standard_templates()),
            InMemoryAuditStore::new(),
            transport,
            settings,
        )
    }

    fn live_settings() -> SiteSettings {
        SiteSettings::new("https://example.com", "noreply@example.com")
    }

    #[test]
    fn test_unknown_template_fails_without_an_audit_record() {
        let mut service = service(live_settings(), RecordingTransport::new());

        let result = service.send_notification("No Such Template", &[], "member@example.com");
        assert_eq!(
            result,
            Err(EmailError::TemplateNotFound("No Such Template".to_string()))
        );
        assert!(service.audit_store().is_empty());
    }

    #[test]
    fn test_verify_notification_merges_url_into_both_bodies() {
        let mut service = service(live_settings(), RecordingTransport::new());

        service
            .send_verify_email_notification("member@example.com", "abc123")
            .unwrap();

        let sent = service.transport().sent.borrow();
        let mail = &sent[0];
        assert_eq!(mail.from, "noreply@example.com");
        assert_eq!(mail.recipients, vec!["member@example.com".to_string()]);
        assert!(mail
            .html_body
            .contains("https://example.com/verify?token=abc123"));
        assert!(mail
            .text_body
            .contains("https://example.com/verify?token=abc123"));
        assert!(!mail.html_body.contains("##verify-url##"));
    }

    #[test]
    fn test_unsupplied_placeholders_stay_verbatim() {
        let mut service = service(live_settings(), RecordingTransport::new());
        service.templates.add(EmailTemplate {
            name: "Greeting".to_string(),
            subject: "Hi".to_string(),
            html_content: "<p>##name##, your link: ##verify-url##</p>".to_string(),
            text_content: "##name##, your link: ##verify-url##".to_string(),
        });

        service
            .send_notification(
                "Greeting",
                &[("verify-url", "https://x/verify?token=abc")],
                "member@example.com",
            )
            .unwrap();

        let sent = service.transport().sent.borrow();
        assert!(sent[0].html_body.contains("##name##"));
        assert!(sent[0].html_body.contains("https://x/verify?token=abc"));
        assert!(sent[0].text_body.contains("##name##"));
    }

    #[test]
    fn test_test_mode_redirects_recipients_and_marks_subject() {
        let settings = live_settings().with_test_mode("a@test,b@test");
        let mut service = service(settings, RecordingTransport::new());

        service
            .send_notification("Password Changed", &[], "real@user.com")
            .unwrap();

        // The transport never sees the real recipient
        let sent = service.transport().sent.borrow();
        assert_eq!(
            sent[0].recipients,
            vec!["a@test".to_string(), "b@test".to_string()]
        );

        // The audit record keeps the redirected recipients and the marker
        let records = service.audit_store().records();
        let record = records[0];
        assert_eq!(record.recipients, "a@test,b@test");
        assert!(record.test_mode);
        assert!(record.subject.contains("(TEST MODE) - real@user.com"));
        assert!(sent[0].subject.contains("(TEST MODE) - real@user.com"));
    }

    #[test]
    fn test_audit_record_is_written_before_the_transport_attempt() {
        let mut service = service(live_settings(), RecordingTransport::failing());

        let result = service.send_notification("Password Changed", &[], "member@example.com");
        assert!(matches!(result, Err(EmailError::Transport(_))));

        // Attempted but unconfirmed: the record exists with sent=false
        let records = service.audit_store().records();
        assert_eq!(records.len(), 1);
        assert!(!records[0].sent);
        assert!(records[0].sent_at.is_none());
        assert!(!records[0].test_mode);
    }

    #[test]
    fn test_successful_send_updates_the_audit_record() {
        let mut service = service(live_settings(), RecordingTransport::new());

        service
            .send_password_changed_notification("member@example.com")
            .unwrap();

        let records = service.audit_store().records();
        assert!(records[0].sent);
        assert!(records[0].sent_at.is_some());
    }

    #[test]
    fn test_blank_entries_in_the_recipient_list_are_dropped() {
        let mut service = service(live_settings(), RecordingTransport::new());

        service
            .send_notification("Password Changed", &[], "a@example.com,,b@example.com,")
            .unwrap();

        let sent = service.transport().sent.borrow();
        assert_eq!(
            sent[0].recipients,
            vec!["a@example.com".to_string(), "b@example.com".to_string()]
        );
    }

    #[test]
    fn test_missing_from_address_is_an_error() {
        let settings = SiteSettings::new("https://example.com", "");
        let mut service = service(settings, RecordingTransport::new());

        let result = service.send_password_changed_notification("member@example.com");
        assert_eq!(result, Err(EmailError::MissingFromAddress));
        assert!(service.audit_store().is_empty());
    }

    #[test]
    fn test_contact_notification_requires_admin_addresses() {
        let mut service = service(live_settings(), RecordingTransport::new());

        let form = ContactForm {
            name: "Visitor".to_string(),
            email: "visitor@example.com".to_string(),
            comment: "Hello there".to_string(),
        };
        assert_eq!(
            service.send_contact_notification_to_admin(&form),
            Err(EmailError::MissingRecipients)
        );
    }

    #[test]
    fn test_contact_notification_merges_form_fields_for_admins() {
        let settings = live_settings().with_admin_addresses("admin@example.com");
        let mut service = service(settings, RecordingTransport::new());

        let form = ContactForm {
            name: "Visitor".to_string(),
            email: "visitor@example.com".to_string(),
            comment: "Hello there".to_string(),
        };
        service.send_contact_notification_to_admin(&form).unwrap();

        let sent = service.transport().sent.borrow();
        assert_eq!(sent[0].recipients, vec!["admin@example.com".to_string()]);
        assert!(sent[0].text_body.contains("Visitor"));
        assert!(sent[0].text_body.contains("visitor@example.com"));
        assert!(sent[0].text_body.contains("Hello there"));
    }
}
