use serde::{Deserialize, Serialize};

/// A named notification template with merge placeholders of the form `##key##`
/// in its HTML and plain-text bodies.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EmailTemplate {
    pub name: String,
    pub subject: String,
    pub html_content: String,
    pub text_content: String,
}

/// Lookup collaborator for published templates
pub trait TemplateStore {
    /// Exact, case-sensitive match on the template name; first match wins
    fn find_by_name(&self, name: &str) -> Option<EmailTemplate>;
}

/// Template store holding its templates in memory
#[derive(Default)]
pub struct InMemoryTemplateStore {
    templates: Vec<EmailTemplate>,
}

impl InMemoryTemplateStore {
    pub fn new(templates: Vec<EmailTemplate>) -> Self {
        Self { templates }
    }

    pub fn add(&mut self, template: EmailTemplate) {
        self.templates.push(template);
    }
}

impl TemplateStore for InMemoryTemplateStore {
    fn find_by_name(&self, name: &str) -> Option<EmailTemplate> {
        self.templates.iter().find(|t| t.name == name).cloned()
    }
}

/// Replace every `##key##` occurrence in both bodies with the given value.
/// Placeholders with no supplied value are left verbatim.
pub fn mail_merge(key: &str, value: &str, html_content: &mut String, text_content: &mut String) {
    let placeholder = format!("##{}##", key);
    *html_content = html_content.replace(&placeholder, value);
    *text_content = text_content.replace(&placeholder, value);
}

/// The stock template set used by the account lifecycle and contact form
pub fn standard_templates() -> Vec<EmailTemplate> {
    vec![
        EmailTemplate {
            name: "Verify Email".to_string(),
            subject: "Please verify your email address".to_string(),
            html_content: "<p>Welcome!</p>\
                <p>Please confirm your email address by clicking \
                <a href=\"##verify-url##\">this link</a>.</p>\
                <p>If you did not register, please ignore this email.</p>"
                .to_string(),
            text_content: "Welcome!\n\n\
                Please confirm your email address by visiting:\n\n\
                ##verify-url##\n\n\
                If you did not register, please ignore this email.\n"
                .to_string(),
        },
        EmailTemplate {
            name: "Reset Password".to_string(),
            subject: "Password reset request".to_string(),
            html_content: "<p>Hello,</p>\
                <p>A password reset was requested for your account. \
                <a href=\"##reset-url##\">Choose a new password</a>.</p>\
                <p>This link will expire in 12 hours. If you did not request \
                this reset, please ignore this email and ensure your account \
                is secure.</p>"
                .to_string(),
            text_content: "Hello,\n\n\
                A password reset was requested for your account. To choose a \
                new password, visit:\n\n\
                ##reset-url##\n\n\
                This link will expire in 12 hours. If you did not request \
                this reset, please ignore this email and ensure your account \
                is secure.\n"
                .to_string(),
        },
        EmailTemplate {
            name: "Password Changed".to_string(),
            subject: "Your password has been changed".to_string(),
            html_content: "<p>Hello,</p>\
                <p>This is a confirmation that the password for your account \
                has just been changed.</p>\
                <p>If this wasn't you, please contact us immediately.</p>"
                .to_string(),
            text_content: "Hello,\n\n\
                This is a confirmation that the password for your account has \
                just been changed.\n\n\
                If this wasn't you, please contact us immediately.\n"
                .to_string(),
        },
        EmailTemplate {
            name: "New Contact Form Notification".to_string(),
            subject: "There has been a contact form submitted".to_string(),
            html_content: "<p>A new contact form has been received from \
                ##name## (##email##).</p>\
                <p>Their comments were:</p>\
                <p>##comment##</p>"
                .to_string(),
            text_content: "A new contact form has been received from \
                ##name## (##email##).\n\n\
                Their comments were:\n\n\
                ##comment##\n"
                .to_string(),
        },
    ]
}
