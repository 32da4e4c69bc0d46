use serde::{Deserialize, Serialize};

/// Site-wide settings consumed by the notification dispatcher. An explicit
/// structure injected at construction; nothing here is read from ambient
/// global state.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SiteSettings {
    /// Absolute site root used to build verify/reset links, no trailing slash
    pub base_url: String,
    /// The From address on every outbound email
    pub from_address: String,
    /// Comma-separated admin recipients for contact-form notifications
    pub admin_addresses: String,
    /// When set, all outbound mail is redirected to `test_addresses`
    pub test_mode: bool,
    /// Comma-separated recipients that receive mail while in test mode
    pub test_addresses: String,
}

impl SiteSettings {
    /// Settings with notifications going to real recipients
    pub fn new(base_url: &str, from_address: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            from_address: from_address.to_string(),
            admin_addresses: String::new(),
            test_mode: false,
            test_addresses: String::new(),
        }
    }

    pub fn with_admin_addresses(mut self, admin_addresses: &str) -> Self {
        self.admin_addresses = admin_addresses.to_string();
        self
    }

    pub fn with_test_mode(mut self, test_addresses: &str) -> Self {
        self.test_mode = true;
        self.test_addresses = test_addresses.to_string();
        self
    }
}
