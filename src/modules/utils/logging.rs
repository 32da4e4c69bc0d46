use env_logger::{Builder, WriteStyle};
use log::{error, info, warn, LevelFilter};
use std::fs::OpenOptions;

use super::time::{format_timestamp, get_current_timestamp};

/// Initialize the logging system with both file and console output
pub fn initialize_logging() -> Result<(), Box<dyn std::error::Error>> {
    // Create or append to log file with proper permissions
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("application.log")?;

    // Configure the logging system
    Builder::new()
        // Set default log level
        .filter_level(LevelFilter::Info)
        // Enable timestamps
        .format_timestamp_secs()
        // Enable module path in logs
        .format_module_path(true)
        // Set colored output for console
        .write_style(WriteStyle::Auto)
        // Write to both file and stderr
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();

    info!("Logging system initialized");
    Ok(())
}

/// Helper function to format sensitive data for logging
fn format_sensitive(text: &str) -> String {
    if text.len() <= 4 {
        return "*".repeat(text.len());
    }
    format!("{}***{}", &text[0..2], &text[text.len() - 2..])
}

/// Add structured logging for account lifecycle events
pub fn log_auth_event(event_type: &str, username: &str, success: bool, details: Option<&str>) {
    let timestamp = format_timestamp(get_current_timestamp());
    if success {
        info!(
            "Auth event: type={}, user={}, success=true, timestamp={}, details={:?}",
            event_type,
            format_sensitive(username),
            timestamp,
            details
        );
    } else {
        warn!(
            "Auth event: type={}, user={}, success=false, timestamp={}, details={:?}",
            event_type,
            format_sensitive(username),
            timestamp,
            details
        );
    }
}

/// Add structured logging for notification dispatches
pub fn log_email_event(template: &str, recipients: &str, success: bool, details: Option<&str>) {
    let timestamp = format_timestamp(get_current_timestamp());
    if success {
        info!(
            "Email event: template={}, to={}, success=true, timestamp={}, details={:?}",
            template,
            format_sensitive(recipients),
            timestamp,
            details
        );
    } else {
        error!(
            "Email event: template={}, to={}, success=false, timestamp={}, details={:?}",
            template,
            format_sensitive(recipients),
            timestamp,
            details
        );
    }
}
