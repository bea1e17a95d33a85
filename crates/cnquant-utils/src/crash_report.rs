//! Crash notification by email.
//!
//! [`send_crash_email`] is meant to be called from a top-level error handler;
//! [`install_panic_hook`] does the same for panics. Delivery problems are
//! logged and swallowed so reporting a crash can never cause a second one.

use std::fmt;
use std::panic;
use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::{error, info};

use crate::config::SmtpConfig;
use crate::error::Result;
use crate::mail::{parse_recipients, MailMessage, Mailer, SmtpMailer, DEFAULT_SMTP_PORT};

/// Timestamp layout used in crash subjects and bodies.
pub const CRASH_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H-%M-%S";

/// A crash of a named application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashReport {
    /// Application that crashed.
    pub app_name: String,
    /// Error message or stack trace.
    pub error_message: String,
    /// When the crash was reported.
    pub timestamp: DateTime<Local>,
}

impl CrashReport {
    /// Create a report stamped with the current local time.
    #[must_use]
    pub fn new(app_name: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            error_message: error_message.into(),
            timestamp: Local::now(),
        }
    }

    fn stamp(&self) -> String {
        self.timestamp.format(CRASH_TIMESTAMP_FORMAT).to_string()
    }

    /// `<app> crashed on <timestamp>`
    #[must_use]
    pub fn subject(&self) -> String {
        format!("{} crashed on {}", self.app_name, self.stamp())
    }

    /// `<app> crashed with error:\n\n<message> on <timestamp>`
    #[must_use]
    pub fn body(&self) -> String {
        format!(
            "{} crashed with error:\n\n{} on {}",
            self.app_name,
            self.error_message,
            self.stamp()
        )
    }

    /// The email sent for this report.
    #[must_use]
    pub fn to_mail(&self, sender: &str, receivers: &[String]) -> MailMessage {
        MailMessage {
            from: sender.to_string(),
            to: receivers.to_vec(),
            subject: self.subject(),
            body: self.body(),
        }
    }
}

/// Send `report` from `sender` to `receivers` through `mailer`.
///
/// Returns whether the email was sent. Failures are logged as
/// `Failed to send email: ...` and never propagated.
pub fn send_crash_email(
    report: &CrashReport,
    sender: &str,
    receivers: &[String],
    mailer: &dyn Mailer,
) -> bool {
    match mailer.send(&report.to_mail(sender, receivers)) {
        Ok(()) => {
            info!("Crash report for {} sent to {}", report.app_name, receivers.join(", "));
            true
        }
        Err(e) => {
            error!("Failed to send email: {e}");
            false
        }
    }
}

/// Sends crash reports for one application.
#[derive(Debug, Clone)]
pub struct CrashReporter {
    app_name: String,
    sender: String,
    receivers: Vec<String>,
    mailer: Arc<dyn Mailer>,
}

impl CrashReporter {
    /// Create a reporter using an explicit mailer.
    #[must_use]
    pub fn new(
        app_name: impl Into<String>,
        sender: impl Into<String>,
        receivers: Vec<String>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            sender: sender.into(),
            receivers,
            mailer,
        }
    }

    /// Create a reporter that logs in to the SMTP relay as `smtp.user`.
    ///
    /// An empty host falls back to `smtp.gmail.com`, a zero port to 587.
    ///
    /// # Errors
    ///
    /// Returns an error if the recipients are invalid or the SMTP transport
    /// cannot be built.
    pub fn from_smtp(app_name: &str, smtp: &SmtpConfig, recipients: &str) -> Result<Self> {
        let port = if smtp.port == 0 {
            DEFAULT_SMTP_PORT
        } else {
            smtp.port
        };
        let mailer = SmtpMailer::new(smtp.host_or_default(), port, &smtp.user, &smtp.password)?;
        Ok(Self::new(
            app_name,
            smtp.user.clone(),
            parse_recipients(recipients)?,
            Arc::new(mailer),
        ))
    }

    /// Application name used in reports.
    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Report `error_message` now. Returns whether the email was sent.
    pub fn report(&self, error_message: impl fmt::Display) -> bool {
        let report = CrashReport::new(&self.app_name, error_message.to_string());
        send_crash_email(&report, &self.sender, &self.receivers, self.mailer.as_ref())
    }
}

/// Report panics by email, then run the previously installed hook.
pub fn install_panic_hook(reporter: CrashReporter) {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!(" at {}:{}", l.file(), l.line()))
            .unwrap_or_default();
        reporter.report(format!("{}{location}", panic_message(info.payload())));
        previous(info);
    }));
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::mail::testing::RecordingMailer;

    fn report() -> CrashReport {
        CrashReport {
            app_name: "CQcalc".to_string(),
            error_message: "IndexError: list index out of range".to_string(),
            timestamp: Local.with_ymd_and_hms(2025, 1, 31, 9, 5, 7).unwrap(),
        }
    }

    #[test]
    fn test_subject_and_body_layout() {
        let report = report();
        assert_eq!(report.subject(), "CQcalc crashed on 2025-01-31 09-05-07");
        assert_eq!(
            report.body(),
            "CQcalc crashed with error:\n\nIndexError: list index out of range on 2025-01-31 09-05-07"
        );
    }

    #[test]
    fn test_to_mail_header() {
        let mail = report().to_mail(
            "bot@example.com",
            &["a@example.com".to_string(), "b@example.com".to_string()],
        );
        assert_eq!(mail.to_header(), "a@example.com, b@example.com");
        assert_eq!(mail.from, "bot@example.com");
    }

    #[test]
    fn test_send_crash_email_success() {
        let mailer = RecordingMailer::default();
        let sent = send_crash_email(
            &report(),
            "bot@example.com",
            &["a@example.com".to_string()],
            &mailer,
        );
        assert!(sent);
        let messages = mailer.sent();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].subject, "CQcalc crashed on 2025-01-31 09-05-07");
    }

    #[test]
    fn test_send_crash_email_failure_is_swallowed() {
        let mailer = RecordingMailer::failing();
        assert!(!send_crash_email(
            &report(),
            "bot@example.com",
            &["a@example.com".to_string()],
            &mailer,
        ));
    }

    #[test]
    fn test_reporter_report() {
        let mailer = RecordingMailer::default();
        let reporter = CrashReporter::new(
            "CQcase",
            "bot@example.com",
            vec!["a@example.com".to_string()],
            Arc::new(mailer.clone()),
        );
        assert!(reporter.report("segfault in viewer"));
        let messages = mailer.sent();
        assert!(messages[0].body.starts_with("CQcase crashed with error:\n\nsegfault in viewer on "));
        assert_eq!(reporter.app_name(), "CQcase");
    }

    #[test]
    fn test_reporter_from_smtp_defaults_host() {
        let smtp = SmtpConfig {
            user: "bot@example.com".to_string(),
            password: "app-password".to_string(),
            ..SmtpConfig::default()
        };
        let reporter = CrashReporter::from_smtp("CQall", &smtp, "a@example.com, b@example.com")
            .unwrap();
        assert_eq!(reporter.receivers.len(), 2);
        assert!(format!("{:?}", reporter.mailer).contains("smtp.gmail.com"));
    }

    #[test]
    fn test_reporter_from_smtp_rejects_bad_recipients() {
        let smtp = SmtpConfig::default();
        assert!(CrashReporter::from_smtp("CQall", &smtp, "not-an-address").is_err());
    }

    #[test]
    fn test_panic_hook_sends_report() {
        let mailer = RecordingMailer::default();
        let reporter = CrashReporter::new(
            "CQcase",
            "bot@example.com",
            vec!["a@example.com".to_string()],
            Arc::new(mailer.clone()),
        );

        let saved = panic::take_hook();
        install_panic_hook(reporter);
        let result = panic::catch_unwind(|| panic!("reference genome missing"));
        drop(panic::take_hook());
        panic::set_hook(saved);

        assert!(result.is_err());
        let sent: Vec<MailMessage> = mailer
            .sent()
            .into_iter()
            .filter(|m| m.body.contains("reference genome missing"))
            .collect();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].subject.starts_with("CQcase crashed on "));
        assert!(sent[0]
            .body
            .starts_with("CQcase crashed with error:\n\nreference genome missing at "));
        assert!(sent[0].body.contains("crash_report.rs:"));
        assert_eq!(sent[0].to, vec!["a@example.com".to_string()]);
    }

    #[test]
    fn test_panic_message_payloads() {
        let static_payload: Box<dyn std::any::Any + Send> = Box::new("static");
        assert_eq!(panic_message(static_payload.as_ref()), "static");
        let owned_payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned_payload.as_ref()), "owned");
        let other: Box<dyn std::any::Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(other.as_ref()), "panic with non-string payload");
    }
}
