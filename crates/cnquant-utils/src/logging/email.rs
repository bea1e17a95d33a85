//! Email notification for high-severity records.

use std::sync::Arc;

use crate::config::SmtpConfig;
use crate::error::{Error, Result};
use crate::level::LogLevel;
use crate::mail::{parse_mailbox, parse_recipients, MailMessage, Mailer, SmtpMailer};

use super::handler::{Handler, HandlerKind};
use super::record::{Formatter, LogRecord};

/// Sends one email per admitted record.
#[derive(Debug)]
pub struct EmailHandler {
    level: LogLevel,
    from: String,
    to: Vec<String>,
    subject: String,
    mailer: Arc<dyn Mailer>,
}

impl EmailHandler {
    /// Create a handler delivering through `mailer`.
    #[must_use]
    pub fn new(
        level: LogLevel,
        from: impl Into<String>,
        to: Vec<String>,
        subject: impl Into<String>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            level,
            from: from.into(),
            to,
            subject: subject.into(),
            mailer,
        }
    }

    /// Create a handler from SMTP settings.
    ///
    /// The SMTP user is the sender. When `mailer` is `None` an [`SmtpMailer`]
    /// is built for the configured relay.
    ///
    /// # Errors
    ///
    /// Returns an error if the sender or any recipient is invalid, if there
    /// are no recipients, or if the SMTP transport cannot be built.
    pub fn from_smtp(
        smtp: &SmtpConfig,
        subject: &str,
        level: LogLevel,
        mailer: Option<Arc<dyn Mailer>>,
    ) -> Result<Self> {
        parse_mailbox(&smtp.user)?;
        let to = parse_recipients(&smtp.email_to)?;
        if to.is_empty() {
            return Err(Error::InvalidAddress {
                address: smtp.email_to.clone(),
                message: "no recipients".to_string(),
            });
        }
        let mailer = match mailer {
            Some(mailer) => mailer,
            None => Arc::new(SmtpMailer::new(
                &smtp.host,
                smtp.port,
                &smtp.user,
                &smtp.password,
            )?),
        };
        Ok(Self::new(level, smtp.user.clone(), to, subject, mailer))
    }

    /// Recipients of every notification.
    #[must_use]
    pub fn recipients(&self) -> &[String] {
        &self.to
    }
}

impl Handler for EmailHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Email
    }

    fn level(&self) -> LogLevel {
        self.level
    }

    fn emit(&self, record: &LogRecord) -> Result<()> {
        let message = MailMessage {
            from: self.from.clone(),
            to: self.to.clone(),
            subject: self.subject.clone(),
            body: Formatter::Email.format(record),
        };
        self.mailer.send(&message)
    }
}
