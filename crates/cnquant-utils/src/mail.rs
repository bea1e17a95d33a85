//! Outgoing email for crash reports and critical log records.
//!
//! Delivery goes through the [`Mailer`] trait so callers (and tests) can
//! swap the SMTP transport for something else.

use std::fmt;
use std::sync::OnceLock;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};

/// SMTP relay used for crash reports when none is configured.
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

/// Submission port with STARTTLS.
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// A plain-text email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    /// Sender address.
    pub from: String,
    /// Recipient addresses.
    pub to: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

impl MailMessage {
    /// Value of the `To` header: recipients joined with `", "`.
    #[must_use]
    pub fn to_header(&self) -> String {
        self.to.join(", ")
    }

    /// Build the MIME message.
    ///
    /// # Errors
    ///
    /// Returns an error if any address is invalid or there are no recipients.
    pub fn to_message(&self) -> Result<Message> {
        let mut builder = Message::builder()
            .from(parse_mailbox(&self.from)?)
            .subject(self.subject.clone())
            .header(ContentType::TEXT_PLAIN);
        for recipient in &self.to {
            builder = builder.to(parse_mailbox(recipient)?);
        }
        Ok(builder.body(self.body.clone())?)
    }
}

/// Something that can deliver a [`MailMessage`].
pub trait Mailer: Send + Sync + fmt::Debug {
    /// Deliver the message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message could not be built or delivered.
    fn send(&self, message: &MailMessage) -> Result<()>;
}

/// Delivers mail through an authenticated STARTTLS SMTP relay.
pub struct SmtpMailer {
    host: String,
    port: u16,
    transport: SmtpTransport,
}

impl SmtpMailer {
    /// Create a mailer for `host:port` that logs in as `user`.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS parameters for `host` cannot be built.
    pub fn new(host: &str, port: u16, user: &str, password: &str) -> Result<Self> {
        let transport = SmtpTransport::starttls_relay(host)?
            .port(port)
            .credentials(Credentials::new(user.to_string(), password.to_string()))
            .build();
        Ok(Self {
            host: host.to_string(),
            port,
            transport,
        })
    }

    /// The relay host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The relay port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, message: &MailMessage) -> Result<()> {
        let email = message.to_message()?;
        debug!(
            "Sending mail '{}' to {} via {}:{}",
            message.subject,
            message.to_header(),
            self.host,
            self.port
        );
        self.transport.send(&email)?;
        Ok(())
    }
}

/// Parse a single address, optionally with a display name.
///
/// # Errors
///
/// Returns [`Error::InvalidAddress`] if the address is malformed.
pub fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|e| Error::InvalidAddress {
            address: address.to_string(),
            message: e.to_string(),
        })
}

fn separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r"\s*[,;]\s*").expect("separator pattern is valid"))
}

/// Split a comma- or semicolon-separated recipient list.
///
/// Empty entries are dropped; every remaining entry must be a valid address.
///
/// # Errors
///
/// Returns [`Error::InvalidAddress`] for the first malformed entry.
pub fn parse_recipients(list: &str) -> Result<Vec<String>> {
    separator()
        .split(list.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| parse_mailbox(entry).map(|_| entry.to_string()))
        .collect()
}
