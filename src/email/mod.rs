pub mod smtp;

use std::sync::Arc;

use lettre::Address;

use crate::error_log::ErrorLog;
use crate::settings::{Secure, SmtpSettings, REDACTED};

pub use smtp::SmtpClient;

pub const TEST_EMAIL_SUBJECT: &str = "Test Email from smtp-console";
pub const TEST_EMAIL_BODY: &str = "This is a test email.";

// ── Client capability ─────────────────────────────────

/// Setters a mail client exposes for transport configuration.
/// Implementors are trusted to accept any value; nothing is returned.
pub trait MailClient {
    /// Switch from the local mail transport to network SMTP.
    fn use_smtp(&mut self);
    fn set_host(&mut self, host: &str);
    fn set_username(&mut self, username: &str);
    fn set_password(&mut self, password: &str);
    fn set_port(&mut self, port: u16);
    fn set_auth(&mut self, enabled: bool);
    fn set_secure(&mut self, secure: Secure);
    /// Transcript verbosity, 0 (silent) to 4.
    fn set_debug(&mut self, level: u8);
    /// Default envelope sender.
    fn set_from(&mut self, address: &str, name: &str);
}

// ── Transport config ──────────────────────────────────

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    MissingRequired(Vec<&'static str>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired(_) => {
                write!(f, "Required SMTP constants are not defined in the SMTP configuration.")
            }
        }
    }
}

/// Fully resolved SMTP transport settings, ready to apply to a client.
#[derive(Clone, PartialEq)]
pub struct TransportConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub port: u16,
    pub auth: bool,
    pub secure: Secure,
    pub debug: u8,
    pub from: Option<(String, String)>,
}

impl std::fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &REDACTED)
            .field("port", &self.port)
            .field("auth", &self.auth)
            .field("secure", &self.secure)
            .field("debug", &self.debug)
            .field("from", &self.from)
            .finish()
    }
}

impl TransportConfig {
    pub fn apply<C: MailClient + ?Sized>(&self, client: &mut C) {
        client.use_smtp();
        client.set_host(&self.host);
        client.set_username(&self.username);
        client.set_password(&self.password);
        client.set_port(self.port);
        client.set_auth(self.auth);
        client.set_secure(self.secure);
        client.set_debug(self.debug);

        if let Some((address, name)) = &self.from {
            client.set_from(address, name);
        }
    }
}

/// Resolve settings into a transport config. Fails only when a required key is undefined.
pub fn build_transport_config(settings: &SmtpSettings) -> Result<TransportConfig, ConfigError> {
    let (host, username, password) = match (&settings.server, &settings.username, &settings.password) {
        (Some(h), Some(u), Some(p)) => (h.clone(), u.clone(), p.clone()),
        _ => return Err(ConfigError::MissingRequired(settings.missing_required())),
    };

    Ok(TransportConfig {
        host,
        username,
        password,
        port: settings.port(),
        auth: settings.auth(),
        secure: settings.secure(),
        debug: settings.debug(),
        from: settings
            .sender()
            .map(|(address, name)| (address.to_string(), name.to_string())),
    })
}

/// Apply settings to `client`, or record a diagnostic and leave it untouched.
pub fn configure<C: MailClient + ?Sized>(client: &mut C, settings: &SmtpSettings, errors: &ErrorLog) {
    match build_transport_config(settings) {
        Ok(config) => config.apply(client),
        Err(e) => {
            let ConfigError::MissingRequired(keys) = &e;
            log::warn!("SMTP not configured, missing: {}", keys.join(", "));
            errors.append(&e.to_string());
        }
    }
}

/// Failure hook for the send path.
pub fn on_mail_failure(errors: &ErrorLog, message: &str) {
    log::warn!("Mailer error: {}", message);
    errors.append(&format!("Mailer Error: {}", message));
}

/// Trim and validate a recipient address. Anything that does not parse comes back empty.
pub fn sanitize_email(raw: &str) -> String {
    raw.trim()
        .parse::<Address>()
        .map(|a| a.to_string())
        .unwrap_or_default()
}

// ── Sending ───────────────────────────────────────────

pub trait MailSender: Send + Sync {
    /// Deliver one plain-text message. Failures are reported through the
    /// failure hook, the return value only says whether it went out.
    fn send(&self, to: &str, subject: &str, body: &str) -> bool;
}

/// Sends through a freshly configured `SmtpClient` per message.
pub struct Mailer {
    settings: Arc<SmtpSettings>,
    errors: Arc<ErrorLog>,
}

impl Mailer {
    pub fn new(settings: Arc<SmtpSettings>, errors: Arc<ErrorLog>) -> Self {
        Mailer { settings, errors }
    }
}

impl MailSender for Mailer {
    fn send(&self, to: &str, subject: &str, body: &str) -> bool {
        let mut client = SmtpClient::new();
        configure(&mut client, &self.settings, &self.errors);

        match client.send(to, subject, body) {
            Ok(()) => {
                log::info!("[email] Sent '{}' to {}", subject, to);
                true
            }
            Err(e) => {
                on_mail_failure(&self.errors, &e);
                false
            }
        }
    }
}

/// Managed-state wrapper so routes can take any sender.
pub struct Outbox(pub Box<dyn MailSender>);
