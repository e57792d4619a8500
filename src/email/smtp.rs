use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, Message, SendmailTransport, SmtpTransport, Transport};

use super::MailClient;
use crate::settings::{Secure, REDACTED};

/// Sender used when no FROM pair is configured.
pub const DEFAULT_FROM_ADDRESS: &str = "mailer@localhost";
pub const DEFAULT_FROM_NAME: &str = "smtp-console";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Hand the message to the local `sendmail` binary.
    Sendmail,
    Smtp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encryption {
    /// `SmtpTransport::starttls_relay`
    StartTls,
    /// `SmtpTransport::relay`
    ImplicitTls,
    /// `SmtpTransport::builder_dangerous`
    Plaintext,
}

/// How an SMTP transport will be built from the client's current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportPlan {
    pub encryption: Encryption,
    pub host: String,
    pub port: u16,
    pub with_credentials: bool,
}

/// lettre-backed mail client. Starts on the local sendmail transport and
/// switches to SMTP once `use_smtp` is called.
#[derive(Clone)]
pub struct SmtpClient {
    mode: Mode,
    host: String,
    username: String,
    password: String,
    port: u16,
    auth: bool,
    secure: Secure,
    debug: u8,
    from_address: String,
    from_name: String,
}

impl SmtpClient {
    pub fn new() -> Self {
        SmtpClient {
            mode: Mode::Sendmail,
            host: "localhost".to_string(),
            username: String::new(),
            password: String::new(),
            port: 25,
            auth: false,
            secure: Secure::None,
            debug: 0,
            from_address: DEFAULT_FROM_ADDRESS.to_string(),
            from_name: DEFAULT_FROM_NAME.to_string(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn from_address(&self) -> &str {
        &self.from_address
    }

    fn build_message(&self, to: &str, subject: &str, body: &str) -> Result<Message, String> {
        let to: Mailbox = to.parse().map_err(|e| format!("Invalid to address: {}", e))?;
        let from_addr: Address = self
            .from_address
            .parse()
            .map_err(|e| format!("Invalid from address: {}", e))?;
        let from_name = if self.from_name.is_empty() { None } else { Some(self.from_name.clone()) };

        Message::builder()
            .from(Mailbox::new(from_name, from_addr))
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| format!("Failed to build email: {}", e))
    }

    pub fn transport_plan(&self) -> TransportPlan {
        let encryption = match self.secure {
            Secure::Tls => Encryption::StartTls,
            Secure::Ssl => Encryption::ImplicitTls,
            Secure::None => Encryption::Plaintext,
        };
        TransportPlan {
            encryption,
            host: self.host.clone(),
            port: self.port,
            with_credentials: self.auth,
        }
    }

    fn smtp_transport(&self) -> Result<SmtpTransport, String> {
        let plan = self.transport_plan();
        let builder = match plan.encryption {
            Encryption::StartTls => SmtpTransport::starttls_relay(&plan.host)
                .map_err(|e| format!("SMTP relay error: {}", e))?,
            Encryption::ImplicitTls => SmtpTransport::relay(&plan.host)
                .map_err(|e| format!("SMTP relay error: {}", e))?,
            Encryption::Plaintext => SmtpTransport::builder_dangerous(&plan.host),
        };
        let builder = builder.port(plan.port);

        let builder = if plan.with_credentials {
            builder.credentials(Credentials::new(self.username.clone(), self.password.clone()))
        } else {
            builder
        };

        if self.debug >= 2 {
            log::info!("[smtp] {:?}", plan);
        }
        Ok(builder.build())
    }

    pub fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        let email = self.build_message(to, subject, body)?;

        if self.debug >= 1 {
            log::info!("[smtp] {} -> {} ({:?})", self.from_address, to, self.mode);
        }

        match self.mode {
            Mode::Sendmail => {
                SendmailTransport::new()
                    .send(&email)
                    .map_err(|e| format!("Sendmail error: {}", e))?;
            }
            Mode::Smtp => {
                let response = self
                    .smtp_transport()?
                    .send(&email)
                    .map_err(|e| format!("SMTP send error: {}", e))?;
                if self.debug >= 3 {
                    log::info!("[smtp] server replied {} {}", response.code(), response.message().collect::<Vec<_>>().join(" "));
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for SmtpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpClient")
            .field("mode", &self.mode)
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &REDACTED)
            .field("port", &self.port)
            .field("auth", &self.auth)
            .field("secure", &self.secure)
            .field("debug", &self.debug)
            .field("from_address", &self.from_address)
            .field("from_name", &self.from_name)
            .finish()
    }
}

impl MailClient for SmtpClient {
    fn use_smtp(&mut self) {
        self.mode = Mode::Smtp;
    }

    fn set_host(&mut self, host: &str) {
        self.host = host.to_string();
    }

    fn set_username(&mut self, username: &str) {
        self.username = username.to_string();
    }

    fn set_password(&mut self, password: &str) {
        self.password = password.to_string();
    }

    fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    fn set_auth(&mut self, enabled: bool) {
        self.auth = enabled;
    }

    fn set_secure(&mut self, secure: Secure) {
        self.secure = secure;
    }

    fn set_debug(&mut self, level: u8) {
        self.debug = level.min(4);
    }

    fn set_from(&mut self, address: &str, name: &str) {
        self.from_address = address.to_string();
        self.from_name = name.to_string();
    }
}
