use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Default config file, looked up relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "smtp.toml";

/// Env var that points at an alternative config file.
pub const CONFIG_PATH_ENV: &str = "SMTP_CONFIG";

pub const DEFAULT_AUTH: bool = true;
pub const DEFAULT_SECURE: Secure = Secure::Tls;
pub const DEFAULT_PORT: u16 = 587;
pub const DEFAULT_DEBUG: u8 = 0;

// ── Keys ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    Server,
    Username,
    Password,
    Auth,
    Secure,
    Port,
    Debug,
    FromAddress,
    FromName,
}

impl SettingKey {
    pub const ALL: [SettingKey; 9] = [
        Self::Server,
        Self::Username,
        Self::Password,
        Self::Auth,
        Self::Secure,
        Self::Port,
        Self::Debug,
        Self::FromAddress,
        Self::FromName,
    ];

    pub const REQUIRED: [SettingKey; 3] = [Self::Server, Self::Username, Self::Password];

    /// Name as written in the environment.
    pub fn env_name(&self) -> &'static str {
        match self {
            Self::Server => "SMTP_SERVER",
            Self::Username => "SMTP_USERNAME",
            Self::Password => "SMTP_PASSWORD",
            Self::Auth => "SMTP_AUTH",
            Self::Secure => "SMTP_SECURE",
            Self::Port => "SMTP_PORT",
            Self::Debug => "SMTP_DEBUG",
            Self::FromAddress => "SMTP_FROM",
            Self::FromName => "SMTP_NAME",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Text(String),
    Flag(bool),
    Number(i64),
}

impl SettingValue {
    /// Loose truthiness, used for "Not set" display and paired-field checks.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Text(s) => !s.is_empty() && s != "0",
            Self::Flag(b) => *b,
            Self::Number(n) => *n != 0,
        }
    }
}

impl std::fmt::Display for SettingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::Flag(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

// ── Security mode ─────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Secure {
    /// STARTTLS upgrade on a plaintext connection.
    Tls,
    /// Implicit TLS from the first byte.
    Ssl,
    None,
}

impl Secure {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "tls" => Some(Self::Tls),
            "ssl" => Some(Self::Ssl),
            "" => Some(Self::None),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tls => "tls",
            Self::Ssl => "ssl",
            Self::None => "",
        }
    }
}

// ── Errors ────────────────────────────────────────────

#[derive(Debug, PartialEq)]
pub enum SettingsError {
    Read(String),
    Parse(String),
    Invalid { key: &'static str, value: String, reason: &'static str },
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(e) => write!(f, "failed to read SMTP config: {}", e),
            Self::Parse(e) => write!(f, "failed to parse SMTP config: {}", e),
            Self::Invalid { key, value, reason } => {
                write!(f, "invalid value '{}' for {}: {}", value, key, reason)
            }
        }
    }
}

// ── Settings ──────────────────────────────────────────

/// SMTP settings as defined by the operator. `None` means "not defined";
/// defaults are applied on resolution, never stored.
#[derive(Clone, Default, PartialEq)]
pub struct SmtpSettings {
    pub server: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub auth: Option<bool>,
    pub secure: Option<Secure>,
    pub port: Option<u16>,
    pub debug: Option<u8>,
    pub from_address: Option<String>,
    pub from_name: Option<String>,
}

/// Placeholder printed instead of secrets in `Debug` output.
pub const REDACTED: &str = "********";

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("server", &self.server)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .field("auth", &self.auth)
            .field("secure", &self.secure)
            .field("port", &self.port)
            .field("debug", &self.debug)
            .field("from_address", &self.from_address)
            .field("from_name", &self.from_name)
            .finish()
    }
}

/// On-disk shape of `smtp.toml`. Loosely typed so that bad values produce
/// a readable `SettingsError` instead of a serde message.
#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SmtpFile {
    server: Option<String>,
    username: Option<String>,
    password: Option<String>,
    auth: Option<toml::Value>,
    secure: Option<String>,
    port: Option<toml::Value>,
    debug: Option<toml::Value>,
    from_address: Option<String>,
    from_name: Option<String>,
}

fn toml_scalar(v: toml::Value) -> String {
    match v {
        toml::Value::String(s) => s,
        other => other.to_string(),
    }
}

impl SmtpSettings {
    /// Build settings from the config file (if any) overlaid with `SMTP_*` env vars.
    pub fn load() -> Result<Self, SettingsError> {
        let base = Self::from_file(std::env::var(CONFIG_PATH_ENV).ok().as_deref())?;

        let env: HashMap<String, String> = SettingKey::ALL
            .iter()
            .filter_map(|k| std::env::var(k.env_name()).ok().map(|v| (k.env_name().to_string(), v)))
            .collect();
        base.with_overrides(&env)
    }

    /// Read the config file. An explicit path (from `SMTP_CONFIG`) must exist;
    /// the default `smtp.toml` is optional.
    pub fn from_file(explicit: Option<&str>) -> Result<Self, SettingsError> {
        let path = explicit.unwrap_or(DEFAULT_CONFIG_FILE);
        if !Path::new(path).exists() {
            if explicit.is_some() {
                return Err(SettingsError::Read(format!("{} does not exist", path)));
            }
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::Read(format!("{}: {}", path, e)))?;
        log::info!("Loaded SMTP settings from {}", path);
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, SettingsError> {
        let file: SmtpFile = toml::from_str(raw).map_err(|e| SettingsError::Parse(e.to_string()))?;
        let mut pairs: HashMap<String, String> = HashMap::new();
        let mut put = |key: SettingKey, v: Option<String>| {
            if let Some(v) = v {
                pairs.insert(key.env_name().to_string(), v);
            }
        };
        put(SettingKey::Server, file.server);
        put(SettingKey::Username, file.username);
        put(SettingKey::Password, file.password);
        put(SettingKey::Auth, file.auth.map(toml_scalar));
        put(SettingKey::Secure, file.secure);
        put(SettingKey::Port, file.port.map(toml_scalar));
        put(SettingKey::Debug, file.debug.map(toml_scalar));
        put(SettingKey::FromAddress, file.from_address);
        put(SettingKey::FromName, file.from_name);
        Self::default().with_overrides(&pairs)
    }

    /// Build settings from `SMTP_*` name/value pairs. Unknown names are ignored.
    pub fn from_pairs(pairs: &HashMap<String, String>) -> Result<Self, SettingsError> {
        Self::default().with_overrides(pairs)
    }

    /// Returns a copy with every recognized pair in `pairs` applied on top.
    pub fn with_overrides(mut self, pairs: &HashMap<String, String>) -> Result<Self, SettingsError> {
        for key in SettingKey::ALL {
            if let Some(value) = pairs.get(key.env_name()) {
                self.define(key, value)?;
            }
        }
        Ok(self)
    }

    fn define(&mut self, key: SettingKey, value: &str) -> Result<(), SettingsError> {
        let invalid = |reason: &'static str| SettingsError::Invalid {
            key: key.env_name(),
            value: value.to_string(),
            reason,
        };
        match key {
            SettingKey::Server => self.server = Some(value.to_string()),
            SettingKey::Username => self.username = Some(value.to_string()),
            SettingKey::Password => self.password = Some(value.to_string()),
            SettingKey::FromAddress => self.from_address = Some(value.to_string()),
            SettingKey::FromName => self.from_name = Some(value.to_string()),
            SettingKey::Auth => {
                let flag = match value.trim().to_lowercase().as_str() {
                    "true" | "1" | "yes" | "on" => true,
                    "false" | "0" | "no" | "off" | "" => false,
                    _ => return Err(invalid("expected a boolean")),
                };
                self.auth = Some(flag);
            }
            SettingKey::Secure => {
                self.secure = Some(Secure::parse(value).ok_or_else(|| invalid("expected tls, ssl or empty"))?);
            }
            SettingKey::Port => {
                self.port = Some(value.trim().parse().map_err(|_| invalid("expected a port number"))?);
            }
            SettingKey::Debug => {
                let level: u8 = value.trim().parse().map_err(|_| invalid("expected 0-4"))?;
                if level > 4 {
                    return Err(invalid("expected 0-4"));
                }
                self.debug = Some(level);
            }
        }
        Ok(())
    }

    /// The defined value for `key`, else its documented default, else `None`.
    pub fn resolve(&self, key: SettingKey) -> Option<SettingValue> {
        let text = |v: &Option<String>| v.clone().map(SettingValue::Text);
        match key {
            SettingKey::Server => text(&self.server),
            SettingKey::Username => text(&self.username),
            SettingKey::Password => text(&self.password),
            SettingKey::FromAddress => text(&self.from_address),
            SettingKey::FromName => text(&self.from_name),
            SettingKey::Auth => Some(SettingValue::Flag(self.auth())),
            SettingKey::Secure => Some(SettingValue::Text(self.secure().as_str().to_string())),
            SettingKey::Port => Some(SettingValue::Number(self.port() as i64)),
            SettingKey::Debug => Some(SettingValue::Number(self.debug() as i64)),
        }
    }

    pub fn is_defined(&self, key: SettingKey) -> bool {
        match key {
            SettingKey::Server => self.server.is_some(),
            SettingKey::Username => self.username.is_some(),
            SettingKey::Password => self.password.is_some(),
            SettingKey::Auth => self.auth.is_some(),
            SettingKey::Secure => self.secure.is_some(),
            SettingKey::Port => self.port.is_some(),
            SettingKey::Debug => self.debug.is_some(),
            SettingKey::FromAddress => self.from_address.is_some(),
            SettingKey::FromName => self.from_name.is_some(),
        }
    }

    /// True when server, username and password are all defined.
    pub fn required_present(&self) -> bool {
        SettingKey::REQUIRED.iter().all(|k| self.is_defined(*k))
    }

    pub fn missing_required(&self) -> Vec<&'static str> {
        SettingKey::REQUIRED
            .iter()
            .filter(|k| !self.is_defined(**k))
            .map(|k| k.env_name())
            .collect()
    }

    pub fn auth(&self) -> bool {
        self.auth.unwrap_or(DEFAULT_AUTH)
    }

    pub fn secure(&self) -> Secure {
        self.secure.unwrap_or(DEFAULT_SECURE)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn debug(&self) -> u8 {
        self.debug.unwrap_or(DEFAULT_DEBUG)
    }

    /// The sender pair, only when both halves are non-empty.
    pub fn sender(&self) -> Option<(&str, &str)> {
        match (self.from_address.as_deref(), self.from_name.as_deref()) {
            (Some(addr), Some(name)) if !addr.is_empty() && !name.is_empty() => Some((addr, name)),
            _ => None,
        }
    }

    /// Rows for the admin overview table. The password is never shown.
    pub fn overview(&self) -> Vec<(&'static str, String)> {
        let show = |key: SettingKey| -> String {
            match self.resolve(key) {
                Some(v) if v.is_truthy() => v.to_string(),
                _ => "Not set".to_string(),
            }
        };
        let password = match self.resolve(SettingKey::Password) {
            Some(v) if v.is_truthy() => REDACTED.to_string(),
            _ => "Not set".to_string(),
        };
        vec![
            ("SMTP Server", show(SettingKey::Server)),
            ("SMTP Username", show(SettingKey::Username)),
            ("SMTP Password", password),
            ("SMTP Port", show(SettingKey::Port)),
            ("SMTP Secure", show(SettingKey::Secure)),
            ("SMTP From", show(SettingKey::FromAddress)),
            ("SMTP Name", show(SettingKey::FromName)),
        ]
    }
}
