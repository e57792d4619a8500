use log::{error, info, warn};
use std::path::Path;
use std::process;

use crate::settings::{SettingKey, SmtpSettings, CONFIG_PATH_ENV, DEFAULT_CONFIG_FILE};

const SETTINGS_TEMPLATE: &str = "templates/admin/smtp_settings.html.tera";

/// Load SMTP settings, aborting the process if they cannot be parsed.
pub fn load_settings() -> SmtpSettings {
    match SmtpSettings::load() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Boot check FAILED: {}. Aborting.", e);
            process::exit(1);
        }
    }
}

/// Run boot checks against the loaded settings. Returns the number of warnings.
/// Never logs secret values, only key names.
pub fn run(settings: &SmtpSettings) -> u32 {
    info!("SMTP boot check starting...");

    let mut warnings = 0u32;

    // ── 1. Config source ───────────────────────────────
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
    if Path::new(&path).exists() {
        info!("  Config file: {}", path);
    } else {
        info!("  {} not found, using SMTP_* environment only", path);
    }

    // ── 2. Required keys ───────────────────────────────
    let missing = settings.missing_required();
    if !missing.is_empty() {
        warn!(
            "  Missing required SMTP settings: {} (mail falls back to local sendmail)",
            missing.join(", ")
        );
        warnings += 1;
    }

    // ── 3. Sender pair ─────────────────────────────────
    let has_from = settings.is_defined(SettingKey::FromAddress);
    let has_name = settings.is_defined(SettingKey::FromName);
    if has_from != has_name {
        warn!("  SMTP_FROM and SMTP_NAME must both be set, the lone value is ignored");
        warnings += 1;
    }

    // ── 4. Auth without credentials ────────────────────
    if settings.required_present()
        && settings.auth()
        && settings.username.as_deref().unwrap_or("").is_empty()
    {
        warn!("  SMTP_AUTH is on but SMTP_USERNAME is empty");
        warnings += 1;
    }

    // ── 5. Page template ───────────────────────────────
    if !Path::new(SETTINGS_TEMPLATE).exists() {
        warn!("  Missing template: {} (settings page will 500)", SETTINGS_TEMPLATE);
        warnings += 1;
    }

    // ── Summary ─────────────────────────────────────────
    if warnings > 0 {
        warn!("Boot check passed with {} warning(s).", warnings);
    } else {
        info!(
            "Boot check passed. SMTP {}:{} secure={}",
            settings.server.as_deref().unwrap_or(""),
            settings.port(),
            settings.secure().as_str()
        );
    }
    warnings
}
