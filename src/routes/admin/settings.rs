use rocket::form::Form;
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;
use std::sync::Arc;

use super::admin_base;
use crate::email::{sanitize_email, Outbox, TEST_EMAIL_BODY, TEST_EMAIL_SUBJECT};
use crate::error_log::ErrorLog;
use crate::settings::SmtpSettings;
use crate::{AdminSlug, LoadedAt};

#[derive(Debug, FromForm)]
pub struct TestEmailForm {
    pub recipient: Option<String>,
}

fn settings_url(slug: &AdminSlug) -> String {
    format!("{}/settings/smtp", admin_base(slug))
}

// ── Settings page ──────────────────────────────────────

#[get("/settings/smtp?<sent>&<recipient>")]
pub fn smtp_settings_page(
    settings: &State<Arc<SmtpSettings>>,
    errors: &State<Arc<ErrorLog>>,
    slug: &State<AdminSlug>,
    loaded_at: &State<LoadedAt>,
    sent: Option<String>,
    recipient: Option<String>,
) -> Template {
    // "0" and "" are the only falsy values for the sent flag
    let sent = sent.map(|s| !(s.is_empty() || s == "0"));
    let recipient = recipient.map(|r| sanitize_email(&r)).unwrap_or_default();

    let overview: Vec<_> = settings
        .overview()
        .into_iter()
        .map(|(label, value)| json!({ "label": label, "value": value }))
        .collect();

    let context = json!({
        "page_title": "SMTP Settings",
        "admin_slug": slug.0,
        "notices": errors.drain_all(),
        "required_present": settings.required_present(),
        "show_result": sent.is_some(),
        "sent": sent.unwrap_or(false),
        "recipient": recipient,
        "overview": overview,
        "loaded_at": loaded_at.0,
    });

    Template::render("admin/smtp_settings", &context)
}

// ── POST: Test send ────────────────────────────────────

#[post("/settings/smtp/test", data = "<form>")]
pub fn smtp_test_send(
    form: Form<TestEmailForm>,
    outbox: &State<Outbox>,
    slug: &State<AdminSlug>,
) -> Redirect {
    let recipient = form
        .into_inner()
        .recipient
        .map(|r| sanitize_email(&r))
        .unwrap_or_default();

    let mut query = url::form_urlencoded::Serializer::new(String::new());

    if recipient.is_empty() {
        log::info!("[email] Test send skipped, no valid recipient");
        query.append_pair("sent", "0");
        return Redirect::to(format!("{}?{}", settings_url(slug), query.finish()));
    }

    let sent = outbox.0.send(&recipient, TEST_EMAIL_SUBJECT, TEST_EMAIL_BODY);

    query.append_pair("sent", if sent { "1" } else { "0" });
    query.append_pair("recipient", &recipient);
    Redirect::to(format!("{}?{}", settings_url(slug), query.finish()))
}
