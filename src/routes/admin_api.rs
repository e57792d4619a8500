use rocket::serde::json::Json;
use rocket::State;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error_log::ErrorLog;
use crate::settings::SmtpSettings;

/// Resolved SMTP settings (password masked) plus whether transport can be configured.
#[get("/smtp/status")]
pub fn smtp_status(settings: &State<Arc<SmtpSettings>>, errors: &State<Arc<ErrorLog>>) -> Json<Value> {
    let overview: serde_json::Map<String, Value> = settings
        .overview()
        .into_iter()
        .map(|(label, value)| (label.to_string(), json!(value)))
        .collect();

    Json(json!({
        "required_present": settings.required_present(),
        "missing": settings.missing_required(),
        "settings": overview,
        "pending_errors": errors.peek().len(),
    }))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![smtp_status]
}
