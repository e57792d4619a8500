use crate::AdminSlug;

pub mod settings;

/// Helper: get the admin base path from managed state
pub(crate) fn admin_base(slug: &AdminSlug) -> String {
    format!("/{}", slug.0)
}

pub fn routes() -> Vec<rocket::Route> {
    routes![settings::smtp_settings_page, settings::smtp_test_send]
}
