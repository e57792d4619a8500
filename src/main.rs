#[macro_use]
extern crate rocket;

use std::sync::Arc;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Header;
use rocket::response::content::RawHtml;
use rocket::{Build, Rocket};
use rocket_dyn_templates::Template;

mod boot;
mod email;
mod error_log;
mod routes;
mod settings;


use email::{MailSender, Mailer, Outbox};
use error_log::ErrorLog;
use settings::SmtpSettings;

/// Holds the admin URL slug, read from `ADMIN_SLUG` at startup.
pub struct AdminSlug(pub String);

/// When the SMTP settings were loaded, shown in the page footer.
pub struct LoadedAt(pub String);

pub struct NoCacheAdmin;

#[rocket::async_trait]
impl Fairing for NoCacheAdmin {
    fn info(&self) -> Info {
        Info { name: "No-Cache Admin Pages", kind: Kind::Response }
    }

    async fn on_response<'r>(&self, req: &'r rocket::Request<'_>, res: &mut rocket::Response<'r>) {
        let slug = req.rocket().state::<AdminSlug>()
            .map(|s| s.0.as_str())
            .unwrap_or("admin");
        let prefix = format!("/{}", slug);
        if req.uri().path().starts_with(&*prefix) {
            res.set_header(Header::new("Cache-Control", "no-store, no-cache, must-revalidate, max-age=0"));
            res.set_header(Header::new("Pragma", "no-cache"));
        }
    }
}

#[catch(404)]
fn not_found() -> RawHtml<String> {
    RawHtml("<html><body style='font-family:sans-serif;text-align:center;padding:80px'><h1>404</h1><p>Page not found.</p></body></html>".to_string())
}

#[catch(500)]
fn server_error() -> RawHtml<String> {
    RawHtml("<html><body style='font-family:sans-serif;text-align:center;padding:80px'><h1>500</h1><p>Internal server error.</p></body></html>".to_string())
}

/// Assemble the app around an already-loaded config and a mail sender.
pub fn build_rocket(
    settings: Arc<SmtpSettings>,
    errors: Arc<ErrorLog>,
    sender: Box<dyn MailSender>,
    admin_slug: String,
) -> Rocket<Build> {
    let admin_mount = format!("/{}", admin_slug);
    let admin_api_mount = format!("/{}/api", admin_slug);
    let loaded_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

    rocket::build()
        .manage(settings)
        .manage(errors)
        .manage(Outbox(sender))
        .manage(AdminSlug(admin_slug))
        .manage(LoadedAt(loaded_at))
        .attach(Template::fairing())
        .attach(NoCacheAdmin)
        .mount("/", routes::public::routes())
        .mount(&admin_mount, routes::admin::routes())
        .mount(&admin_api_mount, routes::admin_api::routes())
        .register("/", catchers![not_found, server_error])
}

#[launch]
fn rocket() -> _ {
    env_logger::init();

    let settings = Arc::new(boot::load_settings());
    boot::run(&settings);

    let errors = Arc::new(ErrorLog::new());
    let mailer = Mailer::new(settings.clone(), errors.clone());

    let admin_slug = std::env::var("ADMIN_SLUG")
        .ok()
        .map(|s| s.trim_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "admin".to_string());
    log::info!("Admin panel mounted at: /{}", admin_slug);

    build_rocket(settings, errors, Box::new(mailer), admin_slug)
}
