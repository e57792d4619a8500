use rocket::response::Redirect;
use rocket::State;

use crate::AdminSlug;

#[get("/")]
pub fn index(slug: &State<AdminSlug>) -> Redirect {
    Redirect::to(format!("/{}/settings/smtp", slug.0))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![index]
}
