use rocket::fairing::AdHoc;
use rocket::http::{Header, Status};
use rocket::options;

pub fn cors() -> AdHoc {
    AdHoc::on_response("CORS", |_, response| {
        Box::pin(async move {
            response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
            response.set_header(Header::new(
                "Access-Control-Allow-Methods",
                "GET, POST, PUT, DELETE, OPTIONS",
            ));
            response.set_header(Header::new(
                "Access-Control-Allow-Headers",
                "Content-Type, Authorization",
            ));
        })
    })
}

/// Answers every preflight; the headers come from the CORS fairing.
#[options("/<_..>")]
pub fn preflight() -> Status {
    Status::Ok
}
