#[macro_use]
extern crate diesel;
#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate serde_derive;

pub mod article;
pub mod auth;
pub mod comment;
pub mod config;
pub mod db;
pub mod fairings;
pub mod health;
pub mod logger;
pub mod profile;
pub mod repo;
pub mod slug;
pub mod state;
pub mod types;
pub mod users;
pub mod utils;
pub mod wide;

use rocket::http::Status;
use rocket::request::Request;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{catch, catchers, routes, Build, Rocket};
use serde_json::{json, Value};

use crate::state::Conduit;

fn error_body(status: Status, field: &str, message: &str) -> status::Custom<Json<Value>> {
    status::Custom(status, Json(json!({ "errors": { field: [message] } })))
}

#[catch(400)]
fn bad_request(_req: &Request) -> status::Custom<Json<Value>> {
    error_body(Status::BadRequest, "body", "is malformed")
}

#[catch(401)]
fn unauthorized(_req: &Request) -> status::Custom<Json<Value>> {
    error_body(Status::Unauthorized, "token", "Missing authorization header")
}

#[catch(404)]
fn not_found(_req: &Request) -> status::Custom<Json<Value>> {
    error_body(Status::NotFound, "resource", "not found")
}

#[catch(422)]
fn unprocessable(_req: &Request) -> status::Custom<Json<Value>> {
    error_body(Status::UnprocessableEntity, "body", "is invalid")
}

#[catch(500)]
fn internal_error(req: &Request) -> status::Custom<Json<Value>> {
    log::error!("unhandled failure on {}", req.uri());
    error_body(Status::InternalServerError, "server", "internal error")
}

/// Assembles the application around an already-built `Conduit`.
pub fn rocket(conduit: Conduit) -> Rocket<Build> {
    rocket::build()
        .manage(conduit)
        .attach(fairings::cors())
        .mount(
            "/api",
            routes![
                users::register,
                users::login,
                users::current,
                users::update,
                profile::profile,
                article::list,
                article::create,
                article::get,
                article::update,
                article::delete,
                article::favorite,
                article::unfavorite,
                article::tags,
                comment::add,
                comment::list,
                comment::delete,
            ],
        )
        .mount("/", routes![health::health, fairings::preflight])
        .register(
            "/",
            catchers![bad_request, unauthorized, not_found, unprocessable, internal_error],
        )
}
