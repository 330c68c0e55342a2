mod common;

use common::*;
use rocket::http::Status;
use serde_json::json;

#[test]
fn health_reports_store_state() {
    let client = client();
    let (status, body) = get_json(&client, "/health", None);
    assert_eq!(status, Status::Ok);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "conduit-api");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn responses_carry_cors_headers() {
    let client = client();
    let response = client.get("/api/tags").dispatch();
    assert_eq!(response.status(), Status::Ok);
    let headers = response.headers();
    assert_eq!(headers.get_one("Access-Control-Allow-Origin"), Some("*"));
    assert_eq!(
        headers.get_one("Access-Control-Allow-Methods"),
        Some("GET, POST, PUT, DELETE, OPTIONS")
    );
    assert_eq!(
        headers.get_one("Access-Control-Allow-Headers"),
        Some("Content-Type, Authorization")
    );
}

#[test]
fn preflight_is_answered_for_any_path() {
    let client = client();
    let response = client.options("/api/articles/some-slug/comments").dispatch();
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.headers().get_one("Access-Control-Allow-Origin"), Some("*"));
}

#[test]
fn unknown_routes_render_error_shape() {
    let client = client();
    let (status, body) = get_json(&client, "/api/nowhere", None);
    assert_eq!(status, Status::NotFound);
    assert_eq!(body, json!({"errors": {"resource": ["not found"]}}));
}
