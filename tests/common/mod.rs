#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use conduit::auth::password::PasswordHasher;
use conduit::auth::token::TokenIssuer;
use conduit::state::Conduit;
use conduit::wide::WideStore;
use rocket::http::{ContentType, Header, Status};
use rocket::local::blocking::{Client, LocalResponse};
use serde_json::{json, Value};

pub const SECRET: &[u8] = b"integration-test-secret";

pub fn client() -> Client {
    let tokens = TokenIssuer::new(SECRET, chrono::Duration::hours(24)).expect("token issuer");
    let app = Conduit::new(
        Arc::new(WideStore::new()),
        tokens,
        PasswordHasher::new(4),
        Duration::from_secs(5),
    );
    Client::tracked(conduit::rocket(app)).expect("valid rocket instance")
}

pub fn token_header(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Token {}", token))
}

pub fn bearer_header(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Bearer {}", token))
}

pub fn body(response: LocalResponse) -> Value {
    response.into_json::<Value>().expect("json body")
}

pub fn post_json(client: &Client, uri: &str, payload: &Value, auth: Option<Header<'static>>) -> (Status, Value) {
    let mut request = client.post(uri.to_string()).header(ContentType::JSON).body(payload.to_string());
    if let Some(auth) = auth {
        request = request.header(auth);
    }
    let response = request.dispatch();
    let status = response.status();
    (status, body(response))
}

pub fn put_json(client: &Client, uri: &str, payload: &Value, auth: Header<'static>) -> (Status, Value) {
    let response = client
        .put(uri.to_string())
        .header(ContentType::JSON)
        .header(auth)
        .body(payload.to_string())
        .dispatch();
    let status = response.status();
    (status, body(response))
}

pub fn get_json(client: &Client, uri: &str, auth: Option<Header<'static>>) -> (Status, Value) {
    let mut request = client.get(uri.to_string());
    if let Some(auth) = auth {
        request = request.header(auth);
    }
    let response = request.dispatch();
    let status = response.status();
    (status, body(response))
}

pub fn delete_json(client: &Client, uri: &str, auth: Option<Header<'static>>) -> (Status, Value) {
    let mut request = client.delete(uri.to_string());
    if let Some(auth) = auth {
        request = request.header(auth);
    }
    let response = request.dispatch();
    let status = response.status();
    (status, body(response))
}

/// Registers `username` and returns the issued token.
pub fn register(client: &Client, username: &str) -> String {
    let payload = json!({
        "user": {
            "username": username,
            "email": format!("{}@conduit.io", username),
            "password": "password123",
        }
    });
    let (status, body) = post_json(client, "/api/users", &payload, None);
    assert_eq!(status, Status::Created, "{}", body);
    body["user"]["token"].as_str().expect("token").to_string()
}

pub fn create_article(client: &Client, token: &str, title: &str, tags: &[&str]) -> Value {
    let payload = json!({
        "article": {
            "title": title,
            "description": "Ever wonder how?",
            "body": "You have to believe",
            "tagList": tags,
        }
    });
    let (status, body) = post_json(client, "/api/articles", &payload, Some(token_header(token)));
    assert_eq!(status, Status::Created, "{}", body);
    body["article"].clone()
}
