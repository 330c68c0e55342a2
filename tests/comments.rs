mod common;

use common::*;
use rocket::http::Status;
use serde_json::json;

fn comment(client: &rocket::local::blocking::Client, slug: &str, body: &str, auth: rocket::http::Header<'static>) -> (Status, serde_json::Value) {
    let uri = format!("/api/articles/{}/comments", slug);
    post_json(client, &uri, &json!({"comment": {"body": body}}), Some(auth))
}

#[test]
fn add_comment_accepts_either_scheme() {
    let client = client();
    let jake = register(&client, "jake");
    create_article(&client, &jake, "Discussed", &[]);

    let (status, body) = comment(&client, "discussed", "Token comment", token_header(&jake));
    assert_eq!(status, Status::Created);
    assert_eq!(body["comment"]["body"], "Token comment");
    assert_eq!(body["comment"]["author"]["username"], "jake");
    assert!(body["comment"]["id"].is_number());

    let (status, body) = comment(&client, "discussed", "Bearer comment", bearer_header(&jake));
    assert_eq!(status, Status::Created);
    assert_eq!(body["comment"]["body"], "Bearer comment");
}

#[test]
fn add_comment_validates_body_and_article() {
    let client = client();
    let jake = register(&client, "jake");
    create_article(&client, &jake, "Discussed", &[]);

    let (status, body) = comment(&client, "discussed", "   ", token_header(&jake));
    assert_eq!(status, Status::UnprocessableEntity);
    assert_eq!(body, json!({"errors": {"body": ["can't be blank"]}}));

    let (status, body) = comment(&client, "missing", "hello", token_header(&jake));
    assert_eq!(status, Status::NotFound);
    assert_eq!(body, json!({"errors": {"article": ["not found"]}}));

    let uri = "/api/articles/discussed/comments";
    let (status, body) = post_json(&client, uri, &json!({"comment": {"body": "x"}}), None);
    assert_eq!(status, Status::Unauthorized);
    assert_eq!(body, json!({"errors": {"token": ["Missing authorization header"]}}));
}

#[test]
fn list_comments_oldest_first() {
    let client = client();
    let jake = register(&client, "jake");
    let jane = register(&client, "jane");
    create_article(&client, &jake, "Discussed", &[]);
    comment(&client, "discussed", "first", token_header(&jake));
    comment(&client, "discussed", "second", bearer_header(&jane));

    let (status, body) = get_json(&client, "/api/articles/discussed/comments", None);
    assert_eq!(status, Status::Ok);
    let bodies: Vec<_> = body["comments"].as_array().unwrap().iter().map(|c| c["body"].clone()).collect();
    assert_eq!(bodies, vec![json!("first"), json!("second")]);
    assert_eq!(body["comments"][1]["author"]["username"], "jane");

    let (status, body) = get_json(&client, "/api/articles/discussed/comments", Some(bearer_header("garbage")));
    assert_eq!(status, Status::Ok);
    assert_eq!(body["comments"].as_array().unwrap().len(), 2);
}

#[test]
fn only_the_author_may_delete_a_comment() {
    let client = client();
    let jake = register(&client, "jake");
    let jane = register(&client, "jane");
    create_article(&client, &jake, "Discussed", &[]);
    let (_, body) = comment(&client, "discussed", "mine", token_header(&jake));
    let id = body["comment"]["id"].as_i64().unwrap();
    let uri = format!("/api/articles/discussed/comments/{}", id);

    let (status, body) = delete_json(&client, &uri, Some(bearer_header(&jane)));
    assert_eq!(status, Status::Forbidden);
    assert_eq!(body, json!({"errors": {"permission": ["You can only delete your own comments"]}}));

    let (status, body) = delete_json(&client, &uri, Some(bearer_header(&jake)));
    assert_eq!(status, Status::Ok);
    assert_eq!(body, json!({}));

    let (status, body) = delete_json(&client, &uri, Some(token_header(&jake)));
    assert_eq!(status, Status::NotFound);
    assert_eq!(body, json!({"errors": {"comment": ["not found"]}}));
}

#[test]
fn comments_are_scoped_to_their_article() {
    let client = client();
    let jake = register(&client, "jake");
    create_article(&client, &jake, "One", &[]);
    create_article(&client, &jake, "Two", &[]);
    let (_, body) = comment(&client, "one", "on one", token_header(&jake));
    let id = body["comment"]["id"].as_i64().unwrap();

    let uri = format!("/api/articles/two/comments/{}", id);
    let (status, _) = delete_json(&client, &uri, Some(token_header(&jake)));
    assert_eq!(status, Status::NotFound);

    let (_, body) = get_json(&client, "/api/articles/one/comments", None);
    assert_eq!(body["comments"].as_array().unwrap().len(), 1);
}

#[test]
fn deleting_an_article_removes_its_comments() {
    let client = client();
    let jake = register(&client, "jake");
    create_article(&client, &jake, "Doomed", &[]);
    comment(&client, "doomed", "bye", token_header(&jake));

    let (status, _) = delete_json(&client, "/api/articles/doomed", Some(token_header(&jake)));
    assert_eq!(status, Status::Ok);

    create_article(&client, &jake, "Doomed", &[]);
    let (status, body) = get_json(&client, "/api/articles/doomed/comments", None);
    assert_eq!(status, Status::Ok);
    assert_eq!(body["comments"], json!([]));
}
