mod common;

use common::*;
use rocket::http::Status;
use serde_json::json;

#[test]
fn create_article_returns_view() {
    let client = client();
    let token = register(&client, "jake");
    let article = create_article(&client, &token, "How to train your dragon", &["dragons", "training"]);

    assert_eq!(article["slug"], "how-to-train-your-dragon");
    assert_eq!(article["title"], "How to train your dragon");
    assert_eq!(article["tagList"], json!(["dragons", "training"]));
    assert_eq!(article["favorited"], false);
    assert_eq!(article["favoritesCount"], 0);
    assert_eq!(article["author"]["username"], "jake");
    assert_eq!(article["author"]["following"], false);
    assert!(article["createdAt"].as_str().unwrap().ends_with('Z'));
}

#[test]
fn repeated_titles_get_suffixed_slugs() {
    let client = client();
    let token = register(&client, "jake");
    let first = create_article(&client, &token, "Hello World", &[]);
    let second = create_article(&client, &token, "Hello World", &[]);
    let third = create_article(&client, &token, "Hello, World!", &[]);

    assert_eq!(first["slug"], "hello-world");
    assert_eq!(second["slug"], "hello-world-1");
    assert_eq!(third["slug"], "hello-world-2");
}

#[test]
fn create_requires_auth_and_fields() {
    let client = client();
    let payload = json!({"article": {"title": "t", "description": "d", "body": "b"}});
    let (status, _) = post_json(&client, "/api/articles", &payload, None);
    assert_eq!(status, Status::Unauthorized);

    let token = register(&client, "jake");
    let blank = json!({"article": {"title": "", "description": "d", "body": ""}});
    let (status, body) = post_json(&client, "/api/articles", &blank, Some(token_header(&token)));
    assert_eq!(status, Status::UnprocessableEntity);
    assert_eq!(body["errors"]["title"], json!(["can't be blank"]));
    assert_eq!(body["errors"]["body"], json!(["can't be blank"]));
}

#[test]
fn article_routes_reject_bearer_scheme() {
    let client = client();
    let token = register(&client, "jake");
    let payload = json!({"article": {"title": "t", "description": "d", "body": "b"}});
    let (status, body) = post_json(&client, "/api/articles", &payload, Some(bearer_header(&token)));
    assert_eq!(status, Status::Unauthorized);
    assert_eq!(body, json!({"errors": {"token": ["Invalid authorization header format"]}}));
}

#[test]
fn list_filters_and_pages() {
    let client = client();
    let jake = register(&client, "jake");
    let jane = register(&client, "jane");
    create_article(&client, &jake, "First", &["rust"]);
    create_article(&client, &jake, "Second", &["go"]);
    let third = create_article(&client, &jane, "Third", &["rust"]);

    let (status, body) = get_json(&client, "/api/articles", None);
    assert_eq!(status, Status::Ok);
    assert_eq!(body["articlesCount"], 3);
    let slugs: Vec<_> = body["articles"].as_array().unwrap().iter().map(|a| a["slug"].clone()).collect();
    assert_eq!(slugs, vec![json!("third"), json!("second"), json!("first")]);

    let (_, body) = get_json(&client, "/api/articles?tag=rust", None);
    assert_eq!(body["articlesCount"], 2);

    let (_, body) = get_json(&client, "/api/articles?author=jane", None);
    assert_eq!(body["articlesCount"], 1);
    assert_eq!(body["articles"][0]["slug"], "third");

    let (_, body) = get_json(&client, "/api/articles?limit=1&offset=1", None);
    assert_eq!(body["articlesCount"], 3);
    assert_eq!(body["articles"].as_array().unwrap().len(), 1);
    assert_eq!(body["articles"][0]["slug"], "second");

    let uri = format!("/api/articles/{}/favorite", third["slug"].as_str().unwrap());
    let (status, _) = post_json(&client, &uri, &json!({}), Some(token_header(&jake)));
    assert_eq!(status, Status::Ok);
    let (_, body) = get_json(&client, "/api/articles?favorited=jake", None);
    assert_eq!(body["articlesCount"], 1);
    assert_eq!(body["articles"][0]["slug"], "third");

    let (_, body) = get_json(&client, "/api/articles?favorited=nobody", None);
    assert_eq!(body["articlesCount"], 0);
    assert_eq!(body["articles"], json!([]));
}

#[test]
fn get_unknown_article_is_not_found() {
    let client = client();
    let (status, body) = get_json(&client, "/api/articles/missing", None);
    assert_eq!(status, Status::NotFound);
    assert_eq!(body, json!({"errors": {"article": ["not found"]}}));
}

#[test]
fn only_the_author_may_update() {
    let client = client();
    let jake = register(&client, "jake");
    let jane = register(&client, "jane");
    create_article(&client, &jake, "Original", &[]);

    let payload = json!({"article": {"body": "hijacked"}});
    let (status, body) = put_json(&client, "/api/articles/original", &payload, token_header(&jane));
    assert_eq!(status, Status::Forbidden);
    assert_eq!(body, json!({"errors": {"permission": ["You can only update your own articles"]}}));

    let (status, body) = put_json(&client, "/api/articles/original", &payload, token_header(&jake));
    assert_eq!(status, Status::Ok);
    assert_eq!(body["article"]["body"], "hijacked");
    assert_eq!(body["article"]["slug"], "original");
}

#[test]
fn retitling_moves_the_slug() {
    let client = client();
    let token = register(&client, "jake");
    create_article(&client, &token, "Draft", &[]);
    create_article(&client, &token, "Final", &[]);

    let payload = json!({"article": {"title": "Final"}});
    let (status, body) = put_json(&client, "/api/articles/draft", &payload, token_header(&token));
    assert_eq!(status, Status::Ok);
    assert_eq!(body["article"]["slug"], "final-1");
    assert_eq!(body["article"]["title"], "Final");

    let (status, _) = get_json(&client, "/api/articles/draft", None);
    assert_eq!(status, Status::NotFound);
    let (status, _) = get_json(&client, "/api/articles/final-1", None);
    assert_eq!(status, Status::Ok);
}

#[test]
fn favorites_count_each_user_once() {
    let client = client();
    let jake = register(&client, "jake");
    let jane = register(&client, "jane");
    create_article(&client, &jake, "Popular", &[]);

    let (status, body) = post_json(&client, "/api/articles/popular/favorite", &json!({}), Some(token_header(&jane)));
    assert_eq!(status, Status::Ok);
    assert_eq!(body["article"]["favorited"], true);
    assert_eq!(body["article"]["favoritesCount"], 1);

    let (_, body) = post_json(&client, "/api/articles/popular/favorite", &json!({}), Some(token_header(&jane)));
    assert_eq!(body["article"]["favoritesCount"], 1);

    let (_, body) = get_json(&client, "/api/articles/popular", Some(token_header(&jake)));
    assert_eq!(body["article"]["favorited"], false);
    assert_eq!(body["article"]["favoritesCount"], 1);

    let (status, body) = delete_json(&client, "/api/articles/popular/favorite", Some(token_header(&jane)));
    assert_eq!(status, Status::Ok);
    assert_eq!(body["article"]["favorited"], false);
    assert_eq!(body["article"]["favoritesCount"], 0);

    let (_, body) = delete_json(&client, "/api/articles/popular/favorite", Some(token_header(&jane)));
    assert_eq!(body["article"]["favoritesCount"], 0);
}

#[test]
fn delete_article_then_not_found() {
    let client = client();
    let jake = register(&client, "jake");
    let jane = register(&client, "jane");
    create_article(&client, &jake, "Short lived", &[]);

    let (status, _) = delete_json(&client, "/api/articles/short-lived", Some(token_header(&jane)));
    assert_eq!(status, Status::Forbidden);

    let (status, body) = delete_json(&client, "/api/articles/short-lived", Some(token_header(&jake)));
    assert_eq!(status, Status::Ok);
    assert_eq!(body, json!({}));

    let (status, _) = get_json(&client, "/api/articles/short-lived", None);
    assert_eq!(status, Status::NotFound);
    let (status, _) = delete_json(&client, "/api/articles/short-lived", Some(token_header(&jake)));
    assert_eq!(status, Status::NotFound);

    let again = create_article(&client, &jake, "Short lived", &[]);
    assert_eq!(again["slug"], "short-lived");
}

#[test]
fn tags_are_distinct_and_sorted() {
    let client = client();
    let token = register(&client, "jake");
    let (_, body) = get_json(&client, "/api/tags", None);
    assert_eq!(body, json!({"tags": []}));

    create_article(&client, &token, "One", &["rust", "async"]);
    create_article(&client, &token, "Two", &["rust", "web", "web"]);

    let (status, body) = get_json(&client, "/api/tags", None);
    assert_eq!(status, Status::Ok);
    assert_eq!(body, json!({"tags": ["async", "rust", "web"]}));
}
