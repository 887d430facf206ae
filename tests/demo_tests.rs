//! End-to-end tests against the bundled pet store and admin controllers.

mod common;

use bounce::config::AppConfig;
use bounce::controllers::build_app;
use bounce::{Bounce, RawRequest};
use bytes::Bytes;
use common::{get, post_json, request_with_header, send};
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Method, StatusCode};
use serde_json::{json, Value};

const KEY: &str = "s3cret";

async fn app() -> Bounce {
    let mut config = AppConfig::default();
    config.security.api_keys = vec![KEY.to_string()];
    build_app(config).await.unwrap()
}

fn names(page: &Value) -> Vec<String> {
    page["content"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect()
}

async fn put_json(app: &Bounce, target: &str, body: &str) -> common::TestResponse {
    let request = RawRequest::new(Method::PUT, target, body.to_string())
        .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    send(app, request).await
}

#[tokio::test]
async fn test_default_packages_are_scanned() {
    let app = app().await;
    assert_eq!(
        app.config().packages,
        vec!["bounce::controllers", "bounce::middleware"]
    );
    let names: Vec<&str> = app.router().entries().iter().map(|e| e.name()).collect();
    assert!(names.contains(&"PetController::list"));
    assert!(names.contains(&"AdminController::raw"));
    assert!(names.contains(&"ApiKeyGuard"));
    assert!(!names.iter().any(|n| n.ends_with("::validate")));
}

#[tokio::test]
async fn test_list_pets_default_page() {
    let app = app().await;
    let res = get(&app, "/pets").await;
    assert_eq!(res.status, StatusCode::OK);
    let page = res.json();
    assert_eq!(page["page"], 0);
    assert_eq!(page["size"], 50);
    assert_eq!(page["totalElements"], 4);
    assert_eq!(names(&page), vec!["Rex", "Tom", "Bubbles", "Ace"]);
}

#[tokio::test]
async fn test_list_pets_sorted_and_paged() {
    let app = app().await;

    let first = get(&app, "/pets?order=name,asc&size=2").await.json();
    assert_eq!(names(&first), vec!["Ace", "Bubbles"]);
    let second = get(&app, "/pets?order=name,asc&size=2&page=1").await.json();
    assert_eq!(names(&second), vec!["Rex", "Tom"]);
    assert_eq!(second["order"], "name,asc");

    let desc = get(&app, "/pets?order=name,DESC").await.json();
    assert_eq!(names(&desc), vec!["Tom", "Rex", "Bubbles", "Ace"]);
}

#[tokio::test]
async fn test_search_runs_ahead_of_id_route() {
    let app = app().await;

    let res = get(&app, "/pets/search?name=E").await;
    assert_eq!(res.status, StatusCode::OK);
    let found = json!({ "content": res.json() });
    assert_eq!(names(&found), vec!["Rex", "Bubbles", "Ace"]);

    let dogs = get(&app, "/pets/search?name=e&species=dog").await.json();
    assert_eq!(dogs.as_array().unwrap().len(), 2);

    let missing = get(&app, "/pets/search").await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.message(), "Request Parameter name is required");
}

#[tokio::test]
async fn test_get_pet() {
    let app = app().await;

    let res = get(&app, "/pets/2").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.json(),
        json!({ "id": 2, "name": "Tom", "species": "cat", "tags": [] })
    );

    let res = get(&app, "/pets/99").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.message(), "Pet 99 not found");

    let res = get(&app, "/pets/two").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.message(), "Parameter id is missing or invalid");
}

#[tokio::test]
async fn test_create_pet() {
    let app = app().await;

    let res = post_json(&app, "/pets", r#"{"name":"Kit","species":"cat","tags":["new"]}"#).await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(
        res.json(),
        json!({ "id": 5, "name": "Kit", "species": "cat", "tags": ["new"] })
    );
    assert_eq!(get(&app, "/pets/5").await.status, StatusCode::OK);

    let res = post_json(&app, "/pets", r#"{"id":1,"name":"Rex","species":"dog"}"#).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.message(), "Pet 1 already exists");

    let res = post_json(&app, "/pets", r#"{"name":" ","species":"dog"}"#).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.message(), "Pet name must not be empty");

    let res = post_json(&app, "/pets", r#"{"name":"Kit"}"#).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.message(), "Request Body could not be parsed");
}

#[tokio::test]
async fn test_update_pet() {
    let app = app().await;

    let res = put_json(&app, "/pets/2", r#"{"name":"Thomas","species":"cat"}"#).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["id"], 2);
    assert_eq!(get(&app, "/pets/2").await.json()["name"], "Thomas");

    let res = put_json(&app, "/pets/42", r#"{"name":"Ghost","species":"cat"}"#).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_pet() {
    let app = app().await;
    let delete = |target: &str| RawRequest::new(Method::DELETE, target, Bytes::new());

    let res = send(&app, delete("/pets/3")).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    assert!(res.body.is_empty());
    assert_eq!(get(&app, "/pets/3").await.status, StatusCode::NOT_FOUND);

    let res = send(&app, delete("/pets/3")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.message(), "Pet 3 not found");
}

#[tokio::test]
async fn test_admin_requires_api_key() {
    let app = app().await;

    let res = get(&app, "/admin/stats").await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.message(), "Unauthorized");

    let res = request_with_header(&app, Method::GET, "/admin/stats", "x-api-key", "guess").await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = request_with_header(&app, Method::GET, "/admin/stats", "x-api-key", KEY).await;
    assert_eq!(res.status, StatusCode::OK);
    let stats = res.json();
    assert_eq!(stats["pool"], "blocking");
    assert_eq!(stats["workers"], 16);
    assert_eq!(stats["in_flight"], 0);
}

#[tokio::test]
async fn test_admin_echo() {
    let app = app().await;
    let res =
        request_with_header(&app, Method::GET, "/admin/echo?a=1&b=two", "x-api-key", KEY).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.json(),
        json!({
            "method": "GET",
            "path": "/admin/echo",
            "query": { "a": "1", "b": "two" },
            "headers": 1,
        })
    );
}

#[tokio::test]
async fn test_admin_raw_response() {
    let app = app().await;

    let request = RawRequest::new(Method::POST, "/admin/raw", r#""hello""#)
        .with_header(
            http::HeaderName::from_static("x-api-key"),
            HeaderValue::from_static(KEY),
        );
    let res = send(&app, request).await;
    assert_eq!(res.status, StatusCode::ACCEPTED);
    assert_eq!(res.headers.get(CONTENT_TYPE).unwrap(), "text/plain");
    assert_eq!(res.text(), "accepted: hello");

    let request = RawRequest::new(Method::POST, "/admin/raw", "note")
        .with_header(
            http::HeaderName::from_static("x-api-key"),
            HeaderValue::from_static(KEY),
        );
    let res = send(&app, request).await;
    assert_eq!(res.status, StatusCode::ACCEPTED);
    assert_eq!(res.text(), "accepted: note");

    let request = RawRequest::new(Method::POST, "/admin/raw", Bytes::new()).with_header(
        http::HeaderName::from_static("x-api-key"),
        HeaderValue::from_static(KEY),
    );
    let res = send(&app, request).await;
    assert_eq!(res.status, StatusCode::ACCEPTED);
    assert_eq!(res.text(), "accepted");
}

#[tokio::test]
async fn test_no_keys_configured_rejects_everything() {
    let app = build_app(AppConfig::default()).await.unwrap();
    let res = request_with_header(&app, Method::GET, "/admin/stats", "x-api-key", KEY).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    // pets are not guarded
    assert_eq!(get(&app, "/pets/1").await.status, StatusCode::OK);
}
