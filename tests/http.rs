mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Duration;
use quietfeed::{app, auth::jwt::create_token, config::settings::Settings, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use common::{memory_store, seed_profile};

const SECRET: &str = "test-secret";

fn bearer(user: Uuid) -> String {
    format!(
        "Bearer {}",
        create_token(user, SECRET, Duration::hours(1)).unwrap()
    )
}

async fn call(
    router: &Router,
    method: Method,
    uri: &str,
    user: Option<Uuid>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, bearer(user));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn anonymous_post_flow_over_http() {
    let store = memory_store();
    let author = seed_profile(&store, "tanuki", Some("たぬき")).await;
    let reader = seed_profile(&store, "kitsune", None).await;
    let router = app(AppState::new(store, Settings::local(SECRET)));

    let (status, body) = call(
        &router,
        Method::POST,
        "/api/posts",
        Some(author),
        Some(json!({ "content": "こっそり", "is_anonymous": true, "hobby_tags": ["coffee"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let post_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["can_delete"], true);

    let (status, body) = call(&router, Method::GET, "/api/posts?tag=coffee", Some(reader), None).await;
    assert_eq!(status, StatusCode::OK);
    let posts = body["data"]["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["author"]["name"], "匿名ユーザー");
    assert_eq!(posts[0]["can_delete"], false);
    let raw = body.to_string();
    assert!(!raw.contains(&author.to_string()));
    assert!(!raw.contains("tanuki"));

    let (status, _) = call(
        &router,
        Method::DELETE,
        &format!("/api/posts/{post_id}"),
        Some(reader),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(
        &router,
        Method::DELETE,
        &format!("/api/posts/{post_id}"),
        Some(author),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&router, Method::GET, &format!("/api/posts/{post_id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn reaction_toggle_requires_identity() {
    let store = memory_store();
    let author = seed_profile(&store, "tanuki", None).await;
    let reader = seed_profile(&store, "kitsune", None).await;
    let router = app(AppState::new(store, Settings::local(SECRET)));

    let (_, body) = call(
        &router,
        Method::POST,
        "/api/posts",
        Some(author),
        Some(json!({ "content": "読書中" })),
    )
    .await;
    let post_id = body["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/posts/{post_id}/reactions/empathy");

    let (status, _) = call(&router, Method::POST, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(&router, Method::POST, &uri, Some(reader), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["active"], true);
    let empathy = body["data"]["reactions"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["type"] == "empathy")
        .unwrap()
        .clone();
    assert_eq!(empathy["display_count"], "数件");
    assert_eq!(empathy["reacted"], true);

    let (status, _) = call(
        &router,
        Method::POST,
        &format!("/api/posts/{post_id}/reactions/applause"),
        Some(reader),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn follow_endpoints_report_counts() {
    let store = memory_store();
    let a = seed_profile(&store, "a", None).await;
    let b = seed_profile(&store, "b", Some("ビー")).await;
    let router = app(AppState::new(store, Settings::local(SECRET)));

    let (status, body) = call(&router, Method::POST, &format!("/api/users/{b}/follow"), Some(a), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({ "following": true, "followers_count": 1 }));

    let (_, body) = call(&router, Method::GET, &format!("/api/users/{b}/follow-stats"), Some(a), None).await;
    assert_eq!(body["data"]["followers_count"], 1);
    assert_eq!(body["data"]["is_following"], true);

    let (_, body) = call(&router, Method::GET, &format!("/api/users/{a}/following"), None, None).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["users"][0]["name"], "ビー");

    let (status, _) = call(
        &router,
        Method::POST,
        &format!("/api/users/{}/follow", Uuid::new_v4()),
        Some(a),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_comment_is_unprocessable() {
    let store = memory_store();
    let author = seed_profile(&store, "tanuki", None).await;
    let router = app(AppState::new(store, Settings::local(SECRET)));

    let (_, body) = call(
        &router,
        Method::POST,
        "/api/posts",
        Some(author),
        Some(json!({ "content": "ジャズ喫茶", "hobby_tags": ["jazz"] })),
    )
    .await;
    let post_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &router,
        Method::POST,
        &format!("/api/posts/{post_id}/comments"),
        Some(author),
        Some(json!({ "content": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);

    let (status, _) = call(
        &router,
        Method::POST,
        &format!("/api/posts/{post_id}/comments"),
        Some(author),
        Some(json!({ "content": "いい店", "is_anonymous": true })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = call(&router, Method::GET, &format!("/api/posts/{post_id}/comments"), None, None).await;
    assert_eq!(body["data"][0]["author"]["name"], "匿名さん");
}

#[tokio::test]
async fn malformed_cursor_is_rejected() {
    let router = app(AppState::new(memory_store(), Settings::local(SECRET)));
    let (status, _) = call(&router, Method::GET, "/api/posts?before=yesterday", None, None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
