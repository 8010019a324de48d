mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

const EMBED: &str = "https://www.youtube.com/embed/dQw4w9WgXcQ";

async fn create(env: &common::TestEnv, url: &str) -> Value {
    let response = env
        .server()
        .post("/api/videos")
        .authorization_bearer(env.admin_token())
        .json(&json!({ "title": "Intro", "url": url, "description": "Week 1" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

#[tokio::test]
async fn create_stores_canonical_embed_url() {
    let env = common::TestEnv::start().await;

    let body = create(&env, "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10s").await;
    assert_eq!(body["embed_url"], EMBED);
    assert_eq!(body["uploaded_by"], common::ADMIN_EMAIL);

    let listed: Vec<Value> = env.server().get("/api/videos").await.json();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["embed_url"], EMBED);
}

#[tokio::test]
async fn create_rejects_non_youtube_url() {
    let env = common::TestEnv::start().await;
    let server = env.server_permissive();

    let response = server
        .post("/api/videos")
        .authorization_bearer(env.admin_token())
        .json(&json!({ "title": "Intro", "url": "https://example.com/x" }))
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid YouTube URL");

    let listed: Vec<Value> = server.get("/api/videos").await.json();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn update_with_invalid_url_leaves_video_unchanged() {
    let env = common::TestEnv::start().await;
    let created = create(&env, "https://youtu.be/dQw4w9WgXcQ").await;
    let id = created["id"].as_str().unwrap();

    env.server_permissive()
        .put(&format!("/api/videos/{id}"))
        .authorization_bearer(env.admin_token())
        .json(&json!({ "title": "Renamed", "url": "https://vimeo.com/42" }))
        .await
        .assert_status_bad_request();

    let current: Value = env.server().get(&format!("/api/videos/{id}")).await.json();
    assert_eq!(current, created);
}

#[tokio::test]
async fn update_and_delete() {
    let env = common::TestEnv::start().await;
    let server = env.server();
    let created = create(&env, EMBED).await;
    let id = created["id"].as_str().unwrap();

    let updated: Value = server
        .put(&format!("/api/videos/{id}"))
        .authorization_bearer(env.admin_token())
        .json(&json!({ "description": "" }))
        .await
        .json();
    assert_eq!(updated["title"], "Intro");
    assert!(updated["description"].is_null());

    server
        .delete(&format!("/api/videos/{id}"))
        .authorization_bearer(env.admin_token())
        .await
        .assert_status_ok();

    env.server_permissive()
        .get(&format!("/api/videos/{id}"))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn outsider_session_cannot_mutate() {
    let env = common::TestEnv::start().await;
    let created = create(&env, EMBED).await;
    let id = created["id"].as_str().unwrap();
    let server = env.server_permissive();
    let outsider = common::outsider_token(&env.state);

    server
        .delete(&format!("/api/videos/{id}"))
        .authorization_bearer(outsider.clone())
        .await
        .assert_status_forbidden();

    server
        .put(&format!("/api/videos/{id}"))
        .json(&json!({ "title": "Hijacked" }))
        .await
        .assert_status_unauthorized();

    let current: Value = server.get(&format!("/api/videos/{id}")).await.json();
    assert_eq!(current["title"], "Intro");
}
