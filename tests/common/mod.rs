//! Shared helpers for router tests

#![allow(dead_code)]

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use sanity_press::comments::CommentInput;
use sanity_press::config::SiteConfig;
use sanity_press::content::{Comment, Post};
use sanity_press::generator::{IncrementalSite, PageBuilder};
use sanity_press::server::{router, AppState};
use sanity_press::store::MemoryStore;

pub fn test_config() -> SiteConfig {
    let mut config = SiteConfig::default();
    config.title = "Router Blog".to_string();
    config.store.project_id = "proj".to_string();
    config
}

/// Store with one post, one approved and one pending comment
pub fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let post: Post = serde_json::from_value(json!({
        "_id": "p1",
        "_createdAt": "2022-03-01T12:00:00Z",
        "title": "Hello Router",
        "description": "Testing the router",
        "slug": { "current": "hello" },
        "author": { "name": "Jane Writer" },
        "body": [{ "_type": "block", "style": "normal", "children": [{ "text": "Body text" }] }]
    }))
    .unwrap();
    store.insert_post(post);

    let reserved: Post = serde_json::from_value(json!({
        "_id": "p2",
        "_createdAt": "2022-03-02T12:00:00Z",
        "title": "What Now",
        "slug": { "current": "what?now" }
    }))
    .unwrap();
    store.insert_post(reserved);

    for (id, approved) in [("approved-1", true), ("pending-1", false)] {
        let comment: Comment = serde_json::from_value(json!({
            "_id": id,
            "approved": approved,
            "name": format!("name-{}", id),
            "email": "reader@example.com",
            "comment": format!("text-{}", id),
            "post": { "_ref": "p1" }
        }))
        .unwrap();
        store.insert_comment(comment);
    }
    store
}

pub fn build_app(store: Arc<MemoryStore>, config: SiteConfig, public_dir: &Path) -> Router {
    let builder = PageBuilder::new(&config, store).unwrap();
    let site = IncrementalSite::new(Arc::new(builder), Duration::from_secs(60));
    router(AppState::new(site, config, public_dir))
}

pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn post_form(app: Router, uri: &str, input: &CommentInput) -> Response {
    let body = serde_urlencoded::to_string(input).unwrap();
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}
